//! Integer-array bookkeeping for mesh topology
//!
//! Indices are `i32`, with negative values reserved as the "absent" sentinel
//! in inverse structures; a negative value is never a valid position.

use crate::Error;
use ordered_float::OrderedFloat;

/// A fixed-plexitude element array
///
/// Each row ("element") holds `nplex` indices into some coordinate array.
/// The plexitude is constant within one connectivity; element groups with
/// different plexitudes go into separate batches.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Connectivity {
    data: Vec<i32>,
    nplex: usize,
}

impl Connectivity {
    /// Builds a connectivity from a flat row-major array
    pub fn new(data: Vec<i32>, nplex: usize) -> Result<Self, Error> {
        if nplex == 0 || data.len() % nplex != 0 {
            return Err(Error::BadConnectivity {
                len: data.len(),
                nplex,
            });
        }
        Ok(Self { data, nplex })
    }

    /// Number of elements
    pub fn nelems(&self) -> usize {
        self.data.len() / self.nplex
    }

    /// Number of vertices per element
    pub fn nplex(&self) -> usize {
        self.nplex
    }

    /// A single element's vertex indices
    pub fn row(&self, i: usize) -> &[i32] {
        &self.data[i * self.nplex..(i + 1) * self.nplex]
    }

    /// Iterator over all elements
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.data.chunks_exact(self.nplex)
    }

    /// The flat row-major data
    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    /// Highest index referenced, or `None` for an empty connectivity
    pub fn max(&self) -> Option<i32> {
        self.data.iter().copied().max()
    }

    /// Checks that every entry is non-negative
    pub fn check_non_negative(&self) -> Result<(), Error> {
        match self.data.iter().copied().find(|&v| v < 0) {
            Some(v) => Err(Error::NegativeIndex(v)),
            None => Ok(()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Result of [`unique_stable`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unique {
    /// The unique values, in ascending order
    pub values: Vec<i32>,
    /// First-occurrence position of each unique value in the input
    pub index: Vec<usize>,
    /// For each input position, the position of its value in `values`
    pub inverse: Vec<usize>,
}

/// Finds the unique values of an array with a stable sort
///
/// Unlike a plain unique, the returned first-occurrence positions are
/// guaranteed to be the earliest position of each multiply occurring value.
pub fn unique_stable(a: &[i32]) -> Unique {
    let mut perm: Vec<usize> = (0..a.len()).collect();
    perm.sort_by_key(|&i| a[i]);
    let mut values = Vec::new();
    let mut index = Vec::new();
    let mut inverse = vec![0; a.len()];
    for (k, &p) in perm.iter().enumerate() {
        if k == 0 || a[p] != a[perm[k - 1]] {
            values.push(a[p]);
            index.push(p);
        }
        inverse[p] = values.len() - 1;
    }
    Unique {
        values,
        index,
        inverse,
    }
}

/// Returns the old values corresponding to a sequential renumbering
///
/// The value at position `k` of the result is the old number that the new
/// number `k` replaces; new numbers follow the order of first occurrence.
///
/// ```
/// use formex::index::renumber_index;
/// assert_eq!(renumber_index(&[0, 5, 2, 2, 6, 0]), vec![0, 5, 2, 6]);
/// ```
pub fn renumber_index(index: &[i32]) -> Vec<i32> {
    let u = unique_stable(index);
    let mut order: Vec<usize> = (0..u.values.len()).collect();
    order.sort_by_key(|&k| u.index[k]);
    order.iter().map(|&k| u.values[k]).collect()
}

/// Inverts an index of unique non-negative values
///
/// The result has length `max + 1` and holds the position in `index` of each
/// value `0..=max`, or −1 for values that do not occur.
///
/// ```
/// use formex::index::inverse_unique_index;
/// let inv = inverse_unique_index(&[0, 5, 2, 6]).unwrap();
/// assert_eq!(inv, vec![0, -1, 2, -1, -1, 1, 3]);
/// ```
pub fn inverse_unique_index(index: &[i32]) -> Result<Vec<i32>, Error> {
    let mut max = -1;
    for &v in index {
        if v < 0 {
            return Err(Error::NegativeIndex(v));
        }
        max = max.max(v);
    }
    let mut inv = vec![-1; (max + 1) as usize];
    for (i, &v) in index.iter().enumerate() {
        inv[v as usize] = i as i32;
    }
    Ok(inv)
}

/// Reverse pointers of a connectivity: which rows reference each value
///
/// Row `i` of the inverse holds, in ascending order, every row number of the
/// source connectivity that references value `i`, once per occurrence.  Rows
/// shorter than the widest are left-padded with the −1 sentinel.  Negative
/// source entries are disregarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InverseIndex {
    data: Vec<i32>,
    width: usize,
}

impl InverseIndex {
    /// Default initial estimate for the per-value row capacity
    pub const DEFAULT_ESTIMATE: usize = 4;

    /// Builds the inverse of a connectivity
    pub fn new(conn: &Connectivity) -> Self {
        Self::with_estimate(conn, Self::DEFAULT_ESTIMATE)
    }

    /// Builds the inverse with an explicit multiplicity estimate
    ///
    /// The estimate only sizes the initial allocation; capacity grows as
    /// needed when it undershoots.
    pub fn with_estimate(conn: &Connectivity, estimate: usize) -> Self {
        let nrows = conn.max().map(|m| (m + 1).max(0) as usize).unwrap_or(0);
        let mut rows: Vec<Vec<i32>> =
            (0..nrows).map(|_| Vec::with_capacity(estimate)).collect();
        for c in 0..conn.nplex() {
            for r in 0..conn.nelems() {
                let v = conn.row(r)[c];
                if v >= 0 {
                    rows[v as usize].push(r as i32);
                }
            }
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut data = Vec::with_capacity(nrows * width);
        for row in &mut rows {
            row.sort_unstable();
            data.resize(data.len() + width - row.len(), -1);
            data.extend_from_slice(row);
        }
        Self { data, width }
    }

    /// Number of rows (highest referenced value + 1)
    pub fn nrows(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    /// Widest multiplicity of any value
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row `i`: −1 padding first, then the referencing row numbers
    pub fn row(&self, i: usize) -> &[i32] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    /// The referencing row numbers of value `i`, without padding
    pub fn entries(&self, i: usize) -> &[i32] {
        let row = self.row(i);
        let start = row.iter().position(|&v| v >= 0).unwrap_or(row.len());
        &row[start..]
    }
}

/// Finds the position of each of `values` in `target`
///
/// Returns, for every value, its position in `target` or −1 if absent.
/// When a value occurs more than once in `target`, which occurrence is
/// returned is unspecified.  After `let m = match_index(target, values)`,
/// `target[m[i]] == values[i]` holds wherever `m[i]` is non-negative.
///
/// ```
/// use formex::index::match_index;
/// let m = match_index(&[1, 3, 4, 5, 7, 8, 9], &[0, 6, 7, 1, 2]);
/// assert_eq!(m, vec![-1, -1, 4, 0, -1]);
/// ```
pub fn match_index(target: &[i32], values: &[i32]) -> Vec<i32> {
    let max = target.iter().copied().max().unwrap_or(-1);
    let mut pos = vec![-1i32; (max + 1).max(0) as usize];
    for (i, &v) in target.iter().enumerate().rev() {
        if v >= 0 {
            pos[v as usize] = i as i32;
        }
    }
    values
        .iter()
        .map(|&v| {
            if v >= 0 && (v as usize) < pos.len() {
                pos[v as usize]
            } else {
                -1
            }
        })
        .collect()
}

/// Numbers in `0..n` that are not present in `index`
///
/// With `n < 0` the upper limit defaults to the highest index value + 1.
/// Index values outside `0..n` are disregarded.
pub fn complement(index: &[i32], n: i32) -> Vec<i32> {
    let n = if n < 0 {
        index.iter().copied().max().map(|m| m + 1).unwrap_or(0).max(1)
    } else {
        n
    };
    let mut present = vec![false; n as usize];
    for &v in index {
        if (0..n).contains(&v) {
            present[v as usize] = true;
        }
    }
    (0..n).filter(|&v| !present[v as usize]).collect()
}

/// Boolean complement of a mask, padded or truncated to length `n`
///
/// Positions beyond the input mask count as unset, so they come back `true`.
pub fn complement_mask(mask: &[bool], n: usize) -> Vec<bool> {
    (0..n).map(|i| !mask.get(i).copied().unwrap_or(false)).collect()
}

/// Relabels the subsets of equal values by descending total weight
///
/// Without weights, each element weighs 1, so subsets sort by size.  Returns
/// for each element the rank of its subset; ties keep the reversed order of
/// the underlying stable ascending sort.
///
/// ```
/// use formex::index::sort_subsets;
/// let r = sort_subsets(&[0, 1, 2, 3, 1, 2, 3, 2, 3, 3], None).unwrap();
/// assert_eq!(r, vec![3, 2, 1, 0, 2, 1, 0, 1, 0, 0]);
/// ```
pub fn sort_subsets(a: &[i32], w: Option<&[f64]>) -> Result<Vec<i32>, Error> {
    if let Some(w) = w {
        if w.len() != a.len() {
            return Err(Error::WeightMismatch(w.len(), a.len()));
        }
    }
    let u = unique_stable(a);
    let mut totals = vec![0.0f64; u.values.len()];
    for (i, &g) in u.inverse.iter().enumerate() {
        totals[g] += w.map(|w| w[i]).unwrap_or(1.0);
    }
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by_key(|&k| OrderedFloat(totals[k]));
    order.reverse();
    // rank of each subset = position of its group in the reversed order
    let mut rank = vec![0i32; totals.len()];
    for (r, &k) in order.iter().enumerate() {
        rank[k] = r as i32;
    }
    Ok(u.inverse.iter().map(|&g| rank[g]).collect())
}

/// Position of the minimum value within each group
///
/// Returns the sorted unique group ids and, for each, the position in `val`
/// of the group's (first) minimum.
///
/// ```
/// use formex::index::group_argmin;
/// let val = [0.0, 1.0, 2.0, 3.0, 4.0, -5.0];
/// let gid = [2, 1, 1, 6, 6, 1];
/// let (ugid, minpos) = group_argmin(&val, &gid).unwrap();
/// assert_eq!(ugid, vec![1, 2, 6]);
/// assert_eq!(minpos, vec![5, 0, 3]);
/// ```
pub fn group_argmin(val: &[f64], gid: &[i32]) -> Result<(Vec<i32>, Vec<usize>), Error> {
    if val.len() != gid.len() {
        return Err(Error::WeightMismatch(val.len(), gid.len()));
    }
    let u = unique_stable(gid);
    let mut minpos: Vec<Option<usize>> = vec![None; u.values.len()];
    for (i, &g) in u.inverse.iter().enumerate() {
        match minpos[g] {
            Some(p) if val[p] <= val[i] => {}
            _ => minpos[g] = Some(i),
        }
    }
    let minpos = minpos.into_iter().flatten().collect();
    Ok((u.values, minpos))
}

/// Multiplicity of each distinct value
///
/// Returns the per-value counts and the sorted unique values.
pub fn multiplicity(a: &[i32]) -> (Vec<usize>, Vec<i32>) {
    let u = unique_stable(a);
    let mut mult = vec![0; u.values.len()];
    for &g in &u.inverse {
        mult[g] += 1;
    }
    (mult, u.values)
}

/// Sorts the rows of a connectivity on all columns, left to right
///
/// Returns the permutation that puts the rows in column-lexicographic order;
/// equal rows keep their relative order.
pub fn sort_by_columns(conn: &Connectivity) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..conn.nelems()).collect();
    perm.sort_by(|&i, &j| conn.row(i).cmp(conn.row(j)));
    perm
}

/// Finds the unique rows of a connectivity
///
/// Returns the row numbers of the unique rows (in column-sorted order) and,
/// for each input row, the index of its unique representative.  With
/// `permutations = true`, rows holding the same values in any order count as
/// equal.
pub fn unique_rows(conn: &Connectivity, permutations: bool) -> (Vec<usize>, Vec<usize>) {
    let key = |i: usize| -> Vec<i32> {
        let mut row = conn.row(i).to_vec();
        if permutations {
            row.sort_unstable();
        }
        row
    };
    let mut perm: Vec<usize> = (0..conn.nelems()).collect();
    perm.sort_by(|&i, &j| key(i).cmp(&key(j)));

    let mut uniq = Vec::new();
    let mut group = vec![0usize; conn.nelems()];
    for (k, &p) in perm.iter().enumerate() {
        if k == 0 || key(p) != key(perm[k - 1]) {
            uniq.push(p);
        }
        group[p] = uniq.len().saturating_sub(1);
    }
    (uniq, group)
}

/// Position of the value nearest to `target`, or `None` for an empty slice
pub fn arg_nearest_value(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let d = (v - target) * (v - target);
        if best.map(|(_, bd)| d < bd).unwrap_or(true) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// The value nearest to `target`, or `None` for an empty slice
pub fn nearest_value(values: &[f64], target: f64) -> Option<f64> {
    arg_nearest_value(values, target).map(|i| values[i])
}

/// Splits the range `0..n` into `nblk` nearly equal slices
///
/// Returns the slice boundaries: `nblk + 1` values from 0 to `n` when
/// `n > nblk`, or simply `0..=n` otherwise.
///
/// ```
/// use formex::index::split_range;
/// assert_eq!(split_range(7, 3), vec![0, 2, 5, 7]);
/// ```
pub fn split_range(n: usize, nblk: usize) -> Vec<usize> {
    if n > nblk {
        (0..=nblk)
            .map(|i| ((i * n) as f64 / nblk as f64).round() as usize)
            .collect()
    } else {
        (0..=n).collect()
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn connectivity_shape() {
        assert!(Connectivity::new(vec![0, 1, 2], 2).is_err());
        let c = Connectivity::new(vec![0, 1, 1, 2, 2, 0], 2).unwrap();
        assert_eq!(c.nelems(), 3);
        assert_eq!(c.row(1), &[1, 2]);
        assert_eq!(c.max(), Some(2));
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let a = [2, 3, 4, 5, 6, 7, 8, 1, 2, 3, 4, 5, 6, 7, 8, 7, 8];
        let u = unique_stable(&a);
        assert_eq!(u.values, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(u.index, vec![7, 0, 1, 2, 3, 4, 5, 6]);
        // the inverse reproduces the input from the unique set
        let rebuilt: Vec<i32> = u.inverse.iter().map(|&g| u.values[g]).collect();
        assert_eq!(rebuilt, a);
    }

    #[test]
    fn renumber_and_inverse() {
        let renum = renumber_index(&[0, 5, 2, 2, 6, 0]);
        assert_eq!(renum, vec![0, 5, 2, 6]);
        let inv = inverse_unique_index(&renum).unwrap();
        let mapped: Vec<i32> = [0, 5, 2, 2, 6, 0].iter().map(|&v| inv[v as usize]).collect();
        assert_eq!(mapped, vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn inverse_index_example() {
        let conn = Connectivity::new(vec![0, 1, 0, 2, 1, 2, 0, 3], 2).unwrap();
        let inv = InverseIndex::new(&conn);
        assert_eq!(inv.nrows(), 4);
        assert_eq!(inv.width(), 3);
        assert_eq!(inv.row(0), &[0, 1, 3]);
        assert_eq!(inv.row(1), &[-1, 0, 2]);
        assert_eq!(inv.row(2), &[-1, 1, 2]);
        assert_eq!(inv.row(3), &[-1, -1, 3]);
        assert_eq!(inv.entries(3), &[3]);
    }

    #[test]
    fn inverse_index_counts_repeats() {
        // a value repeated within one element is recorded per occurrence
        let conn = Connectivity::new(vec![0, 0, 1, 1, 0, 1], 3).unwrap();
        let inv = InverseIndex::with_estimate(&conn, 1);
        assert_eq!(inv.width(), 3);
        assert_eq!(inv.row(0), &[0, 0, 1]);
        assert_eq!(inv.row(1), &[0, 1, 1]);
    }

    #[test]
    fn match_index_round_trip() {
        let target = [1, 3, 4, 5, 7, 8, 9];
        let values = [0, 6, 7, 1, 2];
        let m = match_index(&target, &values);
        assert_eq!(m, vec![-1, -1, 4, 0, -1]);
        for (&mi, &v) in m.iter().zip(&values) {
            if mi >= 0 {
                assert_eq!(target[mi as usize], v);
            }
        }
    }

    #[test]
    fn complement_examples() {
        assert_eq!(complement(&[0, 5, 2, 6], -1), vec![1, 3, 4]);
        assert_eq!(complement(&[0, 5, 2, 6], 10), vec![1, 3, 4, 7, 8, 9]);
        assert_eq!(
            complement_mask(&[false, true, true, true], 6),
            vec![true, false, false, false, true, true]
        );
    }

    #[test]
    fn sort_subsets_by_weight() {
        let a = [0, 1, 2, 3, 1, 2, 3, 2, 3, 3];
        let w = [9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0];
        let r = sort_subsets(&a, Some(&w)).unwrap();
        assert_eq!(r, vec![3, 1, 0, 2, 1, 0, 2, 0, 2, 2]);
    }

    #[test]
    fn sort_subsets_weight_mismatch() {
        assert!(sort_subsets(&[0, 1], Some(&[1.0])).is_err());
    }

    #[test]
    fn multiplicity_example() {
        let (mult, uniq) = multiplicity(&[0, 3, 5, 1, 4, 1, 0, 7, 1]);
        assert_eq!(mult, vec![2, 3, 1, 1, 1, 1]);
        assert_eq!(uniq, vec![0, 1, 3, 4, 5, 7]);
    }

    #[test]
    fn column_sort_and_unique_rows() {
        let conn =
            Connectivity::new(vec![1, 2, 2, 3, 3, 2, 1, 3, 2, 3], 2).unwrap();
        assert_eq!(sort_by_columns(&conn), vec![0, 3, 1, 4, 2]);
        let (uniq, uniqid) = unique_rows(&conn, false);
        assert_eq!(uniq, vec![0, 3, 1, 2]);
        assert_eq!(uniqid, vec![0, 2, 3, 1, 2]);
        let (uniq, uniqid) = unique_rows(&conn, true);
        assert_eq!(uniq, vec![0, 3, 1]);
        assert_eq!(uniqid, vec![0, 2, 2, 1, 2]);
    }

    #[test]
    fn nearest() {
        assert_eq!(arg_nearest_value(&[0.1, 0.5, 0.9], 0.7), Some(1));
        assert_eq!(nearest_value(&[0.1, 0.5, 0.9], 0.7), Some(0.5));
        assert_eq!(arg_nearest_value(&[], 0.7), None);
    }

    #[test]
    fn split_range_blocks() {
        assert_eq!(split_range(7, 3), vec![0, 2, 5, 7]);
        assert_eq!(split_range(2, 3), vec![0, 1, 2]);
    }
}
