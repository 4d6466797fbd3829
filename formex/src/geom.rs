//! Derived geometric quantities for polygon soups and meshes
//!
//! Coordinates here are `f32`, matching what flows to the render backend.
//! Degenerate elements (zero-area polygons, zero-length directions) produce
//! NaN components instead of errors: large batches routinely contain a few
//! bad elements, and one of them must not abort a whole draw.  Use
//! [`is_degenerate`] to filter.

use crate::index::{split_range, Connectivity, InverseIndex};
use crate::Error;
use nalgebra::Vector3;
use rayon::prelude::*;

/// Areas of and normals on the parallelograms formed by two vector sets
///
/// The cross product of each vector pair gives `area * normal`; parallel
/// vectors give a zero area and a NaN-valued normal.
pub fn area_normals(
    vec1: &[Vector3<f32>],
    vec2: &[Vector3<f32>],
) -> (Vec<f32>, Vec<Vector3<f32>>) {
    assert_eq!(vec1.len(), vec2.len(), "area_normals: vector sets differ in length");
    let mut areas = Vec::with_capacity(vec1.len());
    let mut normals = Vec::with_capacity(vec1.len());
    for (u, v) in vec1.iter().zip(vec2) {
        let n = u.cross(v);
        let area = n.norm();
        areas.push(area);
        normals.push(n / area);
    }
    (areas, normals)
}

/// True if the vector has a NaN or infinite component
pub fn is_degenerate(n: &Vector3<f32>) -> bool {
    n.iter().any(|v| !v.is_finite())
}

/// Unit normals of a soup of flat polygons
///
/// `coords` holds the element vertices in groups of `nplex`; the normal of
/// each element is computed from its first three vertices.  Degenerate
/// elements yield NaN normals.
pub fn polygon_normals(coords: &[Vector3<f32>], nplex: usize) -> Result<Vec<Vector3<f32>>, Error> {
    if nplex < 3 {
        return Err(Error::BadPlexitude(nplex));
    }
    if coords.len() % nplex != 0 {
        return Err(Error::MisalignedValues {
            values: coords.len(),
            elems: nplex,
        });
    }
    Ok(coords
        .chunks_exact(nplex)
        .map(|x| {
            let n = (x[1] - x[0]).cross(&(x[2] - x[0]));
            n / n.norm()
        })
        .collect())
}

/// Block-decomposed variant of [`polygon_normals`]
///
/// The element range is split into `nblocks` contiguous blocks whose normals
/// are computed by parallel workers.  Only this derivation step runs in
/// parallel; anything touching GPU state stays on the calling thread.
pub fn polygon_normals_blocked(
    coords: &[Vector3<f32>],
    nplex: usize,
    nblocks: usize,
) -> Result<Vec<Vector3<f32>>, Error> {
    if nplex < 3 {
        return Err(Error::BadPlexitude(nplex));
    }
    if coords.len() % nplex != 0 {
        return Err(Error::MisalignedValues {
            values: coords.len(),
            elems: nplex,
        });
    }
    let nelems = coords.len() / nplex;
    let bounds = split_range(nelems, nblocks.max(1));
    let blocks: Vec<Vec<Vector3<f32>>> = bounds
        .par_windows(2)
        .map(|w| {
            polygon_normals(&coords[w[0] * nplex..w[1] * nplex], nplex)
                .unwrap_or_default()
        })
        .collect();
    Ok(blocks.concat())
}

/// Aggregation applied at each node by [`nodal_sum`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NodalOp {
    /// Replace each vertex value with the sum over the node
    Sum,
    /// Replace each vertex value with the average over the node
    Average,
}

/// Aggregates per-element-vertex values onto shared nodes, in place
///
/// `values` holds one vector per element vertex, row-major over
/// `elems.nelems() × elems.nplex()`.  For each node, the values at every
/// vertex position referencing it are replaced with their sum (or average).
///
/// With a direction threshold, the values are first normalized and then only
/// aggregated within clusters of directions whose cosine against the cluster
/// seed is at least the threshold; this keeps sharp creases from being
/// smoothed away.  The threshold variant always works on the normalized
/// values, as averaged normals do.
pub fn nodal_sum(
    values: &mut [Vector3<f32>],
    elems: &Connectivity,
    op: NodalOp,
    direction_threshold: Option<f32>,
) -> Result<(), Error> {
    if values.len() != elems.nelems() * elems.nplex() {
        return Err(Error::MisalignedValues {
            values: values.len(),
            elems: elems.nelems() * elems.nplex(),
        });
    }
    elems.check_non_negative()?;

    // positions in `values` that share each node
    let nnodes = elems.max().map(|m| m as usize + 1).unwrap_or(0);
    let mut at_node: Vec<Vec<usize>> = vec![Vec::new(); nnodes];
    for (pos, &n) in elems.as_slice().iter().enumerate() {
        at_node[n as usize].push(pos);
    }

    match direction_threshold {
        None => {
            for positions in &at_node {
                if positions.is_empty() {
                    continue;
                }
                let mut total = Vector3::zeros();
                for &p in positions {
                    total += values[p];
                }
                if op == NodalOp::Average {
                    total /= positions.len() as f32;
                }
                for &p in positions {
                    values[p] = total;
                }
            }
        }
        Some(tol) => {
            for v in values.iter_mut() {
                *v = *v / v.norm();
            }
            for positions in &at_node {
                average_directions(values, positions, op, tol);
            }
        }
    }
    Ok(())
}

/// Aggregates the values at `positions` cluster by cluster
///
/// Clusters grow greedily from the first unhandled direction: every
/// unhandled value whose cosine against the seed reaches `tol` joins.
fn average_directions(values: &mut [Vector3<f32>], positions: &[usize], op: NodalOp, tol: f32) {
    let mut handled = vec![false; positions.len()];
    while let Some(first) = handled.iter().position(|&h| !h) {
        let seed = values[positions[first]];
        let members: Vec<usize> = (first..positions.len())
            .filter(|&k| !handled[k] && seed.dot(&values[positions[k]]) >= tol)
            .collect();
        let mut total = Vector3::zeros();
        for &k in &members {
            total += values[positions[k]];
        }
        if op == NodalOp::Average {
            total /= members.len() as f32;
        }
        for &k in &members {
            values[positions[k]] = total;
            handled[k] = true;
        }
        // the seed always joins its own cluster, so the loop advances
        handled[first] = true;
    }
}

/// Nodal averaged normals of an indexed polygon mesh
///
/// Computes each element's flat normal, spreads it to the element's
/// vertices, averages at shared nodes (clustered by direction when a
/// threshold is given) and renormalizes.  Returns one unit normal per
/// element vertex.
pub fn average_normals(
    coords: &[Vector3<f32>],
    elems: &Connectivity,
    threshold: Option<f32>,
) -> Result<Vec<Vector3<f32>>, Error> {
    let gathered = gather(coords, elems)?;
    let flat = polygon_normals(&gathered, elems.nplex())?;
    let mut values: Vec<Vector3<f32>> = Vec::with_capacity(flat.len() * elems.nplex());
    for n in &flat {
        for _ in 0..elems.nplex() {
            values.push(*n);
        }
    }
    nodal_sum(&mut values, elems, NodalOp::Average, threshold)?;
    for v in &mut values {
        *v = *v / v.norm();
    }
    Ok(values)
}

/// Gathers node coordinates into element-grouped order
pub fn gather(coords: &[Vector3<f32>], elems: &Connectivity) -> Result<Vec<Vector3<f32>>, Error> {
    elems.check_non_negative()?;
    if let Some(max) = elems.max() {
        if max as usize >= coords.len() {
            return Err(Error::MisalignedValues {
                values: coords.len(),
                elems: max as usize + 1,
            });
        }
    }
    Ok(elems
        .as_slice()
        .iter()
        .map(|&i| coords[i as usize])
        .collect())
}

/// Number of elements that reference each node at least once
pub fn node_valence(elems: &Connectivity) -> Vec<usize> {
    let inv = InverseIndex::new(elems);
    (0..inv.nrows())
        .map(|i| {
            let e = inv.entries(i);
            // an element may reference a node more than once
            let mut count = 0;
            let mut last = -1;
            for &r in e {
                if r != last {
                    count += 1;
                    last = r;
                }
            }
            count
        })
        .collect()
}

////////////////////////////////////////////////////////////////////////////////
