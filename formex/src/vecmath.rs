//! Pure numerical routines over vectors and small matrices
//!
//! Everything in this module is stateless and works in `f64`.  Rotation
//! matrices follow the row-vector convention of the surrounding geometry
//! model: they are meant to be applied by postmultiplication (`x' = x · M`),
//! and the Euler-angle extraction assumes the same convention.
//!
//! Degenerate inputs (zero-length vectors, collinear frame points) produce
//! NaN components rather than errors, so that large batches containing a few
//! bad elements keep flowing; use [`is_degenerate`] to detect them.

use crate::Error;
use nalgebra::{DMatrix, Matrix2, Matrix3, RowDVector, Vector3};

/// An angle, stored internally in radians
///
/// The unit is decided once, at the call boundary, through the explicit
/// constructors.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Angle(f64);

impl Angle {
    /// Builds an angle from a value in degrees
    pub fn degrees(v: f64) -> Self {
        Self(v.to_radians())
    }

    /// Builds an angle from a value in radians
    pub fn radians(v: f64) -> Self {
        Self(v)
    }

    /// Returns the angle in degrees
    pub fn to_degrees(self) -> f64 {
        self.0.to_degrees()
    }

    /// Returns the angle in radians
    pub fn to_radians(self) -> f64 {
        self.0
    }

    /// Sine of the angle
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    /// Cosine of the angle
    pub fn cos(self) -> f64 {
        self.0.cos()
    }
}

/// A global coordinate axis
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    /// The X axis, i.e. `[1, 0, 0]`
    X,
    /// The Y axis, i.e. `[0, 1, 0]`
    Y,
    /// The Z axis, i.e. `[0, 0, 1]`
    Z,
}

impl Axis {
    /// Index of the axis in the 0-2 range
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along the axis
    pub fn unit(self) -> Vector3<f64> {
        let mut u = Vector3::zeros();
        u[self.index()] = 1.0;
        u
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Elementwise dot products of two equally long sets of vectors
pub fn dot(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "dot: vector sets differ in length");
    a.iter().zip(b).map(|(u, v)| u.dot(v)).collect()
}

/// Lengths of a set of vectors
pub fn length(a: &[Vector3<f64>]) -> Vec<f64> {
    a.iter().map(|v| v.norm()).collect()
}

/// Normalizes a set of vectors
///
/// A zero-length vector divides by zero and yields NaN components; this is
/// the documented degenerate sentinel, not an error.
pub fn normalize(a: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    a.iter().map(|v| v / v.norm()).collect()
}

/// Signed lengths of the projections of the vectors of `a` on `b`
pub fn projection(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> Result<Vec<f64>, Error> {
    assert_eq!(a.len(), b.len(), "projection: vector sets differ in length");
    a.iter()
        .zip(b)
        .map(|(u, v)| {
            let bl = v.norm();
            if bl == 0.0 {
                Err(Error::ZeroVector)
            } else {
                Ok(u.dot(v) / bl)
            }
        })
        .collect()
}

/// Components of the vectors of `a` orthogonal to the vectors of `b`
pub fn orthogonal(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>, Error> {
    let p = projection(a, b)?;
    Ok(a.iter()
        .zip(b)
        .zip(p)
        .map(|((u, v), pi)| u - pi * (v / v.norm()))
        .collect())
}

/// Returns a unit vector in the direction of `v`
pub fn unit_vector(v: Vector3<f64>) -> Result<Vector3<f64>, Error> {
    let l = v.norm();
    if l <= 0.0 {
        return Err(Error::ZeroVector);
    }
    Ok(v / l)
}

/// True if any component of the matrix is NaN or infinite
pub fn is_degenerate(m: &Matrix3<f64>) -> bool {
    m.iter().any(|v| !v.is_finite())
}

/// Flags two values as close, `|a - b| < atol + rtol * |b|`
pub fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    (a - b).abs() < atol + rtol * b.abs()
}

////////////////////////////////////////////////////////////////////////////////

/// Planar rotation matrix over `angle`
///
/// The matrix acts on row vectors: `x' = x · M`.
pub fn rotation_matrix_2d(angle: Angle) -> Matrix2<f64> {
    let (s, c) = (angle.sin(), angle.cos());
    Matrix2::new(
        c, s, //
        -s, c,
    )
}

/// Rotation matrix over `angle` about a global axis
///
/// Equivalent to [`rotation_matrix`] with the axis unit vector, but cheaper.
pub fn rotation_matrix_axis(angle: Angle, axis: Axis) -> Matrix3<f64> {
    let (s, c) = (angle.sin(), angle.cos());
    let mut f = Matrix3::zeros();
    let i = axis.index();
    let j = (i + 1) % 3;
    let k = (i + 2) % 3;
    f[(i, i)] = 1.0;
    f[(j, j)] = c;
    f[(j, k)] = s;
    f[(k, j)] = -s;
    f[(k, k)] = c;
    f
}

/// Rotation matrix over `angle` about an arbitrary axis through the origin
pub fn rotation_matrix(angle: Angle, axis: Vector3<f64>) -> Result<Matrix3<f64>, Error> {
    let u = unit_vector(axis)?;
    let (x, y, z) = (u.x, u.y, u.z);
    let (s, c) = (angle.sin(), angle.cos());
    let t = 1.0 - c;
    Ok(Matrix3::new(
        t * x * x + c,
        t * x * y + s * z,
        t * x * z - s * y,
        t * y * x - s * z,
        t * y * y + c,
        t * y * z + s * x,
        t * z * x + s * y,
        t * z * y - s * x,
        t * z * z + c,
    ))
}

/// Rotation matrix defined by three points in space
///
/// Applied to the global axes, axis 0 becomes parallel to `x1 - x0`, axis 1
/// lies in the plane of the three points orthogonal to `x1 - x0`, and axis 2
/// is orthogonal to that plane.  Collinear points normalize a zero vector
/// and produce a NaN-valued frame (see [`is_degenerate`]).
pub fn rotation_from_three_points(
    x0: Vector3<f64>,
    x1: Vector3<f64>,
    x2: Vector3<f64>,
) -> Matrix3<f64> {
    let u = (x1 - x0).normalize();
    let v0 = (x2 - x0).normalize();
    let v = (v0 - v0.dot(&u) * u).normalize();
    let w = u.cross(&v);
    Matrix3::from_rows(&[u.transpose(), v.transpose(), w.transpose()])
}

/// Rotation and translation mapping the frame of points `x` onto `y`
///
/// The returned `(rot, trl)` transform the points `x` so that `x0` lands on
/// `y0`, line `x0-x1` on line `y0-y1`, and plane `x0,x1,x2` on plane
/// `y0,y1,y2`.  The rotation applies first: `x' = x · rot + trl`.
pub fn transform_between(x: &[Vector3<f64>; 3], y: &[Vector3<f64>; 3]) -> (Matrix3<f64>, Vector3<f64>) {
    let r1 = rotation_from_three_points(x[0], x[1], x[2]);
    let r2 = rotation_from_three_points(y[0], y[1], y[2]);
    let r = r1.transpose() * r2;
    let t = y[0] - r.transpose() * x[0];
    (r, t)
}

/// Rotation matrix rotating direction `vec1` onto direction `vec2`
///
/// With an up-vector, the rotation keeps the plane of `vec2` and the rotated
/// up-vector parallel to the original up-vector.  Without one, parallel
/// input vectors fall back to a fixed perpendicular axis so the result stays
/// finite.
pub fn vector_rotation(
    vec1: Vector3<f64>,
    vec2: Vector3<f64>,
    up: Option<Vector3<f64>>,
) -> Matrix3<f64> {
    let u = vec1.normalize();
    let u1 = vec2.normalize();
    let (v, w, v1, w1) = match up {
        None => {
            let mut wv = u.cross(&u1);
            if wv.norm() == 0.0 {
                wv = if u.x == 0.0 && u.y == 0.0 {
                    Vector3::new(1.0, 0.0, 0.0)
                } else {
                    Vector3::new(-u.y, u.x, 0.0)
                };
            }
            let w = wv.normalize();
            let v = w.cross(&u).normalize();
            let v1 = w.cross(&u1).normalize();
            (v, w, v1, w)
        }
        Some(upvec) => {
            let w0 = upvec.normalize();
            let v = w0.cross(&u).normalize();
            let w = u.cross(&v).normalize();
            let v1 = w.cross(&u1).normalize();
            let w1 = u1.cross(&v1).normalize();
            (v, w, v1, w1)
        }
    };
    let m1 = Matrix3::from_columns(&[u, v, w]);
    let m2 = Matrix3::from_rows(&[u1.transpose(), v1.transpose(), w1.transpose()]);
    m1 * m2
}

/// Recovers rotation angles about the global axes from a rotation matrix
///
/// Inverts the composition `Rx · Ry · Rz` by searching the eight sign
/// combinations of the candidate angles and returning the first combination
/// whose reconstructed matrix matches `mat` within rtol = atol = 1e-3.
/// Returns `None` when no combination matches; in particular the gimbal-lock
/// region (`ry` near ±90°) is degenerate and not resolved here.
pub fn rotation_angles_from_matrix(mat: &Matrix3<f64>) -> Option<(Angle, Angle, Angle)> {
    use std::f64::consts::PI;
    let rx = (mat[(1, 2)] / mat[(2, 2)]).atan();
    let ry = -mat[(0, 2)].asin();
    let rz = (mat[(0, 1)] / mat[(0, 0)]).atan();
    for rxi in [rx, PI + rx] {
        for ryi in [ry, PI - ry] {
            for rzi in [rz, PI + rz] {
                let r = rotation_matrix_axis(Angle::radians(rxi), Axis::X)
                    * rotation_matrix_axis(Angle::radians(ryi), Axis::Y)
                    * rotation_matrix_axis(Angle::radians(rzi), Axis::Z);
                if mat
                    .iter()
                    .zip(r.iter())
                    .all(|(&a, &b)| is_close(a, b, 1e-3, 1e-3))
                {
                    return Some((
                        Angle::radians(rxi),
                        Angle::radians(ryi),
                        Angle::radians(rzi),
                    ));
                }
            }
        }
    }
    None
}

////////////////////////////////////////////////////////////////////////////////

/// Evaluates a multi-dimensional polynomial with Horner's rule
///
/// `coeffs` holds one row per degree, lowest degree first, with one column
/// per output dimension.  Returns one row per parameter value in `u`.
pub fn horner(coeffs: &DMatrix<f64>, u: &[f64]) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(u.len(), coeffs.ncols());
    for (i, &ui) in u.iter().enumerate() {
        let mut c: RowDVector<f64> = coeffs.row(coeffs.nrows() - 1).clone_owned();
        for r in (0..coeffs.nrows() - 1).rev() {
            c = c * ui + coeffs.row(r);
        }
        out.set_row(i, &c);
    }
    out
}

/// Root structure of a cubic equation
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CubicRoots {
    /// Three distinct real roots `r1 < r2 < r3`
    Distinct,
    /// Three real roots with `r1 < r2 = r3`
    DoubleUpper,
    /// Three real roots with `r1 = r2 < r3`
    DoubleLower,
    /// Three equal real roots
    Triple,
    /// One real root `r1` and the conjugate pair `r2 ± i·r3`
    ComplexPair,
}

/// Solves `a·x³ + b·x² + c·x + d = 0` by a direct method
///
/// Returns the three roots and their [`CubicRoots`] classification.  For
/// [`CubicRoots::ComplexPair`] the slots hold the real root, the real part
/// and the imaginary part of the conjugate pair, in that order; otherwise
/// they hold the sorted real roots.  The variables are rescaled by a power
/// of ten before solving to keep the intermediate terms well conditioned.
///
/// ```
/// use formex::vecmath::{cubic_equation, CubicRoots};
/// let (roots, kind) = cubic_equation(1.0, -3.0, 3.0, -1.0).unwrap();
/// assert_eq!(roots, [1.0, 1.0, 1.0]);
/// assert_eq!(kind, CubicRoots::Triple);
/// ```
pub fn cubic_equation(a: f64, b: f64, c: f64, d: f64) -> Result<([f64; 3], CubicRoots), Error> {
    use std::f64::consts::PI;
    if a == 0.0 {
        return Err(Error::NotACubic);
    }
    let e3 = 1.0 / 3.0;
    let pie = PI * 2.0 * e3;
    let mut r = b / a;
    let mut s = c / a;
    let mut t = d / a;

    // rescale by a power of ten sized to the coefficients
    let sc = r.abs().max(s.abs().sqrt()).max(t.abs().powf(e3));
    if sc == 0.0 {
        return Ok(([0.0; 3], CubicRoots::Triple));
    }
    let sc = 10f64.powi(sc.log10() as i32);
    r /= sc;
    s /= sc * sc;
    t /= sc * sc * sc;

    let rx = r * e3;
    let p3 = (s - r * rx) * e3;
    let q2 = rx.powi(3) - rx * s / 2.0 + t / 2.0;

    let som = q2 * q2 + p3.powi(3);

    let (mut roots, kind) = if som <= 0.0 {
        // three real roots
        let mut roots = [-rx; 3];
        let rt = (-p3.powi(3)).sqrt();
        if rt.abs() > 0.0 {
            let phi = (-q2 / rt).clamp(-1.0, 1.0).acos() * e3;
            let rt = 2.0 * (-p3).sqrt();
            for (root, off) in roots.iter_mut().zip([0.0, pie, -pie]) {
                *root += rt * (phi + off).cos();
            }
        }
        roots.sort_by(f64::total_cmp);
        let mut ic = 0;
        if roots[1] == roots[2] {
            ic += 1;
        }
        if roots[1] == roots[0] {
            ic += 2;
        }
        let kind = match ic {
            0 => CubicRoots::Distinct,
            1 => CubicRoots::DoubleUpper,
            2 => CubicRoots::DoubleLower,
            _ => CubicRoots::Triple,
        };
        (roots, kind)
    } else {
        // one real root and a complex conjugate pair
        let som = som.sqrt();
        let u = (-q2 + som).cbrt();
        let v = (-q2 - som).cbrt();
        let r1 = u + v;
        let r2 = -r1 / 2.0 - rx;
        let r3 = (u - v) * 3f64.sqrt() / 2.0;
        ([r1 - rx, r2, r3], CubicRoots::ComplexPair)
    };

    for root in &mut roots {
        *root *= sc;
    }
    Ok((roots, kind))
}

////////////////////////////////////////////////////////////////////////////////

/// Solves many systems of linear equations
///
/// `a` holds one square `ndof × ndof` matrix per system and `b` the matching
/// right-hand sides, one `ndof × nrhs` matrix per system.  For
/// `ndof ∈ {1, 2, 3}` with `direct = true` the solutions are computed with
/// closed-form Cramer formulas; singular matrices then yield non-finite
/// sentinel values in the affected columns.  Larger systems (or
/// `direct = false`) go through an LU factorization per system, where a
/// singular matrix is an error instead.
pub fn solve_many(
    a: &[DMatrix<f64>],
    b: &[DMatrix<f64>],
    direct: bool,
) -> Result<Vec<DMatrix<f64>>, Error> {
    if a.len() != b.len() {
        return Err(Error::BadSystemCount(a.len(), b.len()));
    }
    a.iter()
        .zip(b)
        .map(|(ai, bi)| {
            let ndof = ai.nrows();
            if ai.ncols() != ndof || bi.nrows() != ndof {
                return Err(Error::BadSystemShape(ai.nrows(), ai.ncols(), bi.nrows()));
            }
            if ndof <= 3 && direct {
                Ok(solve_direct(ai, bi))
            } else {
                ai.clone().lu().solve(bi).ok_or(Error::SingularSystem)
            }
        })
        .collect()
}

/// Cramer solve of a single 1-3 dof system, one column of `b` at a time
fn solve_direct(a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let ndof = a.nrows();
    let det = |m: &DMatrix<f64>| -> f64 {
        match ndof {
            1 => m[(0, 0)],
            2 => m[(0, 0)] * m[(1, 1)] - m[(1, 0)] * m[(0, 1)],
            _ => {
                m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(2, 1)] * m[(1, 2)])
                    - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(2, 0)] * m[(1, 2)])
                    + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(2, 0)] * m[(1, 1)])
            }
        }
    };
    let denom = det(a);
    let mut x = DMatrix::zeros(ndof, b.ncols());
    for col in 0..b.ncols() {
        for i in 0..ndof {
            let mut m = a.clone();
            m.set_column(i, &b.column(col));
            x[(i, col)] = det(&m) / denom;
        }
    }
    x
}

////////////////////////////////////////////////////////////////////////////////
