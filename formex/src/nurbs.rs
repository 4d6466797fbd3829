//! Conversion of quadratic elements into NURBS-compatible descriptions
//!
//! The downstream renderer evaluates NURBS curves and surfaces from control
//! points and knot vectors; this module builds valid descriptions from the
//! element shapes the geometry model produces (3-point quadratic curves,
//! quad4/quad8/quad9 surfaces).  Knot vectors must be longer than the
//! control net and the order (`knots − controls`) may not exceed
//! [`MAX_ORDER`]; invalid configurations are rejected at construction, never
//! silently corrected.

use crate::Error;
use nalgebra::Vector3;

/// Highest NURBS order the renderer accepts (degree 7)
pub const MAX_ORDER: usize = 8;

/// Knot vector of a quadratic (order 3) curve or surface direction
pub const ORDER3_KNOTS: [f32; 6] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

/// Knot vector of a bilinear (order 2) surface direction
pub const ORDER2_KNOTS: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

fn check_order(knots: usize, ctrl: usize) -> Result<usize, Error> {
    if knots <= ctrl {
        return Err(Error::BadKnots { knots, ctrl });
    }
    let order = knots - ctrl;
    if order > MAX_ORDER {
        return Err(Error::UnsupportedOrder(order, MAX_ORDER));
    }
    Ok(order)
}

/// A NURBS curve description: control points and a knot vector
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NurbsCurve {
    ctrl: Vec<Vector3<f32>>,
    knots: Vec<f32>,
}

impl NurbsCurve {
    /// Builds a curve, validating the knot-count and order invariants
    pub fn new(ctrl: Vec<Vector3<f32>>, knots: Vec<f32>) -> Result<Self, Error> {
        check_order(knots.len(), ctrl.len())?;
        Ok(Self { ctrl, knots })
    }

    /// The control points
    pub fn ctrl(&self) -> &[Vector3<f32>] {
        &self.ctrl
    }

    /// The knot vector
    pub fn knots(&self) -> &[f32] {
        &self.knots
    }

    /// Order of the curve (`knots − controls`)
    pub fn order(&self) -> usize {
        self.knots.len() - self.ctrl.len()
    }

    /// Degree of the curve (order − 1)
    pub fn degree(&self) -> usize {
        self.order() - 1
    }
}

/// A NURBS surface description: an `ns × nt` control net and two knot vectors
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NurbsSurface {
    ctrl: Vec<Vector3<f32>>,
    ns: usize,
    nt: usize,
    sknots: Vec<f32>,
    tknots: Vec<f32>,
}

impl NurbsSurface {
    /// Builds a surface, validating both directions' invariants
    pub fn new(
        ctrl: Vec<Vector3<f32>>,
        ns: usize,
        nt: usize,
        sknots: Vec<f32>,
        tknots: Vec<f32>,
    ) -> Result<Self, Error> {
        if ns == 0 || ctrl.len() != ns * nt {
            return Err(Error::BadConnectivity {
                len: ctrl.len(),
                nplex: ns.max(1),
            });
        }
        check_order(sknots.len(), ns)?;
        check_order(tknots.len(), nt)?;
        Ok(Self {
            ctrl,
            ns,
            nt,
            sknots,
            tknots,
        })
    }

    /// The control net, row-major over `ns × nt`
    pub fn ctrl(&self) -> &[Vector3<f32>] {
        &self.ctrl
    }

    /// Control-net extent in the s direction
    pub fn ns(&self) -> usize {
        self.ns
    }

    /// Control-net extent in the t direction
    pub fn nt(&self) -> usize {
        self.nt
    }

    /// Knot vector in the s direction
    pub fn sknots(&self) -> &[f32] {
        &self.sknots
    }

    /// Knot vector in the t direction
    pub fn tknots(&self) -> &[f32] {
        &self.tknots
    }

    /// Orders in the s and t directions
    pub fn orders(&self) -> (usize, usize) {
        (self.sknots.len() - self.ns, self.tknots.len() - self.nt)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Converts quad4 elements to quad8 by inserting midside points
///
/// Input holds the corner points in groups of 4; each output group holds the
/// 4 corners followed by the 4 edge midpoints.
pub fn quad4_to_quad8(x: &[Vector3<f32>]) -> Result<Vec<Vector3<f32>>, Error> {
    if x.len() % 4 != 0 {
        return Err(Error::MisalignedValues {
            values: x.len(),
            elems: 4,
        });
    }
    let mut out = Vec::with_capacity(x.len() * 2);
    for q in x.chunks_exact(4) {
        out.extend_from_slice(q);
        for i in 0..4 {
            out.push((q[i] + q[(i + 1) % 4]) / 2.0);
        }
    }
    Ok(out)
}

/// Converts quad8 elements to quad9 by inserting the center point
///
/// The center is the average of the corners minus half the average of the
/// midsides, which keeps the quadratic interpolant through the 8 boundary
/// points exact.
pub fn quad8_to_quad9(x: &[Vector3<f32>]) -> Result<Vec<Vector3<f32>>, Error> {
    if x.len() % 8 != 0 {
        return Err(Error::MisalignedValues {
            values: x.len(),
            elems: 8,
        });
    }
    let mut out = Vec::with_capacity(x.len() / 8 * 9);
    for q in x.chunks_exact(8) {
        out.extend_from_slice(q);
        let corners: Vector3<f32> = q[..4].iter().sum();
        let midsides: Vector3<f32> = q[4..].iter().sum();
        out.push(corners / 2.0 - midsides / 4.0);
    }
    Ok(out)
}

/// Moves an on-curve quadratic midpoint to its tangent-form control point
///
/// A 3-point quadratic element carries its middle point on the curve; the
/// NURBS form wants the control point that defines the end tangents:
/// `P1' = 2·P1 − ½·(P0 + P2)`.
pub fn on_curve_to_control(p0: Vector3<f32>, p1: Vector3<f32>, p2: Vector3<f32>) -> Vector3<f32> {
    2.0 * p1 - 0.5 * (p0 + p2)
}

/// Builds a degree-2 NURBS curve through a 3-point quadratic element
///
/// The middle input point lies on the curve; the returned curve has the
/// fixed knot vector `[0,0,0,1,1,1]`.
pub fn quadratic_curve(x: &[Vector3<f32>; 3]) -> Result<NurbsCurve, Error> {
    NurbsCurve::new(
        vec![x[0], on_curve_to_control(x[0], x[1], x[2]), x[2]],
        ORDER3_KNOTS.to_vec(),
    )
}

/// Local vertex order mapping a quad9 element to a 3×3 NURBS control grid
pub const QUAD9_TO_GRID: [usize; 9] = [0, 7, 3, 4, 8, 6, 1, 5, 2];

/// Local vertex order mapping a quad4 element to a 2×2 NURBS control grid
pub const QUAD4_TO_GRID: [usize; 4] = [0, 3, 1, 2];

/// Builds a NURBS patch through one quadratic surface element
///
/// Accepts a single quad4, quad8 or quad9 element (4, 8 or 9 points, in the
/// usual corners / midsides / center order).  A quad4 becomes a bilinear
/// 2×2 patch; a quad8 is first promoted to quad9; a quad9 is reordered to a
/// 3×3 grid and its on-surface mid line and column are moved to tangent
/// form, column first, then row.
pub fn quad_patch(x: &[Vector3<f32>]) -> Result<NurbsSurface, Error> {
    match x.len() {
        4 => {
            let grid: Vec<Vector3<f32>> = QUAD4_TO_GRID.iter().map(|&i| x[i]).collect();
            NurbsSurface::new(grid, 2, 2, ORDER2_KNOTS.to_vec(), ORDER2_KNOTS.to_vec())
        }
        8 => {
            let q9 = quad8_to_quad9(x)?;
            quad_patch(&q9)
        }
        9 => {
            let mut grid: Vec<Vector3<f32>> = QUAD9_TO_GRID.iter().map(|&i| x[i]).collect();
            // middle column of each row
            for row in 0..3 {
                grid[row * 3 + 1] =
                    on_curve_to_control(grid[row * 3], grid[row * 3 + 1], grid[row * 3 + 2]);
            }
            // middle row
            for col in 0..3 {
                grid[3 + col] = on_curve_to_control(grid[col], grid[3 + col], grid[6 + col]);
            }
            NurbsSurface::new(grid, 3, 3, ORDER3_KNOTS.to_vec(), ORDER3_KNOTS.to_vec())
        }
        n => Err(Error::BadPlexitude(n)),
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_quad8() -> Vec<Vector3<f32>> {
        // regular quad in the z = 0 plane, midsides on the edges
        let corners = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 2.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
        ];
        let mut out = corners.to_vec();
        for i in 0..4 {
            out.push((corners[i] + corners[(i + 1) % 4]) / 2.0);
        }
        out
    }

    #[test]
    fn curve_invariants() {
        let p = vec![Vector3::zeros(); 3];
        assert!(NurbsCurve::new(p.clone(), vec![0.0; 3]).is_err());
        let c = NurbsCurve::new(p.clone(), ORDER3_KNOTS.to_vec()).unwrap();
        assert_eq!(c.order(), 3);
        assert_eq!(c.degree(), 2);
        // degree 8 exceeds the ceiling
        let p2 = vec![Vector3::zeros(); 2];
        assert!(matches!(
            NurbsCurve::new(p2, vec![0.0; 11]),
            Err(Error::UnsupportedOrder(9, MAX_ORDER))
        ));
    }

    #[test]
    fn surface_invariants() {
        let grid = vec![Vector3::zeros(); 4];
        assert!(NurbsSurface::new(
            grid.clone(),
            2,
            2,
            ORDER2_KNOTS.to_vec(),
            vec![0.0, 1.0]
        )
        .is_err());
        let s = NurbsSurface::new(grid, 2, 2, ORDER2_KNOTS.to_vec(), ORDER2_KNOTS.to_vec())
            .unwrap();
        assert_eq!(s.orders(), (2, 2));
    }

    #[test]
    fn quad4_midsides() {
        let q = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 2.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
        ];
        let q8 = quad4_to_quad8(&q).unwrap();
        assert_eq!(q8.len(), 8);
        assert_relative_eq!(q8[4], Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(q8[7], Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn quad9_center_is_corner_centroid() {
        // for a flat regular quad8, the computed center must equal the
        // geometric centroid of the 4 corners
        let q8 = flat_quad8();
        let q9 = quad8_to_quad9(&q8).unwrap();
        assert_eq!(q9.len(), 9);
        let centroid: Vector3<f32> = q8[..4].iter().sum::<Vector3<f32>>() / 4.0;
        assert_relative_eq!(q9[8], centroid);
    }

    #[test]
    fn quadratic_curve_control_point() {
        let x = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ];
        let c = quadratic_curve(&x).unwrap();
        assert_eq!(c.knots(), &ORDER3_KNOTS);
        // P1' = 2*P1 - (P0+P2)/2
        assert_relative_eq!(c.ctrl()[1], Vector3::new(1.0, 2.0, 0.0));
        // endpoints are preserved
        assert_relative_eq!(c.ctrl()[0], x[0]);
        assert_relative_eq!(c.ctrl()[2], x[2]);
    }

    #[test]
    fn quad4_patch_is_bilinear() {
        let q = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 2.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
        ];
        let s = quad_patch(&q).unwrap();
        assert_eq!((s.ns(), s.nt()), (2, 2));
        assert_eq!(s.orders(), (2, 2));
        // grid order [0, 3, 1, 2]
        assert_relative_eq!(s.ctrl()[1], q[3]);
        assert_relative_eq!(s.ctrl()[2], q[1]);
    }

    #[test]
    fn quad8_patch_interpolates_corners() {
        let q8 = flat_quad8();
        let s = quad_patch(&q8).unwrap();
        assert_eq!((s.ns(), s.nt()), (3, 3));
        assert_eq!(s.orders(), (3, 3));
        // with a clamped knot vector the grid corners are on the surface
        assert_relative_eq!(s.ctrl()[0], q8[0]);
        assert_relative_eq!(s.ctrl()[2], q8[3]);
        assert_relative_eq!(s.ctrl()[6], q8[1]);
        assert_relative_eq!(s.ctrl()[8], q8[2]);
        // for a flat element, every control point stays in the plane
        for p in s.ctrl() {
            assert_relative_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn patch_rejects_odd_plexitude() {
        assert!(matches!(
            quad_patch(&[Vector3::zeros(); 5]),
            Err(Error::BadPlexitude(5))
        ));
    }
}
