//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for this crate
#[derive(Error, Debug)]
pub enum Error {
    /// Leading coefficient of a cubic equation is zero
    #[error("leading coefficient of a cubic equation must not be zero")]
    NotACubic,

    /// Vector has zero length and cannot define a direction
    #[error("zero-length vector cannot define a direction")]
    ZeroVector,

    /// Matrix and right-hand side shapes are incompatible
    #[error("system matrix {0}x{1} does not match right-hand side with {2} rows")]
    BadSystemShape(usize, usize, usize),

    /// Batched systems have mismatched counts
    #[error("got {0} matrices but {1} right-hand sides")]
    BadSystemCount(usize, usize),

    /// A system matrix could not be solved
    #[error("system matrix is singular")]
    SingularSystem,

    /// Negative value used where a position is required
    #[error("negative index {0} is not a valid position")]
    NegativeIndex(i32),

    /// Flat element array length is not a multiple of the plexitude
    #[error("array of length {len} cannot hold elements of plexitude {nplex}")]
    BadConnectivity {
        /// Flat array length
        len: usize,
        /// Vertices per element
        nplex: usize,
    },

    /// Plexitude is not supported by the requested operation
    #[error("elements of plexitude {0} are not supported here")]
    BadPlexitude(usize),

    /// Weight array does not align with the value array
    #[error("weight array of length {0} does not match {1} values")]
    WeightMismatch(usize, usize),

    /// Per-element value array does not align with the connectivity
    #[error("value array of length {values} does not match {elems} element vertices")]
    MisalignedValues {
        /// Number of supplied values
        values: usize,
        /// Number of element vertices in the connectivity
        elems: usize,
    },

    /// Color array cannot be broadcast over the geometry
    #[error("color array of {got} entries cannot color {want} {unit}")]
    ColorMismatch {
        /// Number of supplied colors
        got: usize,
        /// Number of colored entities
        want: usize,
        /// What is being colored ("elements" or "vertices")
        unit: &'static str,
    },

    /// Knot vector is too short for the control net
    #[error("knot vector of length {knots} must be longer than the control net ({ctrl} points)")]
    BadKnots {
        /// Knot vector length
        knots: usize,
        /// Number of control points
        ctrl: usize,
    },

    /// NURBS order exceeds the renderer's capability ceiling
    #[error("order {0} exceeds the supported maximum of {1}")]
    UnsupportedOrder(usize, usize),

    /// Local vertex pattern points outside the element
    #[error("pattern index {0} exceeds element plexitude {1}")]
    BadPattern(usize, usize),

    /// Backend refused to compile a display list
    #[error("backend failed to compile a display list: {0}")]
    Compile(String),
}
