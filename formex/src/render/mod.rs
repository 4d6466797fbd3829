//! The geometry-to-render pipeline: draw-call synthesis and resource caching
//!
//! [`Drawable`] is the top-level object: it owns a cached backend resource
//! (the compiled display list) keyed by the normalized render mode, rebuilds
//! it lazily on first draw or mode change, and exposes draw/pick/release
//! entry points.  The actual rasterization lives behind the [`Backend`]
//! trait; this crate only synthesizes [`DrawCall`]s.
//!
//! All tunables come in through an explicit [`RenderContext`], so the
//! pipeline is testable without any canvas or session state.

mod backend;
mod color;
mod drawable;

pub use backend::{Backend, DrawCall, PrimitiveKind, Texture, UNIT_SQUARE_TEXCOORDS};
pub use color::ColorSpec;
pub use drawable::{Drawable, ElementKind, Geometry};

use std::num::NonZeroUsize;

/// Rendering mode of a canvas
///
/// The `...Wire` variants add a wireframe overlay on top of the filled
/// rendering; at the geometry level they share a cache entry with their
/// filled base mode (see [`RenderMode::base`]).
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum RenderMode {
    /// Element edges only
    Wireframe,
    /// Filled faces with one normal per element
    Flat,
    /// Flat rendering plus a wireframe overlay
    FlatWire,
    /// Filled faces with averaged per-vertex normals
    Smooth,
    /// Smooth rendering plus a wireframe overlay
    SmoothWire,
}

impl RenderMode {
    /// Strips the wireframe-overlay flag, returning the cache key mode
    ///
    /// `SmoothWire` and `Smooth` produce identical geometry, so they must
    /// share a cached resource; the overlay is a separate rendering flag.
    pub fn base(self) -> RenderMode {
        match self {
            RenderMode::FlatWire => RenderMode::Flat,
            RenderMode::SmoothWire => RenderMode::Smooth,
            m => m,
        }
    }

    /// True for the `...Wire` overlay variants
    pub fn wires(self) -> bool {
        matches!(self, RenderMode::FlatWire | RenderMode::SmoothWire)
    }

    /// True when the mode shades faces and therefore needs normals
    pub fn lighting(self) -> bool {
        self.base() != RenderMode::Wireframe
    }
}

/// Number of worker threads to use during geometry synthesis
#[derive(Copy, Clone, Debug)]
pub enum ThreadCount {
    /// Perform all synthesis in the calling thread
    One,
    /// Decompose large batches over this many workers
    Many(NonZeroUsize),
}

impl ThreadCount {
    /// Gets the thread count
    ///
    /// Returns `None` if we are required to be single-threaded
    pub fn get(&self) -> Option<usize> {
        match self {
            ThreadCount::One => None,
            ThreadCount::Many(v) => Some(v.get()),
        }
    }
}

impl From<NonZeroUsize> for ThreadCount {
    fn from(v: NonZeroUsize) -> Self {
        match v.get() {
            1 => ThreadCount::One,
            _ => ThreadCount::Many(v),
        }
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        ThreadCount::One
    }
}

/// Rendering defaults handed into every pipeline operation
///
/// This replaces ambient canvas/session globals: the caller decides the
/// values once and passes the context down.
#[derive(Clone, Debug)]
pub struct RenderContext {
    /// Current render mode of the owning viewport
    pub mode: RenderMode,
    /// Cosine threshold for direction-clustered normal averaging
    pub avg_normal_threshold: f32,
    /// Sampling tolerance for NURBS curve evaluation
    pub curve_sampling_tolerance: f32,
    /// Sampling tolerance for NURBS surface evaluation
    pub surface_sampling_tolerance: f32,
    /// Draw quadratic curve elements as NURBS instead of line strips
    pub quad_curves_as_nurbs: bool,
    /// Draw quad4/quad8/quad9 elements as NURBS patches
    pub quad_surfaces_as_nurbs: bool,
    /// Colormap backing indexed color resolution
    pub colormap: Vec<[f32; 3]>,
    /// Worker threads for block-decomposed synthesis
    pub threads: ThreadCount,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            mode: RenderMode::Wireframe,
            avg_normal_threshold: 0.5,
            curve_sampling_tolerance: 5.0,
            surface_sampling_tolerance: 20.0,
            quad_curves_as_nurbs: true,
            quad_surfaces_as_nurbs: true,
            colormap: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 0.0],
                [1.0, 1.0, 1.0],
            ],
            threads: ThreadCount::default(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mode_normalization() {
        assert_eq!(RenderMode::SmoothWire.base(), RenderMode::Smooth);
        assert_eq!(RenderMode::FlatWire.base(), RenderMode::Flat);
        assert_eq!(RenderMode::Wireframe.base(), RenderMode::Wireframe);
        assert!(RenderMode::SmoothWire.wires());
        assert!(!RenderMode::Smooth.wires());
        assert!(RenderMode::Flat.lighting());
        assert!(!RenderMode::Wireframe.lighting());
    }

    #[test]
    fn mode_names() {
        assert_eq!(RenderMode::SmoothWire.to_string(), "smoothwire");
        assert_eq!(
            RenderMode::from_str("flatwire").unwrap(),
            RenderMode::FlatWire
        );
    }

    #[test]
    fn thread_count() {
        assert_eq!(ThreadCount::default().get(), None);
        let n = NonZeroUsize::new(4).unwrap();
        assert_eq!(ThreadCount::from(n).get(), Some(4));
        assert_eq!(
            ThreadCount::from(NonZeroUsize::new(1).unwrap()).get(),
            None
        );
    }
}
