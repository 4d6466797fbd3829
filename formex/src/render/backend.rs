//! The seam between draw-call synthesis and the rasterization backend
//!
//! The pipeline never talks to a graphics API directly: it synthesizes
//! [`DrawCall`] values and hands them to a [`Backend`], which compiles them
//! into an opaque replayable resource handle (a display list) and replays
//! or releases it on request.

use super::ColorSpec;
use crate::index::Connectivity;
use crate::Error;
use nalgebra::Vector3;

/// Low-level primitive family emitted for a batch of elements
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveKind {
    /// One point per element
    Points,
    /// Straight segments between vertex pairs
    Lines,
    /// Triangles
    Triangles,
    /// Quadrilaterals
    Quads,
    /// General polygons of constant plexitude
    Polygon,
    /// Open polyline through each element's vertices
    LineStrip,
    /// Closed polyline around each element's vertices
    LineLoop,
}

impl PrimitiveKind {
    /// The natural primitive for elements of the given plexitude
    pub fn for_plexitude(nplex: usize) -> Self {
        match nplex {
            1 => PrimitiveKind::Points,
            2 => PrimitiveKind::Lines,
            3 => PrimitiveKind::Triangles,
            4 => PrimitiveKind::Quads,
            _ => PrimitiveKind::Polygon,
        }
    }
}

/// Raw RGBA8 texture data carried opaquely to the backend
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Texture {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` of them
    pub data: Vec<u8>,
}

impl Texture {
    /// Builds a texture, checking the data length
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        let want = width as usize * height as usize * 4;
        if data.len() != want {
            return Err(Error::MisalignedValues {
                values: data.len(),
                elems: want,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

/// Default texture coordinates: one unit square per element
pub const UNIT_SQUARE_TEXCOORDS: [[f32; 2]; 4] =
    [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// One self-contained backend drawing command
///
/// Normals and per-vertex data are always element-grouped (`nelems × nplex`
/// row-major) regardless of whether the coordinates are indexed.
#[derive(Clone, Debug)]
pub enum DrawCall {
    /// A batch of constant-plexitude polygons, lines or points
    Polygons {
        /// Point coordinates: element-grouped, or nodes when `elems` is set
        coords: Vec<Vector3<f32>>,
        /// Optional connectivity indexing into `coords`
        elems: Option<Connectivity>,
        /// Vertices per element
        nplex: usize,
        /// Optional per-vertex unit normals
        normals: Option<Vec<Vector3<f32>>>,
        /// Color specification, already validated
        colors: ColorSpec,
        /// Optional texture with per-corner coordinates
        texture: Option<(Texture, Vec<[f32; 2]>)>,
        /// Opacity in `0.0..=1.0`
        alpha: f32,
        /// Primitive family to emit
        kind: PrimitiveKind,
        /// Point diameter for `Points` batches
        point_size: Option<f32>,
        /// Line width for wire primitives
        line_width: Option<f32>,
    },
    /// A batch of NURBS curves
    NurbsCurves {
        /// The curve descriptions
        curves: Vec<crate::nurbs::NurbsCurve>,
        /// Color specification, already validated
        colors: ColorSpec,
        /// Opacity in `0.0..=1.0`
        alpha: f32,
        /// Evaluator sampling tolerance
        sampling_tolerance: f32,
    },
    /// A batch of NURBS surfaces
    NurbsSurfaces {
        /// The patch descriptions
        surfaces: Vec<crate::nurbs::NurbsSurface>,
        /// Color specification, already validated
        colors: ColorSpec,
        /// Opacity in `0.0..=1.0`
        alpha: f32,
        /// Evaluator sampling tolerance
        sampling_tolerance: f32,
    },
}

/// A rasterization backend owning compiled drawing resources
///
/// Handles are plain data; the caller owning the [`Drawable`] is
/// responsible for releasing them through the same backend that compiled
/// them, on the thread owning the rendering context.
///
/// [`Drawable`]: super::Drawable
pub trait Backend {
    /// Opaque replayable resource produced by [`Backend::compile`]
    type Handle;

    /// Compiles a sequence of draw calls into a replayable resource
    ///
    /// A failed compilation must leave no resource allocated.
    fn compile(&mut self, calls: &[DrawCall]) -> Result<Self::Handle, Error>;

    /// Replays a previously compiled resource
    fn invoke(&mut self, handle: &Self::Handle);

    /// Frees a compiled resource
    fn release(&mut self, handle: Self::Handle);

    /// Immediately rasterizes polygons for picking
    ///
    /// Picking bypasses compiled resources entirely; the geometry may
    /// legitimately differ from the drawn one (e.g. larger hit targets).
    fn pick_polygons(
        &mut self,
        coords: &[Vector3<f32>],
        elems: Option<&Connectivity>,
        kind: PrimitiveKind,
    );
}
