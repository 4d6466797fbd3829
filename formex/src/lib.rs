//! Formex is a library for deriving renderable quantities from array-based
//! geometric models and managing their cached GPU resources.
//!
//! A model is a **coordinate array** (3D points) with an optional
//! **connectivity array** (fixed-width tuples of indices, the "elements").
//! From those, this crate computes what a renderer needs (normals, areas,
//! topology bookkeeping, NURBS tessellations of quadratic elements) and
//! turns it into backend draw calls cached per render mode.
//!
//! The crate is organized bottom-up:
//!
//! - [`vecmath`]: pure numerical routines (rotation matrices, Euler-angle
//!   extraction, cubic roots, batched small linear solves).
//! - [`index`]: integer-array bookkeeping (stable unique, inverse indices,
//!   matching, grouping, multiplicities).
//! - [`geom`]: derived geometric quantities (areas, normals, nodal
//!   averaging with direction clustering).
//! - [`nurbs`]: conversion of quadratic elements into validated NURBS
//!   curve/surface descriptions.
//! - [`render`]: the drawable objects: draw-call synthesis, the
//!   mode-keyed display-list cache, and the [`Backend`](render::Backend)
//!   seam to the rasterizer.
//!
//! # Drawing something
//!
//! ```no_run
//! use formex::render::{Drawable, Geometry, ElementKind, RenderContext, RenderMode};
//! use nalgebra::Vector3;
//!
//! # struct Gl;
//! # impl formex::render::Backend for Gl {
//! #     type Handle = u32;
//! #     fn compile(&mut self, _: &[formex::render::DrawCall]) -> Result<u32, formex::Error> { Ok(0) }
//! #     fn invoke(&mut self, _: &u32) {}
//! #     fn release(&mut self, _: u32) {}
//! #     fn pick_polygons(&mut self, _: &[Vector3<f32>], _: Option<&formex::index::Connectivity>,
//! #                      _: formex::render::PrimitiveKind) {}
//! # }
//! # let mut backend = Gl;
//! let coords = vec![
//!     Vector3::new(0.0, 0.0, 0.0),
//!     Vector3::new(1.0, 0.0, 0.0),
//!     Vector3::new(0.0, 1.0, 0.0),
//! ];
//! let geometry = Geometry::soup(coords, ElementKind::Tri3)?;
//! let mut triangle = Drawable::new(geometry);
//!
//! let ctx = RenderContext { mode: RenderMode::Smooth, ..RenderContext::default() };
//! triangle.draw(&ctx, &mut backend)?;   // builds and caches a display list
//! triangle.draw(&ctx, &mut backend)?;   // replays the cached list
//! triangle.release(&mut backend);
//! # Ok::<(), formex::Error>(())
//! ```
//!
//! Geometry synthesis and resource management are confined to the thread
//! owning the rendering context; only the block-decomposed derivation path
//! in [`geom`] fans out to workers.
#![warn(missing_docs)]

mod error;
pub use error::Error;

pub mod geom;
pub mod index;
pub mod nurbs;
pub mod render;
pub mod vecmath;
