//! Drawable objects: geometry plus a cached, mode-keyed display list
//!
//! A [`Drawable`] starts with no compiled resource.  The first call to
//! [`Drawable::draw`] (or any call after the render mode changed) releases
//! the stale resource, synthesizes draw calls from the geometry and compiles
//! them through the backend; further draws with the same normalized mode
//! replay the cached resource unchanged.  Errors during synthesis or
//! compilation leave the cache empty, never half-built.

use super::{
    Backend, ColorSpec, DrawCall, PrimitiveKind, RenderContext, RenderMode, Texture,
    UNIT_SQUARE_TEXCOORDS,
};
use crate::index::Connectivity;
use crate::{geom, nurbs, Error};
use nalgebra::Vector3;

/// Shape family of the elements in a geometry
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ElementKind {
    /// Isolated points
    Point,
    /// Straight 2-point segments
    Line2,
    /// Quadratic 3-point curves, middle point on the curve
    Line3,
    /// Triangles
    Tri3,
    /// Bilinear quadrilaterals
    Quad4,
    /// Quadratic quadrilaterals with midside points
    Quad8,
    /// Quadratic quadrilaterals with midside and center points
    Quad9,
    /// Flat polygons of arbitrary constant plexitude
    Polygon(usize),
}

impl ElementKind {
    /// Number of vertices per element
    pub fn plexitude(self) -> usize {
        match self {
            ElementKind::Point => 1,
            ElementKind::Line2 => 2,
            ElementKind::Line3 | ElementKind::Tri3 => 3,
            ElementKind::Quad4 => 4,
            ElementKind::Quad8 => 8,
            ElementKind::Quad9 => 9,
            ElementKind::Polygon(n) => n,
        }
    }

    /// True for quadratic surface elements eligible for NURBS tessellation
    pub fn is_quadratic_surface(self) -> bool {
        matches!(self, ElementKind::Quad8 | ElementKind::Quad9)
    }

    /// The primitive family used when the element is drawn as a polygon
    pub fn primitive(self) -> PrimitiveKind {
        match self {
            // a quadratic curve rendered without NURBS degrades to a strip
            ElementKind::Line3 => PrimitiveKind::LineStrip,
            k => PrimitiveKind::for_plexitude(k.plexitude()),
        }
    }
}

enum Model {
    /// Element-grouped coordinates, `nelems × nplex` row-major
    Soup(Vec<Vector3<f32>>),
    /// Node coordinates plus a connectivity indexing into them
    Indexed {
        coords: Vec<Vector3<f32>>,
        elems: Connectivity,
    },
}

/// Geometric payload of a drawable: coordinates, optional connectivity, kind
pub struct Geometry {
    kind: ElementKind,
    model: Model,
}

impl Geometry {
    /// Builds a geometry from element-grouped coordinates
    pub fn soup(coords: Vec<Vector3<f32>>, kind: ElementKind) -> Result<Self, Error> {
        let nplex = kind.plexitude();
        if nplex == 0 || coords.len() % nplex != 0 {
            return Err(Error::BadConnectivity {
                len: coords.len(),
                nplex,
            });
        }
        Ok(Self {
            kind,
            model: Model::Soup(coords),
        })
    }

    /// Builds a geometry from node coordinates and a connectivity
    pub fn indexed(
        coords: Vec<Vector3<f32>>,
        elems: Connectivity,
        kind: ElementKind,
    ) -> Result<Self, Error> {
        if elems.nplex() != kind.plexitude() {
            return Err(Error::BadPlexitude(elems.nplex()));
        }
        elems.check_non_negative()?;
        if let Some(max) = elems.max() {
            if max as usize >= coords.len() {
                return Err(Error::MisalignedValues {
                    values: coords.len(),
                    elems: max as usize + 1,
                });
            }
        }
        Ok(Self {
            kind,
            model: Model::Indexed { coords, elems },
        })
    }

    /// The element kind
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Number of elements
    pub fn nelems(&self) -> usize {
        match &self.model {
            Model::Soup(c) => c.len() / self.kind.plexitude(),
            Model::Indexed { elems, .. } => elems.nelems(),
        }
    }

    /// Vertices per element
    pub fn nplex(&self) -> usize {
        self.kind.plexitude()
    }

    /// The raw coordinate array
    pub fn coords(&self) -> &[Vector3<f32>] {
        match &self.model {
            Model::Soup(c) => c,
            Model::Indexed { coords, .. } => coords,
        }
    }

    /// The connectivity, if this is an indexed model
    pub fn elems(&self) -> Option<&Connectivity> {
        match &self.model {
            Model::Soup(_) => None,
            Model::Indexed { elems, .. } => Some(elems),
        }
    }

    /// Coordinates in element-grouped order, gathering if indexed
    pub fn grouped(&self) -> Vec<Vector3<f32>> {
        match &self.model {
            Model::Soup(c) => c.clone(),
            Model::Indexed { coords, elems } => elems
                .as_slice()
                .iter()
                .map(|&i| coords[i as usize])
                .collect(),
        }
    }

    /// Axis-aligned bounding box over all coordinates
    pub fn bbox(&self) -> (Vector3<f32>, Vector3<f32>) {
        let coords = self.coords();
        if coords.is_empty() {
            return (Vector3::zeros(), Vector3::zeros());
        }
        let mut min = coords[0];
        let mut max = coords[0];
        for p in &coords[1..] {
            min = min.inf(p);
            max = max.sup(p);
        }
        (min, max)
    }

    /// Extracts sub-elements through local vertex patterns
    ///
    /// Each pattern lists local vertex numbers (`0..nplex`) defining one
    /// edge or face of every element; all patterns must have the plexitude
    /// of the requested result kind.  Patterns of differing plexitudes go
    /// into separate batches.
    pub fn extract(&self, patterns: &[&[usize]], kind: ElementKind) -> Result<Geometry, Error> {
        let nplex = self.nplex();
        for pat in patterns {
            if pat.len() != kind.plexitude() {
                return Err(Error::BadPlexitude(pat.len()));
            }
            if let Some(&bad) = pat.iter().find(|&&p| p >= nplex) {
                return Err(Error::BadPattern(bad, nplex));
            }
        }
        match &self.model {
            Model::Soup(c) => {
                let mut out = Vec::with_capacity(self.nelems() * patterns.len() * kind.plexitude());
                for el in c.chunks_exact(nplex) {
                    for pat in patterns {
                        out.extend(pat.iter().map(|&p| el[p]));
                    }
                }
                Geometry::soup(out, kind)
            }
            Model::Indexed { coords, elems } => {
                let mut out = Vec::with_capacity(elems.nelems() * patterns.len() * kind.plexitude());
                for el in elems.rows() {
                    for pat in patterns {
                        out.extend(pat.iter().map(|&p| el[p]));
                    }
                }
                Geometry::indexed(
                    coords.clone(),
                    Connectivity::new(out, kind.plexitude())?,
                    kind,
                )
            }
        }
    }
}

/// Re-maps a color specification through extraction patterns
///
/// Per-element colors are repeated once per pattern; per-vertex colors are
/// re-indexed through each pattern.
pub fn extract_colors(
    colors: &ColorSpec,
    patterns: &[&[usize]],
    nplex: usize,
) -> Result<ColorSpec, Error> {
    match colors {
        ColorSpec::PerElement(_) => Ok(colors.multiplex(patterns.len())),
        ColorSpec::PerVertex(v) => {
            for pat in patterns {
                if let Some(&bad) = pat.iter().find(|&&p| p >= nplex) {
                    return Err(Error::BadPattern(bad, nplex));
                }
            }
            let mut out = Vec::new();
            for el in v.chunks_exact(nplex) {
                for pat in patterns {
                    out.extend(pat.iter().map(|&p| el[p]));
                }
            }
            Ok(ColorSpec::PerVertex(out))
        }
        other => Ok(other.clone()),
    }
}

////////////////////////////////////////////////////////////////////////////////

struct CachedList<H> {
    handle: H,
    mode: RenderMode,
}

/// Anything that can be drawn through a [`Backend`]
///
/// The cached resource, the mode it was built for and the dependent
/// drawables all live here.  All methods must be called from the thread
/// owning the rendering context; handles are not transferable.
pub struct Drawable<B: Backend> {
    geometry: Geometry,
    color: ColorSpec,
    alpha: f32,
    texture: Option<Texture>,
    point_size: Option<f32>,
    line_width: Option<f32>,
    cache: Option<CachedList<B::Handle>>,
    extra: Vec<Drawable<B>>,
}

impl<B: Backend> Drawable<B> {
    /// Wraps a geometry into an uncolored, uncached drawable
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            color: ColorSpec::None,
            alpha: 1.0,
            texture: None,
            point_size: None,
            line_width: None,
            cache: None,
            extra: Vec::new(),
        }
    }

    /// The geometric payload
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.geometry.nelems()
    }

    /// Axis-aligned bounding box
    pub fn bbox(&self) -> (Vector3<f32>, Vector3<f32>) {
        self.geometry.bbox()
    }

    /// Sets the color, validating it against the geometry
    pub fn set_color(&mut self, color: ColorSpec) -> Result<(), Error> {
        color.validate(self.geometry.nelems(), self.geometry.nplex())?;
        self.color = color;
        Ok(())
    }

    /// Sets indexed colors resolved against the context colormap
    pub fn set_color_indices(&mut self, indices: &[i32], ctx: &RenderContext) -> Result<(), Error> {
        self.set_color(ColorSpec::from_indices(indices, &ctx.colormap)?)
    }

    /// Sets or clears the texture payload
    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.texture = texture;
    }

    /// Sets the point diameter used for point elements
    pub fn set_point_size(&mut self, size: Option<f32>) {
        self.point_size = size;
    }

    /// Sets the line width used for wire primitives
    pub fn set_line_width(&mut self, width: Option<f32>) {
        self.line_width = width;
    }

    /// Sets the opacity
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    /// Adds a dependent drawable, redrawn whenever this one is drawn
    pub fn push_extra(&mut self, extra: Drawable<B>) {
        self.extra.push(extra);
    }

    /// The dependent drawables
    pub fn extras(&self) -> &[Drawable<B>] {
        &self.extra
    }

    /// True when a compiled resource is currently cached
    pub fn is_built(&self) -> bool {
        self.cache.is_some()
    }

    /// Draws the object, building or rebuilding the cached resource if the
    /// normalized render mode changed
    ///
    /// On error the cache is left empty and the dependents are not drawn;
    /// the caller decides whether the rest of the scene continues.
    pub fn draw(&mut self, ctx: &RenderContext, backend: &mut B) -> Result<(), Error> {
        let mode = ctx.mode.base();
        let stale = self.cache.as_ref().map(|c| c.mode != mode).unwrap_or(true);
        if stale {
            if let Some(old) = self.cache.take() {
                backend.release(old.handle);
            }
            let calls = self.build_calls(ctx, mode)?;
            let handle = backend.compile(&calls)?;
            self.cache = Some(CachedList { handle, mode });
        }
        if let Some(c) = &self.cache {
            backend.invoke(&c.handle);
        }
        for e in &mut self.extra {
            e.draw(ctx, backend)?;
        }
        Ok(())
    }

    /// Rasterizes the object for picking
    ///
    /// Picking always re-issues raw draw calls: it never creates, reuses or
    /// touches the cached resource.
    pub fn pick(&self, backend: &mut B) {
        let prim = self.geometry.kind().primitive();
        match &self.geometry.model {
            Model::Soup(coords) => backend.pick_polygons(coords, None, prim),
            Model::Indexed { coords, elems } => {
                backend.pick_polygons(coords, Some(elems), prim)
            }
        }
    }

    /// Frees the cached resource, if any, here and in all dependents
    ///
    /// Safe to call at any time; calling it twice is a no-op the second
    /// time.  Must be called before dropping the drawable, on the thread
    /// owning the rendering context.
    pub fn release(&mut self, backend: &mut B) {
        if let Some(c) = self.cache.take() {
            backend.release(c.handle);
        }
        for e in &mut self.extra {
            e.release(backend);
        }
    }

    /// Synthesizes the draw calls for the given normalized mode
    fn build_calls(&self, ctx: &RenderContext, mode: RenderMode) -> Result<Vec<DrawCall>, Error> {
        let nelems = self.geometry.nelems();
        let nplex = self.geometry.nplex();
        self.color.validate(nelems, nplex)?;
        let kind = self.geometry.kind();

        if kind == ElementKind::Line3 && ctx.quad_curves_as_nurbs {
            let grouped = self.geometry.grouped();
            let mut curves = Vec::with_capacity(nelems);
            for el in grouped.chunks_exact(3) {
                match nurbs::quadratic_curve(&[el[0], el[1], el[2]]) {
                    Ok(c) => curves.push(c),
                    Err(Error::UnsupportedOrder(order, max)) => {
                        log::warn!("skipping NURBS curve of order {order} (maximum is {max})");
                    }
                    Err(e) => return Err(e),
                }
            }
            return Ok(vec![DrawCall::NurbsCurves {
                curves,
                colors: self.color.clone(),
                alpha: self.alpha,
                sampling_tolerance: ctx.curve_sampling_tolerance,
            }]);
        }

        if kind.is_quadratic_surface() && ctx.quad_surfaces_as_nurbs {
            let grouped = self.geometry.grouped();
            let mut surfaces = Vec::with_capacity(nelems);
            for el in grouped.chunks_exact(nplex) {
                match nurbs::quad_patch(el) {
                    Ok(s) => surfaces.push(s),
                    Err(Error::UnsupportedOrder(order, max)) => {
                        log::warn!("skipping NURBS patch of order {order} (maximum is {max})");
                    }
                    Err(e) => return Err(e),
                }
            }
            return Ok(vec![DrawCall::NurbsSurfaces {
                surfaces,
                colors: grid_colors(&self.color, nplex)?,
                alpha: self.alpha,
                sampling_tolerance: ctx.surface_sampling_tolerance,
            }]);
        }

        let prim = kind.primitive();
        let is_face = matches!(
            prim,
            PrimitiveKind::Triangles | PrimitiveKind::Quads | PrimitiveKind::Polygon
        );
        let normals = if mode.lighting() && is_face {
            Some(self.vertex_normals(ctx, mode)?)
        } else {
            None
        };
        let texture = self
            .texture
            .clone()
            .map(|t| (t, UNIT_SQUARE_TEXCOORDS.to_vec()));
        let (coords, elems) = match &self.geometry.model {
            Model::Soup(c) => (c.clone(), None),
            Model::Indexed { coords, elems } => (coords.clone(), Some(elems.clone())),
        };
        Ok(vec![DrawCall::Polygons {
            coords,
            elems,
            nplex,
            normals,
            colors: self.color.clone(),
            texture,
            alpha: self.alpha,
            kind: prim,
            point_size: self.point_size,
            line_width: self.line_width,
        }])
    }

    /// Per-vertex normals for a lit mode
    ///
    /// Smooth rendering of an indexed model averages normals at shared
    /// nodes, clustered by the context's direction threshold; everything
    /// else replicates each element's flat normal.
    fn vertex_normals(
        &self,
        ctx: &RenderContext,
        mode: RenderMode,
    ) -> Result<Vec<Vector3<f32>>, Error> {
        let nplex = self.geometry.nplex();
        if mode == RenderMode::Smooth {
            if let Model::Indexed { coords, elems } = &self.geometry.model {
                return geom::average_normals(coords, elems, Some(ctx.avg_normal_threshold));
            }
        }
        let grouped = self.geometry.grouped();
        let flat = match ctx.threads.get() {
            Some(n) if n > 1 => geom::polygon_normals_blocked(&grouped, nplex, n)?,
            _ => geom::polygon_normals(&grouped, nplex)?,
        };
        let mut out = Vec::with_capacity(flat.len() * nplex);
        for n in &flat {
            for _ in 0..nplex {
                out.push(*n);
            }
        }
        Ok(out)
    }
}

/// Per-vertex colors rearranged into NURBS control-grid order
///
/// Follows the coordinate path (quad8 promotion, grid reordering) but keeps
/// the color values themselves untouched.
fn grid_colors(colors: &ColorSpec, nplex: usize) -> Result<ColorSpec, Error> {
    let v = match colors {
        ColorSpec::PerVertex(v) => v,
        other => return Ok(other.clone()),
    };
    let mut out = Vec::new();
    for el in v.chunks_exact(nplex) {
        match nplex {
            8 => {
                let mut c9: Vec<[f32; 3]> = el.to_vec();
                let mut center = [0.0f32; 3];
                for k in 0..3 {
                    let corners: f32 = el[..4].iter().map(|c| c[k]).sum();
                    let midsides: f32 = el[4..].iter().map(|c| c[k]).sum();
                    center[k] = corners / 2.0 - midsides / 4.0;
                }
                c9.push(center);
                out.extend(nurbs::QUAD9_TO_GRID.iter().map(|&i| c9[i]));
            }
            9 => out.extend(nurbs::QUAD9_TO_GRID.iter().map(|&i| el[i])),
            n => return Err(Error::BadPlexitude(n)),
        }
    }
    Ok(ColorSpec::PerVertex(out))
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Mock {
        compiles: usize,
        invokes: usize,
        releases: usize,
        picks: usize,
        fail_compile: bool,
        last: Vec<&'static str>,
    }

    impl Backend for Mock {
        type Handle = usize;

        fn compile(&mut self, calls: &[DrawCall]) -> Result<usize, Error> {
            if self.fail_compile {
                return Err(Error::Compile("mock refused".to_string()));
            }
            self.compiles += 1;
            self.last = calls
                .iter()
                .map(|c| match c {
                    DrawCall::Polygons { .. } => "polygons",
                    DrawCall::NurbsCurves { .. } => "curves",
                    DrawCall::NurbsSurfaces { .. } => "surfaces",
                })
                .collect();
            Ok(self.compiles)
        }

        fn invoke(&mut self, _handle: &usize) {
            self.invokes += 1;
        }

        fn release(&mut self, _handle: usize) {
            self.releases += 1;
        }

        fn pick_polygons(
            &mut self,
            _coords: &[Vector3<f32>],
            _elems: Option<&Connectivity>,
            _kind: PrimitiveKind,
        ) {
            self.picks += 1;
        }
    }

    fn triangle_soup(n: usize) -> Geometry {
        let mut coords = Vec::new();
        for i in 0..n {
            let f = i as f32;
            coords.push(Vector3::new(f, 0.0, 0.0));
            coords.push(Vector3::new(f + 1.0, 0.0, 0.0));
            coords.push(Vector3::new(f, 1.0, 0.0));
        }
        Geometry::soup(coords, ElementKind::Tri3).unwrap()
    }

    fn ctx(mode: RenderMode) -> RenderContext {
        RenderContext {
            mode,
            ..RenderContext::default()
        }
    }

    #[test]
    fn cache_reuse_is_idempotent() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(4));
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        assert_eq!(b.compiles, 1);
        assert_eq!(b.invokes, 2);
        assert_eq!(b.releases, 0);
    }

    #[test]
    fn mode_change_rebuilds() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(4));
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        d.draw(&ctx(RenderMode::Smooth), &mut b).unwrap();
        assert_eq!(b.compiles, 2);
        assert_eq!(b.releases, 1);
    }

    #[test]
    fn wire_variants_share_the_cache() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(4));
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Smooth), &mut b).unwrap();
        d.draw(&ctx(RenderMode::SmoothWire), &mut b).unwrap();
        assert_eq!(b.compiles, 1);
        assert_eq!(b.invokes, 2);
    }

    #[test]
    fn release_is_idempotent() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(1));
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        assert!(d.is_built());
        d.release(&mut b);
        assert!(!d.is_built());
        d.release(&mut b);
        assert_eq!(b.releases, 1);
        // drawing again rebuilds from scratch
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        assert_eq!(b.compiles, 2);
    }

    #[test]
    fn compile_failure_leaves_no_resource() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(1));
        let mut b = Mock {
            fail_compile: true,
            ..Mock::default()
        };
        assert!(d.draw(&ctx(RenderMode::Flat), &mut b).is_err());
        assert!(!d.is_built());
        // the backend recovers and the next draw builds normally
        b.fail_compile = false;
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        assert!(d.is_built());
        assert_eq!(b.compiles, 1);
    }

    #[test]
    fn synthesis_failure_leaves_no_resource() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(4));
        // bypass set_color validation to plant a stale color
        d.color = ColorSpec::PerElement(vec![[1.0, 0.0, 0.0]; 2]);
        let mut b = Mock::default();
        assert!(matches!(
            d.draw(&ctx(RenderMode::Flat), &mut b),
            Err(Error::ColorMismatch { got: 2, want: 4, .. })
        ));
        assert!(!d.is_built());
        assert_eq!(b.compiles, 0);
    }

    #[test]
    fn color_broadcasting() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(100));
        assert!(d.set_color(ColorSpec::Single([1.0, 0.0, 0.0])).is_ok());
        assert!(matches!(
            d.set_color(ColorSpec::PerElement(vec![[1.0, 0.0, 0.0]; 50])),
            Err(Error::ColorMismatch {
                got: 50,
                want: 100,
                ..
            })
        ));
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        assert_eq!(b.compiles, 1);
    }

    #[test]
    fn pick_bypasses_the_cache() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(4));
        let mut b = Mock::default();
        d.pick(&mut b);
        assert_eq!(b.picks, 1);
        assert_eq!(b.compiles, 0);
        assert!(!d.is_built());
        // picking after a draw leaves the cache untouched
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        d.pick(&mut b);
        assert_eq!(b.picks, 2);
        assert_eq!(b.compiles, 1);
    }

    #[test]
    fn extras_are_drawn_and_released_with_the_parent() {
        let mut d: Drawable<Mock> = Drawable::new(triangle_soup(2));
        d.push_extra(Drawable::new(triangle_soup(1)));
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        assert_eq!(b.compiles, 2);
        assert_eq!(b.invokes, 2);
        // the dependent is independently cached
        d.draw(&ctx(RenderMode::Flat), &mut b).unwrap();
        assert_eq!(b.compiles, 2);
        assert_eq!(b.invokes, 4);
        d.release(&mut b);
        assert_eq!(b.releases, 2);
    }

    #[test]
    fn wireframe_skips_normals() {
        let d: Drawable<Mock> = Drawable::new(triangle_soup(2));
        let calls = d
            .build_calls(&ctx(RenderMode::Wireframe), RenderMode::Wireframe)
            .unwrap();
        match &calls[0] {
            DrawCall::Polygons { normals, .. } => assert!(normals.is_none()),
            _ => panic!("expected a polygon call"),
        }
    }

    #[test]
    fn flat_mode_replicates_element_normals() {
        let d: Drawable<Mock> = Drawable::new(triangle_soup(2));
        let calls = d
            .build_calls(&ctx(RenderMode::Flat), RenderMode::Flat)
            .unwrap();
        match &calls[0] {
            DrawCall::Polygons { normals, .. } => {
                let n = normals.as_ref().unwrap();
                assert_eq!(n.len(), 6);
                for v in n {
                    assert_relative_eq!(*v, Vector3::new(0.0, 0.0, 1.0));
                }
            }
            _ => panic!("expected a polygon call"),
        }
    }

    #[test]
    fn quadratic_curves_become_nurbs() {
        let coords = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ];
        let g = Geometry::soup(coords, ElementKind::Line3).unwrap();
        let mut d: Drawable<Mock> = Drawable::new(g);
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Smooth), &mut b).unwrap();
        assert_eq!(b.last, vec!["curves"]);

        // with the toggle off, the curve degrades to a line strip
        let mut off = ctx(RenderMode::Smooth);
        off.quad_curves_as_nurbs = false;
        let mut d2: Drawable<Mock> = Drawable::new(Geometry::soup(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
            ],
            ElementKind::Line3,
        )
        .unwrap());
        d2.draw(&off, &mut b).unwrap();
        assert_eq!(b.last, vec!["polygons"]);
    }

    #[test]
    fn quadratic_surfaces_become_nurbs() {
        let corners = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 2.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
        ];
        let mut coords = corners.to_vec();
        for i in 0..4 {
            coords.push((corners[i] + corners[(i + 1) % 4]) / 2.0);
        }
        let g = Geometry::soup(coords, ElementKind::Quad8).unwrap();
        let mut d: Drawable<Mock> = Drawable::new(g);
        let mut b = Mock::default();
        d.draw(&ctx(RenderMode::Smooth), &mut b).unwrap();
        assert_eq!(b.last, vec!["surfaces"]);
    }

    #[test]
    fn indexed_geometry_checks_bounds() {
        let coords = vec![Vector3::zeros(); 2];
        let elems = Connectivity::new(vec![0, 1, 2], 3).unwrap();
        assert!(Geometry::indexed(coords, elems, ElementKind::Tri3).is_err());
    }

    #[test]
    fn extraction_of_edges() {
        // one quad, extracting its four edges
        let g = Geometry::soup(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            ElementKind::Quad4,
        )
        .unwrap();
        let patterns: [&[usize]; 4] = [&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
        let edges = g.extract(&patterns, ElementKind::Line2).unwrap();
        assert_eq!(edges.nelems(), 4);
        assert_eq!(edges.kind(), ElementKind::Line2);
        assert_relative_eq!(edges.grouped()[2], Vector3::new(1.0, 0.0, 0.0));

        // a per-element color multiplexes over the edges
        let c = extract_colors(&ColorSpec::PerElement(vec![[1.0, 0.0, 0.0]]), &patterns, 4)
            .unwrap();
        assert_eq!(c, ColorSpec::PerElement(vec![[1.0, 0.0, 0.0]; 4]));

        // an out-of-range pattern is refused
        let bad: [&[usize]; 1] = [&[0, 4]];
        assert!(g.extract(&bad, ElementKind::Line2).is_err());
    }

    #[test]
    fn bbox_and_counts() {
        let d: Drawable<Mock> = Drawable::new(triangle_soup(3));
        assert_eq!(d.element_count(), 3);
        let (min, max) = d.bbox();
        assert_relative_eq!(min, Vector3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(max, Vector3::new(3.0, 1.0, 0.0));
    }
}
