//! Tagged color specifications for draw calls
//!
//! The variant is decided once at the call boundary instead of re-sniffing
//! array shapes inside every drawing function.

use crate::Error;

/// How a draw call is colored
///
/// Color arrays must broadcast-align with the element/vertex dimensions of
/// the geometry being drawn: a single triple applies everywhere, a
/// per-element array needs one entry per element, a per-vertex array one
/// entry per element vertex.  Anything else is a validation error, not a
/// silent coercion.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ColorSpec {
    /// No color: the ambient/default color applies
    #[default]
    None,
    /// One RGB triple for the whole draw call
    Single([f32; 3]),
    /// One RGB triple per element
    PerElement(Vec<[f32; 3]>),
    /// One RGB triple per vertex per element, row-major
    PerVertex(Vec<[f32; 3]>),
}

impl ColorSpec {
    /// Resolves indexed colors against a colormap into per-element colors
    pub fn from_indices(indices: &[i32], colormap: &[[f32; 3]]) -> Result<Self, Error> {
        let mut colors = Vec::with_capacity(indices.len());
        for &i in indices {
            if i < 0 {
                return Err(Error::NegativeIndex(i));
            }
            let c = colormap.get(i as usize).ok_or(Error::ColorMismatch {
                got: colormap.len(),
                want: i as usize + 1,
                unit: "colormap entries",
            })?;
            colors.push(*c);
        }
        Ok(ColorSpec::PerElement(colors))
    }

    /// Checks broadcast alignment against `nelems` elements of `nplex` vertices
    pub fn validate(&self, nelems: usize, nplex: usize) -> Result<(), Error> {
        match self {
            ColorSpec::None | ColorSpec::Single(_) => Ok(()),
            ColorSpec::PerElement(v) if v.len() == nelems => Ok(()),
            ColorSpec::PerElement(v) => Err(Error::ColorMismatch {
                got: v.len(),
                want: nelems,
                unit: "elements",
            }),
            ColorSpec::PerVertex(v) if v.len() == nelems * nplex => Ok(()),
            ColorSpec::PerVertex(v) => Err(Error::ColorMismatch {
                got: v.len(),
                want: nelems * nplex,
                unit: "vertices",
            }),
        }
    }

    /// Repeats per-element colors when each element expands to `nfaces` parts
    ///
    /// Used when a solid element is drawn as several faces that must all
    /// take the element's color.
    pub fn multiplex(&self, nfaces: usize) -> ColorSpec {
        match self {
            ColorSpec::PerElement(v) => {
                let mut out = Vec::with_capacity(v.len() * nfaces);
                for c in v {
                    for _ in 0..nfaces {
                        out.push(*c);
                    }
                }
                ColorSpec::PerElement(out)
            }
            other => other.clone(),
        }
    }

    /// Re-indexes per-vertex colors through a local vertex pattern
    ///
    /// For each element of `nplex` vertices, keeps the colors at the local
    /// positions listed in `pattern`.  Other variants pass through.
    pub fn select_pattern(&self, pattern: &[usize], nplex: usize) -> Result<ColorSpec, Error> {
        if let Some(&bad) = pattern.iter().find(|&&p| p >= nplex) {
            return Err(Error::BadPattern(bad, nplex));
        }
        match self {
            ColorSpec::PerVertex(v) => {
                let mut out = Vec::with_capacity(v.len() / nplex * pattern.len());
                for el in v.chunks_exact(nplex) {
                    for &p in pattern {
                        out.push(el[p]);
                    }
                }
                Ok(ColorSpec::PerVertex(out))
            }
            other => Ok(other.clone()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
