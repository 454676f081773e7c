//! Glyph outline tessellation.
//!
//! Converts vector outlines (`lyon::path::Path`, font units) into triangle meshes
//! (`crate::scene::Mesh2D`, pixels) using `lyon::tessellation::FillTessellator`.
//! The outline-to-pixel transform is applied while vertices are emitted, so the
//! tessellation tolerance is expressed in *outline* units; `text` converts a pixel
//! tolerance before calling in here.
//!
//! Font outlines are closed contours authored for non-zero winding. Mirrored
//! transforms (y flip, negative em-heights) reverse winding, which non-zero
//! filling tolerates.

use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, FillVertexConstructor,
    VertexBuffers,
};

use crate::font::FontError;
use crate::scene::Mesh2D;

#[derive(Debug, Copy, Clone)]
pub struct TessellateOptions {
    /// Max distance between the curve and its flattened approximation, in outline units.
    pub tolerance: f32,
    pub fill_rule: FillRule,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            fill_rule: FillRule::NonZero,
        }
    }
}

/// Affine transform for 2D points (column-vector convention).
///
/// ```text
/// [ a c tx ]
/// [ b d ty ]
/// [ 0 0  1 ]
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2x3 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine2x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2x3 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Uniform scale with the y axis flipped, then translate.
    ///
    /// Maps y-up font units into y-down pixels.
    #[inline]
    pub fn scale_flip_y_translate(scale: f32, tx: f32, ty: f32) -> Self {
        Self {
            a: scale,
            b: 0.0,
            c: 0.0,
            d: -scale,
            tx,
            ty,
        }
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let nx = self.a * x + self.c * y + self.tx;
        let ny = self.b * x + self.d * y + self.ty;
        (nx, ny)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
struct TessVertex {
    position: [f32; 2],
}

struct TessVertexCtor {
    xf: Affine2x3,
}

impl FillVertexConstructor<TessVertex> for TessVertexCtor {
    fn new_vertex(&mut self, v: FillVertex) -> TessVertex {
        let p = v.position();
        let (x, y) = self.xf.transform_point(p.x, p.y);
        TessVertex { position: [x, y] }
    }
}

/// Reusable fill tessellator.
///
/// Keeps lyon's internal buffers alive between glyphs of the same string.
pub struct GlyphTessellator {
    tess: FillTessellator,
    buffers: VertexBuffers<TessVertex, u16>,
}

impl Default for GlyphTessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphTessellator {
    pub fn new() -> Self {
        Self {
            tess: FillTessellator::new(),
            buffers: VertexBuffers::new(),
        }
    }

    /// Tessellate `path` through `transform` and append the triangles to `out`.
    pub fn append_path(
        &mut self,
        out: &mut Mesh2D,
        path: &Path,
        transform: Affine2x3,
        opts: TessellateOptions,
    ) -> Result<(), FontError> {
        self.buffers.vertices.clear();
        self.buffers.indices.clear();

        let fill = FillOptions::tolerance(opts.tolerance).with_fill_rule(opts.fill_rule);
        let ctor = TessVertexCtor { xf: transform };
        self.tess
            .tessellate_path(path, &fill, &mut BuffersBuilder::new(&mut self.buffers, ctor))
            .map_err(|e| FontError::Tessellation(format!("{e:?}")))?;

        let mesh = Mesh2D {
            positions: self.buffers.vertices.iter().map(|v| v.position).collect(),
            indices: self.buffers.indices.clone(),
        };
        append_mesh(out, &mesh)
    }
}

/// Append `src` into `dst`, offsetting indices.
///
/// Fails instead of wrapping when the merged mesh would exceed u16 indices.
pub fn append_mesh(dst: &mut Mesh2D, src: &Mesh2D) -> Result<(), FontError> {
    let base = dst.positions.len();
    if base + src.positions.len() > u16::MAX as usize {
        return Err(FontError::Tessellation(
            "vertex count overflow for u16 indices".to_string(),
        ));
    }

    dst.positions.extend_from_slice(&src.positions);

    let base_u16 = base as u16;
    dst.indices
        .extend(src.indices.iter().copied().map(|i| base_u16 + i));
    Ok(())
}

#[cfg(test)]
pub(crate) fn rect_path(w: f32, h: f32) -> Path {
    use lyon::math::point;

    let mut b = Path::builder();
    b.begin(point(0.0, 0.0));
    b.line_to(point(w, 0.0));
    b.line_to(point(w, h));
    b.line_to(point(0.0, h));
    b.close();
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_tessellates_into_two_triangles() {
        let mut out = Mesh2D::default();
        GlyphTessellator::new()
            .append_path(
                &mut out,
                &rect_path(10.0, 5.0),
                Affine2x3::IDENTITY,
                TessellateOptions::default(),
            )
            .unwrap();
        assert_eq!(out.indices.len(), 6);
        let b = out.bounds();
        assert_eq!(b.min, [0.0, 0.0]);
        assert_eq!(b.max, [10.0, 5.0]);
    }

    #[test]
    fn flip_transform_maps_font_up_to_screen_down() {
        let mut out = Mesh2D::default();
        GlyphTessellator::new()
            .append_path(
                &mut out,
                &rect_path(10.0, 10.0),
                Affine2x3::scale_flip_y_translate(2.0, 100.0, 50.0),
                TessellateOptions::default(),
            )
            .unwrap();
        let b = out.bounds();
        assert_eq!(b.min, [100.0, 30.0]);
        assert_eq!(b.max, [120.0, 50.0]);
    }

    #[test]
    fn append_offsets_indices() {
        let mut dst = Mesh2D::rect(0.0, 0.0, 1.0, 1.0);
        append_mesh(&mut dst, &Mesh2D::rect(5.0, 5.0, 1.0, 1.0)).unwrap();
        assert_eq!(dst.positions.len(), 8);
        assert_eq!(&dst.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn append_refuses_u16_overflow() {
        let mut dst = Mesh2D {
            positions: vec![[0.0, 0.0]; u16::MAX as usize],
            indices: Vec::new(),
        };
        assert!(append_mesh(&mut dst, &Mesh2D::rect(0.0, 0.0, 1.0, 1.0)).is_err());
    }
}
