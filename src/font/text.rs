//! Single-line text layout at an em-height.
//!
//! Input: a string, a resolved face, an em-height in pixels, horizontal alignment
//! and a vertical anchor. Output: one merged `scene::Mesh2D` in y-down pixel space
//! whose origin is the *anchor point*:
//! - horizontally, `TextAlign` decides whether the origin is the left edge, the
//!   center, or the right edge of the advance box
//! - vertically, `TextAnchor` decides which font line (baseline, cap height, ...)
//!   passes through the origin
//!
//! The model is deliberately naive: pen advances by `advance_width`, no kerning,
//! no shaping, one line.

use crate::font::tessellate::{Affine2x3, GlyphTessellator, TessellateOptions};
use crate::font::{
    FontError, FontVMetrics, ResolvedFace, glyph_h_metrics, glyph_id_for_char, glyph_outline_path,
};
use crate::scene::Mesh2D;

/// Horizontal alignment of a line relative to its origin.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Which horizontal font line is placed on the origin.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    #[default]
    Baseline,
    /// Halfway between ascender and descender.
    Middle,
    /// Ascender line.
    Top,
    /// Descender line.
    Bottom,
    /// Halfway between baseline and cap height.
    CapMiddle,
    /// Cap height line.
    CapTop,
}

/// Distance from the origin down to the baseline, in y-down pixels.
pub fn baseline_offset_px(anchor: TextAnchor, m: &FontVMetrics, scale: f32) -> f32 {
    match anchor {
        TextAnchor::Baseline => 0.0,
        TextAnchor::Middle => 0.5 * (m.ascender + m.descender) * scale,
        TextAnchor::Top => m.ascender * scale,
        TextAnchor::Bottom => m.descender * scale,
        TextAnchor::CapMiddle => 0.5 * m.cap_height * scale,
        TextAnchor::CapTop => m.cap_height * scale,
    }
}

/// X of the pen start relative to the origin.
pub fn align_offset_px(align: TextAlign, advance_px: f32) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -0.5 * advance_px,
        TextAlign::Right => -advance_px,
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TextLayoutOptions {
    /// Em-height in pixels. Zero lays out nothing; negative mirrors through the origin.
    pub em_height_px: f32,
    pub align: TextAlign,
    pub anchor: TextAnchor,
    /// Curve flattening tolerance in pixels.
    pub tolerance_px: f32,
}

impl Default for TextLayoutOptions {
    fn default() -> Self {
        Self {
            em_height_px: 14.0,
            align: TextAlign::Left,
            anchor: TextAnchor::Baseline,
            tolerance_px: 0.1,
        }
    }
}

/// A laid-out line: merged fill mesh plus its total advance in pixels.
#[derive(Debug, Clone, Default)]
pub struct TextMesh {
    pub mesh: Mesh2D,
    pub advance_width_px: f32,
}

/// Lay out `text` into a single mesh positioned around the anchor origin.
///
/// Characters missing from the face fall back to glyph 0 (`.notdef`); glyphs
/// without an outline (spaces) only advance the pen.
pub fn layout_text_to_mesh(
    face: &ResolvedFace,
    text: &str,
    opts: &TextLayoutOptions,
) -> Result<TextMesh, FontError> {
    let scale = face.font_units_to_px_scale(opts.em_height_px);
    if scale == 0.0 || !scale.is_finite() || text.is_empty() {
        return Ok(TextMesh::default());
    }

    let parsed = face.parse()?;

    // First pass: glyph ids and pen positions in font units.
    let mut glyphs: Vec<(u16, f32)> = Vec::with_capacity(text.len());
    let mut pen_fu = 0.0f32;
    for ch in text.chars().filter(|c| !c.is_control()) {
        let gid = match glyph_id_for_char(&parsed, ch) {
            Ok(gid) => gid,
            Err(FontError::MissingChar(_)) => 0,
            Err(e) => return Err(e),
        };
        glyphs.push((gid, pen_fu));
        pen_fu += glyph_h_metrics(&parsed, gid).advance_width;
    }

    let advance_width_px = pen_fu * scale;
    let x0 = align_offset_px(opts.align, advance_width_px);
    let baseline_y = baseline_offset_px(opts.anchor, &face.v_metrics, scale);

    let tess_opts = TessellateOptions {
        tolerance: (opts.tolerance_px / scale.abs()).max(0.0005),
        ..Default::default()
    };

    let mut tessellator = GlyphTessellator::new();
    let mut mesh = Mesh2D::default();
    for (gid, pen) in glyphs {
        let outline = match glyph_outline_path(&parsed, gid) {
            Ok(outline) => outline,
            Err(FontError::MissingGlyph { .. }) => continue,
            Err(e) => return Err(e),
        };
        let xf = Affine2x3::scale_flip_y_translate(scale, x0 + pen * scale, baseline_y);
        tessellator.append_path(&mut mesh, &outline, xf, tess_opts)?;
    }

    Ok(TextMesh {
        mesh,
        advance_width_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FontVMetrics {
        FontVMetrics {
            units_per_em: 1000.0,
            ascender: 800.0,
            descender: -200.0,
            line_gap: 0.0,
            cap_height: 700.0,
        }
    }

    #[test]
    fn cap_middle_puts_half_cap_height_above_origin() {
        // 50px em on a 1000 upm font: cap height is 35px, so the baseline sits 17.5px
        // below the origin and the cap line 17.5px above it.
        let scale = 50.0 / 1000.0;
        assert_eq!(
            baseline_offset_px(TextAnchor::CapMiddle, &metrics(), scale),
            17.5
        );
        assert_eq!(baseline_offset_px(TextAnchor::CapTop, &metrics(), scale), 35.0);
    }

    #[test]
    fn top_bottom_middle_anchors() {
        let m = metrics();
        assert_eq!(baseline_offset_px(TextAnchor::Baseline, &m, 0.1), 0.0);
        assert_eq!(baseline_offset_px(TextAnchor::Top, &m, 0.1), 80.0);
        assert_eq!(baseline_offset_px(TextAnchor::Bottom, &m, 0.1), -20.0);
        assert_eq!(baseline_offset_px(TextAnchor::Middle, &m, 0.1), 30.0);
    }

    #[test]
    fn negative_scale_mirrors_anchor() {
        let m = metrics();
        assert_eq!(
            baseline_offset_px(TextAnchor::CapMiddle, &m, -0.05),
            -baseline_offset_px(TextAnchor::CapMiddle, &m, 0.05)
        );
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(align_offset_px(TextAlign::Left, 90.0), 0.0);
        assert_eq!(align_offset_px(TextAlign::Center, 90.0), -45.0);
        assert_eq!(align_offset_px(TextAlign::Right, 90.0), -90.0);
    }

    #[test]
    fn zero_em_height_lays_out_nothing() {
        // No parse happens for a degenerate scale, so garbage bytes are fine here.
        let face = ResolvedFace {
            bytes: std::sync::Arc::from(vec![0u8; 4]),
            index: 0,
            v_metrics: metrics(),
        };
        let out = layout_text_to_mesh(
            &face,
            "AB1",
            &TextLayoutOptions {
                em_height_px: 0.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(out.mesh.is_empty());
        assert_eq!(out.advance_width_px, 0.0);
    }
}
