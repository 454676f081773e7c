//! Font module root.
//!
//! Glyphs are rendered from **vector outlines**:
//! - Locate font bytes for a resource (system fonts via `fontdb`, a file, or memory).
//! - Parse metrics once (`ResolvedFace`) so layout can scale by em-height.
//! - Extract glyph outlines (move_to/line_to/quad_to/curve_to) via `ttf-parser`.
//! - Convert outlines to `lyon::path::Path` and tessellate into triangles.
//!
//! Submodules:
//! - `resource`: symbolic resource ids, sources, and font handles
//! - `tessellate`: lyon fill tessellation into `scene::Mesh2D`
//! - `text`: string layout at an em-height with alignment and anchoring

pub mod resource;
pub mod tessellate;
pub mod text;

use std::{fs, path::Path as FsPath, sync::Arc};

use fontdb::{Database, Family, Query, Style, Weight};
use lyon::math::point;
use lyon::path::Path;

use crate::font::resource::FontSource;

/// Simplified font style selection.
#[derive(Debug, Clone, Default)]
pub struct FontQuery {
    /// Preferred font family names, in priority order.
    /// Generic names (`serif`, `sans-serif`, `monospace`) are understood.
    pub families: Vec<String>,

    /// Weight in CSS-ish terms (100..900). 400 = regular, 700 = bold.
    pub weight: u16,

    /// Italic / oblique.
    pub italic: bool,
}

/// Vertical metrics needed for anchoring a line of text.
///
/// Values are in **font units** (units-per-em), y-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontVMetrics {
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
    /// Height of flat capital letters above the baseline.
    pub cap_height: f32,
}

impl FontVMetrics {
    pub fn default_for_upm(units_per_em: f32) -> Self {
        Self {
            units_per_em,
            ascender: 0.8 * units_per_em,
            descender: -0.2 * units_per_em,
            line_gap: 0.0,
            cap_height: 0.7 * units_per_em,
        }
    }
}

/// Per-glyph horizontal metrics, in font units.
#[derive(Debug, Copy, Clone, Default)]
pub struct GlyphHMetrics {
    pub advance_width: f32,
}

/// Font bytes plus the metrics parsed from them.
///
/// - `bytes` contains the full font file/collection.
/// - `index` selects the face within the collection.
#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub bytes: Arc<[u8]>,
    pub index: u32,
    pub v_metrics: FontVMetrics,
}

impl ResolvedFace {
    /// Parse `bytes` and read vertical metrics.
    pub fn from_bytes(bytes: Arc<[u8]>, index: u32) -> Result<Self, FontError> {
        let v_metrics = {
            let face = ttf_parser::Face::parse(&bytes, index).map_err(|_| FontError::ParseFailed)?;
            read_v_metrics(&face)
        };
        Ok(Self {
            bytes,
            index,
            v_metrics,
        })
    }

    #[inline]
    pub fn units_per_em(&self) -> f32 {
        self.v_metrics.units_per_em
    }

    /// Scale factor that maps font units to pixels for a given em-height.
    ///
    /// The em-height is passed through as-is: zero yields a degenerate scale and
    /// negative values mirror the geometry.
    #[inline]
    pub fn font_units_to_px_scale(&self, em_height_px: f32) -> f32 {
        em_height_px / self.v_metrics.units_per_em
    }

    /// Borrow a parsed `ttf_parser::Face` for glyph queries.
    pub fn parse(&self) -> Result<ttf_parser::Face<'_>, FontError> {
        ttf_parser::Face::parse(&self.bytes, self.index).map_err(|_| FontError::ParseFailed)
    }
}

fn read_v_metrics(face: &ttf_parser::Face<'_>) -> FontVMetrics {
    let units_per_em = face.units_per_em() as f32;
    if units_per_em <= 0.0 {
        return FontVMetrics::default_for_upm(1000.0);
    }

    // Prefer OS/2 typographic metrics, fall back to hhea.
    let asc = face
        .typographic_ascender()
        .unwrap_or_else(|| face.ascender()) as f32;
    let desc = face
        .typographic_descender()
        .unwrap_or_else(|| face.descender()) as f32;
    let gap = face
        .typographic_line_gap()
        .unwrap_or_else(|| face.line_gap()) as f32;

    // Older fonts lack OS/2 capHeight; measure 'H' instead.
    let cap = face
        .capital_height()
        .map(f32::from)
        .or_else(|| {
            face.glyph_index('H')
                .and_then(|gid| face.glyph_bounding_box(gid))
                .map(|bbox| bbox.y_max as f32)
        })
        .unwrap_or(0.7 * units_per_em);

    FontVMetrics {
        units_per_em,
        ascender: asc,
        descender: desc,
        line_gap: gap,
        cap_height: cap,
    }
}

/// Errors produced by the font subsystem.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found on this system")]
    NoFontsAvailable,

    #[error("failed to resolve a font face for query: {0:?}")]
    ResolveFailed(FontQuery),

    #[error("no source configured for resource {0:?}")]
    MissingResource(resource::ResourceId),

    #[error("failed to read font file from disk: {0}")]
    ReadFailed(String),

    #[error("failed to parse font face")]
    ParseFailed,

    #[error("glyph outline not found for glyph id {glyph_id}")]
    MissingGlyph { glyph_id: u16 },

    #[error("glyph not found for char {0:?}")]
    MissingChar(char),

    #[error("tessellation failed: {0}")]
    Tessellation(String),
}

/// Owns the system font database and turns `FontSource`s into `ResolvedFace`s.
pub struct FontSystem {
    db: Database,
}

impl FontSystem {
    /// Create a font system and load installed system fonts.
    ///
    /// An empty database is not an error here: file/byte sources still work.
    pub fn new() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        log::debug!("fontdb: {} system faces", db.len());
        Self { db }
    }

    /// A font system with no system fonts (only file/byte sources resolve).
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
        }
    }

    /// Load the face described by `source`.
    pub fn load(&self, source: &FontSource) -> Result<ResolvedFace, FontError> {
        match source {
            FontSource::Query(query) => self.resolve(query),
            FontSource::File(path) => ResolvedFace::from_bytes(read_font_bytes(path)?, 0),
            FontSource::Bytes(bytes) => ResolvedFace::from_bytes(bytes.clone(), 0),
        }
    }

    /// Resolve a `FontQuery` against the system database.
    ///
    /// Strategy:
    /// - Try the named families in order with the requested weight/style.
    /// - Fall back to generic `sans-serif`.
    /// - Fall back to the first face in the database.
    pub fn resolve(&self, query: &FontQuery) -> Result<ResolvedFace, FontError> {
        if self.db.is_empty() {
            return Err(FontError::NoFontsAvailable);
        }

        let style = if query.italic {
            Style::Italic
        } else {
            Style::Normal
        };
        let weight = Weight(query.weight.clamp(1, 1000));

        let mut families: Vec<Family<'_>> = Vec::new();
        for f in &query.families {
            let s = f.trim();
            if s.eq_ignore_ascii_case("serif") {
                families.push(Family::Serif);
            } else if s.eq_ignore_ascii_case("sans-serif") || s.eq_ignore_ascii_case("sans") {
                families.push(Family::SansSerif);
            } else if s.eq_ignore_ascii_case("monospace") || s.eq_ignore_ascii_case("mono") {
                families.push(Family::Monospace);
            } else if !s.is_empty() {
                families.push(Family::Name(s));
            }
        }

        let id = self
            .db
            .query(&Query {
                families: &families,
                weight,
                style,
                stretch: fontdb::Stretch::Normal,
            })
            .or_else(|| {
                self.db.query(&Query {
                    families: &[Family::SansSerif],
                    weight,
                    style,
                    stretch: fontdb::Stretch::Normal,
                })
            })
            .or_else(|| self.db.faces().next().map(|face| face.id))
            .ok_or_else(|| FontError::ResolveFailed(query.clone()))?;

        let (bytes, index) = self
            .db
            .with_face_data(id, |data, index| (Arc::<[u8]>::from(data), index))
            .ok_or_else(|| FontError::ResolveFailed(query.clone()))?;

        ResolvedFace::from_bytes(bytes, index)
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn read_font_bytes(path: &FsPath) -> Result<Arc<[u8]>, FontError> {
    let data = fs::read(path).map_err(|_| FontError::ReadFailed(path.display().to_string()))?;
    Ok(Arc::<[u8]>::from(data))
}

/// Glyph id for a Unicode codepoint.
pub fn glyph_id_for_char(face: &ttf_parser::Face<'_>, ch: char) -> Result<u16, FontError> {
    face.glyph_index(ch)
        .map(|gid| gid.0)
        .ok_or(FontError::MissingChar(ch))
}

/// Horizontal metrics for a glyph. Glyphs without an advance report zero.
pub fn glyph_h_metrics(face: &ttf_parser::Face<'_>, glyph_id: u16) -> GlyphHMetrics {
    let adv = face
        .glyph_hor_advance(ttf_parser::GlyphId(glyph_id))
        .unwrap_or(0) as f32;
    GlyphHMetrics { advance_width: adv }
}

/// Extract a glyph outline as a lyon `Path` in **font units** (y-up).
pub fn glyph_outline_path(face: &ttf_parser::Face<'_>, glyph_id: u16) -> Result<Path, FontError> {
    let mut builder = LyonOutlineBuilder::new();
    face.outline_glyph(ttf_parser::GlyphId(glyph_id), &mut builder)
        .ok_or(FontError::MissingGlyph { glyph_id })?;
    Ok(builder.build())
}

/// Converts `ttf-parser` outline callbacks into a `lyon::path::Path`.
///
/// A glyph may contain multiple contours; `move_to` starts a new one.
struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    contour_open: bool,
}

impl LyonOutlineBuilder {
    fn new() -> Self {
        Self {
            builder: Path::builder(),
            contour_open: false,
        }
    }

    fn build(mut self) -> Path {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(point(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(point(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quadratic_bezier_to(point(x1, y1), point(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder
            .cubic_bezier_to(point(x1, y1), point(x2, y2), point(x, y));
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttf_parser::OutlineBuilder as _;

    #[test]
    fn default_metrics_scale_with_upm() {
        let m = FontVMetrics::default_for_upm(2048.0);
        assert_eq!(m.ascender, 0.8 * 2048.0);
        assert!(m.cap_height < m.ascender);
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let bytes: Arc<[u8]> = Arc::from(vec![0u8; 16]);
        assert!(matches!(
            ResolvedFace::from_bytes(bytes, 0),
            Err(FontError::ParseFailed)
        ));
    }

    #[test]
    fn empty_system_cannot_resolve_queries() {
        let fonts = FontSystem::empty();
        let err = fonts.resolve(&FontQuery::default()).unwrap_err();
        assert!(matches!(err, FontError::NoFontsAvailable));
    }

    #[test]
    fn missing_file_reports_path() {
        let fonts = FontSystem::empty();
        let err = fonts
            .load(&FontSource::File("/nonexistent/font.ttf".into()))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn outline_builder_closes_each_contour() {
        let mut b = LyonOutlineBuilder::new();
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(10.0, 10.0);
        // Second contour without an explicit close on the first.
        b.move_to(20.0, 0.0);
        b.line_to(30.0, 0.0);
        b.line_to(30.0, 10.0);
        let path = b.build();

        let closes = path
            .iter()
            .filter(|e| matches!(e, lyon::path::Event::End { close: true, .. }))
            .count();
        assert_eq!(closes, 2);
    }
}
