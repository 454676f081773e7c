//! Frame -> draw items.
//!
//! Turns the `DrawCommand`s a paint pass recorded into solid-fill `DrawItem2D`s in
//! display pixels (y-down, origin top-left). Font handles are resolved lazily here:
//! `FontTable` maps a handle to a `ResourceId`, the `ResourceTable` maps that id to a
//! `FontSource`, and `FontSystem::load` produces the face. Faces and laid-out
//! strings are cached across frames.
//!
//! Failures never abort a frame: a font that cannot be loaded, or a string that
//! fails to tessellate, is logged and skipped.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::draw::{DrawCommand, Frame, GlyphRun, TextAlign, TextAnchor};
use crate::font::resource::{FontHandle, FontTable, ResourceId, ResourceTable};
use crate::font::text::{TextLayoutOptions, TextMesh, layout_text_to_mesh};
use crate::font::{FontError, FontSystem, ResolvedFace};
use crate::scene::{Affine2, DrawItem2D, Mesh2D, Rgba};
use crate::ui::geometry::Rect;

/// Laid-out strings kept before the cache is flushed.
const LAYOUT_CACHE_LIMIT: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    resource: ResourceId,
    text: String,
    em_bits: u32,
    align: TextAlign,
    anchor: TextAnchor,
}

pub struct Rasterizer {
    fonts: FontSystem,
    resources: ResourceTable,
    faces: HashMap<ResourceId, Option<ResolvedFace>>,
    layouts: HashMap<LayoutKey, TextMesh>,
    tolerance_px: f32,
}

impl Rasterizer {
    pub fn new(fonts: FontSystem, resources: ResourceTable) -> Self {
        Self {
            fonts,
            resources,
            faces: HashMap::new(),
            layouts: HashMap::new(),
            tolerance_px: 0.1,
        }
    }

    /// Curve flattening tolerance in display pixels.
    pub fn with_tolerance_px(mut self, tolerance_px: f32) -> Self {
        self.tolerance_px = tolerance_px.max(0.001);
        self.layouts.clear();
        self
    }

    /// Load faces up front so the first frame does not stall on font IO.
    ///
    /// Returns how many of `ids` resolved.
    pub fn preload(&mut self, ids: &[ResourceId]) -> usize {
        ids.iter()
            .filter(|&&id| self.ensure_face(id).is_some())
            .count()
    }

    /// Whether the face behind `id` loaded. Loads it if it was never requested.
    pub fn has_face(&mut self, id: ResourceId) -> bool {
        self.ensure_face(id).is_some()
    }

    fn ensure_face(&mut self, id: ResourceId) -> Option<&ResolvedFace> {
        if !self.faces.contains_key(&id) {
            let loaded = match self.load_face(id) {
                Ok(face) => {
                    info!(
                        "font {:?}: {} bytes, {} units/em",
                        id,
                        face.bytes.len(),
                        face.units_per_em()
                    );
                    Some(face)
                }
                Err(err) => {
                    warn!("font {:?} unavailable: {}", id, err);
                    None
                }
            };
            self.faces.insert(id, loaded);
        }
        self.faces.get(&id).and_then(Option::as_ref)
    }

    fn load_face(&self, id: ResourceId) -> Result<ResolvedFace, FontError> {
        let source = self
            .resources
            .source(id)
            .ok_or(FontError::MissingResource(id))?;
        self.fonts.load(source)
    }

    /// Lay out one line, or `None` if the font is missing or layout failed.
    fn layout(
        &mut self,
        resource: ResourceId,
        text: &str,
        em_height_px: f32,
        align: TextAlign,
        anchor: TextAnchor,
    ) -> Option<TextMesh> {
        let key = LayoutKey {
            resource,
            text: text.to_string(),
            em_bits: em_height_px.to_bits(),
            align,
            anchor,
        };
        if let Some(hit) = self.layouts.get(&key) {
            return Some(hit.clone());
        }

        self.ensure_face(resource)?;
        let face = self.faces.get(&resource).and_then(Option::as_ref)?;
        let opts = TextLayoutOptions {
            em_height_px,
            align,
            anchor,
            tolerance_px: self.tolerance_px,
        };
        let laid_out = match layout_text_to_mesh(face, text, &opts) {
            Ok(mesh) => mesh,
            Err(err) => {
                warn!("layout of {:?} at {}px failed: {}", text, em_height_px, err);
                return None;
            }
        };

        if self.layouts.len() >= LAYOUT_CACHE_LIMIT {
            debug!("layout cache full; flushing {} entries", self.layouts.len());
            self.layouts.clear();
        }
        self.layouts.insert(key, laid_out.clone());
        Some(laid_out)
    }

    fn resource_for(fonts: &FontTable, font: FontHandle) -> Option<ResourceId> {
        let resource = fonts.resource(font);
        if resource.is_none() {
            warn!("unknown font handle {:?}", font);
        }
        resource
    }

    /// Convert one frame into draw items in painter's order.
    ///
    /// The window background comes first; layers follow in the order they painted.
    pub fn rasterize(&mut self, frame: &Frame, fonts: &FontTable) -> Vec<DrawItem2D> {
        let mut out = Vec::new();
        let mut z = 0;
        let mut push = |out: &mut Vec<DrawItem2D>, mesh: Mesh2D, fill: Rgba, xf: Affine2| {
            if mesh.is_empty() || fill.is_clear() {
                return;
            }
            out.push(DrawItem2D {
                mesh,
                fill,
                world_from_local: xf,
                z,
            });
            z += 1;
        };

        let slide = Affine2::translate(frame.offset_x, 0.0);
        push(
            &mut out,
            Mesh2D::rect(
                0.0,
                0.0,
                frame.size.width as f32,
                frame.size.height as f32,
            ),
            frame.background,
            slide,
        );

        for layer in &frame.layers {
            let layer_xf =
                slide.mul(Affine2::translate(layer.origin.x as f32, layer.origin.y as f32));

            for command in &layer.commands {
                match command {
                    DrawCommand::FillRect { rect, color } => {
                        push(&mut out, rect_mesh(*rect), *color, layer_xf);
                    }
                    DrawCommand::Text {
                        text,
                        font,
                        size_px,
                        color,
                        rect,
                        align,
                    } => {
                        let Some(resource) = Self::resource_for(fonts, *font) else {
                            continue;
                        };
                        let Some(laid_out) =
                            self.layout(resource, text, *size_px, *align, TextAnchor::Top)
                        else {
                            continue;
                        };
                        let (ax, ay) = text_anchor_in_rect(*rect, *align);
                        push(
                            &mut out,
                            laid_out.mesh,
                            *color,
                            layer_xf.mul(Affine2::translate(ax, ay)),
                        );
                    }
                    DrawCommand::Fill { color, runs } => {
                        for run in runs {
                            let Some(resource) = Self::resource_for(fonts, run.font) else {
                                continue;
                            };
                            let Some(laid_out) = self.layout(
                                resource,
                                &run.text,
                                run.em_height as f32,
                                run.align,
                                run.anchor,
                            ) else {
                                continue;
                            };
                            push(&mut out, laid_out.mesh, *color, layer_xf.mul(run_transform(run)));
                        }
                    }
                }
            }
        }

        out
    }
}

fn rect_mesh(rect: Rect) -> Mesh2D {
    Mesh2D::rect(
        rect.origin.x as f32,
        rect.origin.y as f32,
        rect.size.width as f32,
        rect.size.height as f32,
    )
}

/// Text layer origin: top edge of `rect`, at the side `align` names.
fn text_anchor_in_rect(rect: Rect, align: TextAlign) -> (f32, f32) {
    let x = rect.origin.x as f32;
    let w = rect.size.width as f32;
    let ax = match align {
        TextAlign::Left => x,
        TextAlign::Center => x + 0.5 * w,
        TextAlign::Right => x + w,
    };
    (ax, rect.origin.y as f32)
}

/// Moves the run's pivot onto its offset.
fn run_transform(run: &GlyphRun) -> Affine2 {
    Affine2::translate(run.offset.x - run.pivot.x, run.offset.y - run.pivot.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{FPoint, LayerPaint};
    use crate::ui::geometry::{Point, Size};
    use crate::ui::layer::LayerTree;

    fn offline() -> Rasterizer {
        Rasterizer::new(FontSystem::empty(), ResourceTable::default())
    }

    fn frame(offset_x: f32, commands: Vec<DrawCommand>) -> Frame {
        Frame {
            size: Size::new(144, 168),
            background: Rgba::WHITE,
            offset_x,
            layers: vec![LayerPaint {
                layer: LayerTree::new().create(Rect::new(0, 0, 144, 168)),
                origin: Point::new(0, 10),
                commands,
            }],
        }
    }

    #[test]
    fn background_and_rects_become_items_in_order() {
        let mut r = offline();
        let f = frame(
            0.0,
            vec![DrawCommand::FillRect {
                rect: Rect::new(2, 3, 10, 20),
                color: Rgba::BLACK,
            }],
        );
        let items = r.rasterize(&f, &FontTable::new());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].fill, Rgba::WHITE);
        assert_eq!(items[0].z, 0);
        assert_eq!(items[1].fill, Rgba::BLACK);
        assert_eq!(items[1].z, 1);

        let (x, y) = items[1]
            .world_from_local
            .transform_point(items[1].mesh.positions[0][0], items[1].mesh.positions[0][1]);
        assert_eq!((x, y), (2.0, 13.0), "layer origin is applied");
    }

    #[test]
    fn slide_offset_moves_everything() {
        let mut r = offline();
        let items = r.rasterize(&frame(144.0, vec![]), &FontTable::new());
        let (x, _) = items[0].world_from_local.transform_point(0.0, 0.0);
        assert_eq!(x, 144.0);
    }

    #[test]
    fn missing_fonts_skip_text_without_failing() {
        let mut r = offline();
        let mut fonts = FontTable::new();
        let font = fonts.create_from_resource(ResourceId::TestFont);
        let f = frame(
            0.0,
            vec![DrawCommand::Fill {
                color: Rgba::BLACK,
                runs: vec![GlyphRun {
                    text: "AB1".into(),
                    font,
                    em_height: 50,
                    em_font: Some(font),
                    pivot: FPoint::ZERO,
                    offset: FPoint::new(72.0, 84.0),
                    align: TextAlign::Center,
                    anchor: TextAnchor::CapMiddle,
                }],
            }],
        );
        let items = r.rasterize(&f, &fonts);
        assert_eq!(items.len(), 1, "only the background survives");
        assert!(!r.has_face(ResourceId::TestFont));
        assert_eq!(r.preload(&[ResourceId::TestFont, ResourceId::SystemLabel]), 0);
    }

    #[test]
    fn run_transform_maps_pivot_onto_offset() {
        let run = GlyphRun {
            text: String::new(),
            font: FontTable::SYSTEM,
            em_height: 10,
            em_font: None,
            pivot: FPoint::new(5.0, 5.0),
            offset: FPoint::new(72.0, 84.0),
            align: TextAlign::Left,
            anchor: TextAnchor::Baseline,
        };
        assert_eq!(run_transform(&run).transform_point(5.0, 5.0), (72.0, 84.0));
    }

    #[test]
    fn text_anchor_follows_alignment() {
        let rect = Rect::new(0, 0, 144, 20);
        assert_eq!(text_anchor_in_rect(rect, TextAlign::Left), (0.0, 0.0));
        assert_eq!(text_anchor_in_rect(rect, TextAlign::Center), (72.0, 0.0));
        assert_eq!(text_anchor_in_rect(rect, TextAlign::Right), (144.0, 0.0));
    }

    #[test]
    fn glyphs_from_a_system_font_are_centered_on_the_offset() {
        let mut r = Rasterizer::new(FontSystem::new(), ResourceTable::default())
            .with_tolerance_px(0.25);
        if !r.has_face(ResourceId::TestFont) {
            // No installed fonts on this machine.
            return;
        }
        let mut fonts = FontTable::new();
        let font = fonts.create_from_resource(ResourceId::TestFont);
        let mut f = frame(
            0.0,
            vec![DrawCommand::Fill {
                color: Rgba::BLACK,
                runs: vec![GlyphRun {
                    text: "AB1".into(),
                    font,
                    em_height: 50,
                    em_font: Some(font),
                    pivot: FPoint::ZERO,
                    offset: FPoint::new(72.0, 84.0),
                    align: TextAlign::Center,
                    anchor: TextAnchor::CapMiddle,
                }],
            }],
        );
        f.layers[0].origin = Point::ZERO;

        let items = r.rasterize(&f, &fonts);
        assert_eq!(items.len(), 2);
        let glyphs = &items[1];
        let b = glyphs.mesh.bounds();
        let (cx, _) = glyphs
            .world_from_local
            .transform_point(b.center()[0], b.center()[1]);
        assert!((cx - 72.0).abs() < 6.0, "glyphs centered near x=72, got {cx}");
    }

    /// World-space bounds of "AB1" centered on (72, 84) at `em_height`, or
    /// `None` when nothing but the background was drawn.
    fn ab1_bounds(r: &mut Rasterizer, em_height: i32) -> Option<([f32; 2], [f32; 2])> {
        let mut fonts = FontTable::new();
        let font = fonts.create_from_resource(ResourceId::TestFont);
        let mut f = frame(
            0.0,
            vec![DrawCommand::Fill {
                color: Rgba::BLACK,
                runs: vec![GlyphRun {
                    text: "AB1".into(),
                    font,
                    em_height,
                    em_font: Some(font),
                    pivot: FPoint::ZERO,
                    offset: FPoint::new(72.0, 84.0),
                    align: TextAlign::Center,
                    anchor: TextAnchor::CapMiddle,
                }],
            }],
        );
        f.layers[0].origin = Point::ZERO;

        let items = r.rasterize(&f, &fonts);
        let glyphs = items.get(1)?;
        let b = glyphs.mesh.bounds();
        let (x0, y0) = glyphs.world_from_local.transform_point(b.min[0], b.min[1]);
        let (x1, y1) = glyphs.world_from_local.transform_point(b.max[0], b.max[1]);
        Some(([x0, y0], [x1, y1]))
    }

    #[test]
    fn negative_em_height_mirrors_glyphs_through_the_anchor() {
        let mut r = Rasterizer::new(FontSystem::new(), ResourceTable::default())
            .with_tolerance_px(0.25);
        if !r.has_face(ResourceId::TestFont) {
            return;
        }
        let (min, max) = ab1_bounds(&mut r, 50).expect("upright glyphs");
        let (nmin, nmax) = ab1_bounds(&mut r, -50).expect("mirrored glyphs");

        let mid_y = 0.5 * (min[1] + max[1]);
        assert!((mid_y - 84.0).abs() < 1.5, "cap middle sits on y=84, got {mid_y}");

        // Reflection through (72, 84): p -> (144 - x, 168 - y).
        let close = |a: f32, b: f32| (a - b).abs() < 0.5;
        assert!(close(nmin[0], 144.0 - max[0]), "{nmin:?} vs {max:?}");
        assert!(close(nmin[1], 168.0 - max[1]), "{nmin:?} vs {max:?}");
        assert!(close(nmax[0], 144.0 - min[0]), "{nmax:?} vs {min:?}");
        assert!(close(nmax[1], 168.0 - min[1]), "{nmax:?} vs {min:?}");

        assert_eq!(ab1_bounds(&mut r, 0), None, "zero em draws nothing");
    }
}
