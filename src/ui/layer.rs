//! Layer tree.
//!
//! Layers are rectangular surfaces arranged in a tree per window. They live in an
//! arena keyed by `LayerId`; parent/child links are ids, so destroying a layer
//! never leaves dangling references, only ids that no longer resolve.
//!
//! Two kinds exist:
//! - custom layers, painted by the window handler's `update_layer` once an update
//!   proc is installed
//! - text layers, which paint a background and one line of text themselves
//!
//! Dirty tracking: `mark_dirty` adds a layer to the dirty set; the paint pass
//! consumes a layer's flag right before painting it.

use std::collections::{BTreeMap, BTreeSet};

use crate::draw::TextAlign;
use crate::font::resource::{FontHandle, FontTable};
use crate::scene::Rgba;
use crate::ui::geometry::{Point, Rect};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(u32);

/// Default text layer font size (the small system label font).
pub const TEXT_LAYER_FONT_PX: f32 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayerState {
    pub text: String,
    pub font: FontHandle,
    pub size_px: f32,
    pub color: Rgba,
    pub background: Rgba,
    pub align: TextAlign,
}

impl Default for TextLayerState {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: FontTable::SYSTEM,
            size_px: TEXT_LAYER_FONT_PX,
            color: Rgba::BLACK,
            background: Rgba::WHITE,
            align: TextAlign::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Custom { has_update_proc: bool },
    Text(TextLayerState),
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub frame: Rect,
    pub kind: LayerKind,
    pub parent: Option<LayerId>,
    pub children: Vec<LayerId>,
}

#[derive(Debug, Default)]
pub struct LayerTree {
    layers: BTreeMap<LayerId, Layer>,
    next_id: u32,
    dirty: BTreeSet<LayerId>,
}

impl LayerTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, frame: Rect, kind: LayerKind) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.insert(
            id,
            Layer {
                frame,
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Create a detached custom layer with no update proc.
    pub fn create(&mut self, frame: Rect) -> LayerId {
        self.insert(
            frame,
            LayerKind::Custom {
                has_update_proc: false,
            },
        )
    }

    /// Create a detached text layer with default styling.
    pub fn create_text(&mut self, frame: Rect) -> LayerId {
        self.insert(frame, LayerKind::Text(TextLayerState::default()))
    }

    /// Route this layer's painting to the window handler.
    pub fn set_update_proc(&mut self, id: LayerId) {
        if let Some(Layer {
            kind: LayerKind::Custom { has_update_proc },
            ..
        }) = self.layers.get_mut(&id)
        {
            *has_update_proc = true;
        }
    }

    /// Append `child` as the topmost child of `parent`, detaching it first.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        if parent == child || !self.layers.contains_key(&parent) {
            return;
        }
        if !self.layers.contains_key(&child) {
            return;
        }
        self.remove_from_parent(child);
        if let Some(p) = self.layers.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.layers.get_mut(&child) {
            c.parent = Some(parent);
        }
        self.dirty.insert(child);
    }

    pub fn remove_from_parent(&mut self, id: LayerId) {
        let Some(parent) = self.layers.get_mut(&id).and_then(|l| l.parent.take()) else {
            return;
        };
        if let Some(p) = self.layers.get_mut(&parent) {
            p.children.retain(|&c| c != id);
        }
    }

    /// Destroy a layer: detach it from its parent and orphan its children.
    ///
    /// Returns false if the id was already gone.
    pub fn destroy(&mut self, id: LayerId) -> bool {
        if !self.layers.contains_key(&id) {
            return false;
        }
        self.remove_from_parent(id);
        let Some(layer) = self.layers.remove(&id) else {
            return false;
        };
        for child in layer.children {
            if let Some(c) = self.layers.get_mut(&child) {
                c.parent = None;
            }
        }
        self.dirty.remove(&id);
        true
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn frame(&self, id: LayerId) -> Option<Rect> {
        self.layers.get(&id).map(|l| l.frame)
    }

    /// Number of layers currently allocated (attached or not).
    pub fn live_count(&self) -> usize {
        self.layers.len()
    }

    /// Schedule a repaint of this layer. Unknown ids are ignored.
    pub fn mark_dirty(&mut self, id: LayerId) {
        if self.layers.contains_key(&id) {
            self.dirty.insert(id);
        }
    }

    pub fn is_dirty(&self, id: LayerId) -> bool {
        self.dirty.contains(&id)
    }

    pub fn any_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Clear and return the dirty flag of one layer.
    pub(crate) fn take_dirty(&mut self, id: LayerId) -> bool {
        self.dirty.remove(&id)
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Mark `root` and everything below it dirty.
    pub fn mark_subtree_dirty(&mut self, root: LayerId) {
        for (id, _) in self.paint_order(root) {
            self.dirty.insert(id);
        }
    }

    /// Depth-first, parent before children, children in insertion order.
    /// Each entry carries the layer's absolute origin.
    pub fn paint_order(&self, root: LayerId) -> Vec<(LayerId, Point)> {
        let mut out = Vec::new();
        let mut stack = vec![(root, Point::ZERO)];
        while let Some((id, parent_origin)) = stack.pop() {
            let Some(layer) = self.layers.get(&id) else {
                continue;
            };
            let origin = parent_origin + layer.frame.origin;
            out.push((id, origin));
            for &child in layer.children.iter().rev() {
                stack.push((child, origin));
            }
        }
        out
    }

    fn text_mut(&mut self, id: LayerId) -> Option<&mut TextLayerState> {
        match self.layers.get_mut(&id) {
            Some(Layer {
                kind: LayerKind::Text(state),
                ..
            }) => Some(state),
            _ => None,
        }
    }

    fn update_text(&mut self, id: LayerId, f: impl FnOnce(&mut TextLayerState)) {
        if let Some(state) = self.text_mut(id) {
            f(state);
            self.dirty.insert(id);
        }
    }

    pub fn set_text(&mut self, id: LayerId, text: &str) {
        self.update_text(id, |s| {
            s.text.clear();
            s.text.push_str(text);
        });
    }

    pub fn set_text_alignment(&mut self, id: LayerId, align: TextAlign) {
        self.update_text(id, |s| s.align = align);
    }

    pub fn set_text_color(&mut self, id: LayerId, color: Rgba) {
        self.update_text(id, |s| s.color = color);
    }

    pub fn set_background_color(&mut self, id: LayerId, color: Rgba) {
        self.update_text(id, |s| s.background = color);
    }

    pub fn set_font(&mut self, id: LayerId, font: FontHandle, size_px: f32) {
        self.update_text(id, |s| {
            s.font = font;
            s.size_px = size_px;
        });
    }

    pub fn text(&self, id: LayerId) -> Option<&str> {
        match self.layers.get(&id) {
            Some(Layer {
                kind: LayerKind::Text(state),
                ..
            }) => Some(state.text.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_order_is_depth_first_in_insertion_order() {
        let mut tree = LayerTree::new();
        let root = tree.create(Rect::new(0, 0, 144, 168));
        let a = tree.create(Rect::new(0, 0, 144, 168));
        let b = tree.create_text(Rect::new(0, 0, 144, 20));
        let a1 = tree.create(Rect::new(5, 6, 10, 10));
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.add_child(a, a1);

        let order: Vec<_> = tree.paint_order(root).into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![root, a, a1, b]);
    }

    #[test]
    fn origins_accumulate_down_the_tree() {
        let mut tree = LayerTree::new();
        let root = tree.create(Rect::new(0, 0, 100, 100));
        let a = tree.create(Rect::new(10, 20, 50, 50));
        let b = tree.create(Rect::new(1, 2, 5, 5));
        tree.add_child(root, a);
        tree.add_child(a, b);
        let order = tree.paint_order(root);
        assert_eq!(order[2], (b, Point::new(11, 22)));
    }

    #[test]
    fn destroy_detaches_and_frees() {
        let mut tree = LayerTree::new();
        let root = tree.create(Rect::new(0, 0, 10, 10));
        let child = tree.create(Rect::new(0, 0, 10, 10));
        tree.add_child(root, child);
        tree.mark_dirty(child);

        assert!(tree.destroy(child));
        assert!(!tree.destroy(child));
        assert_eq!(tree.live_count(), 1);
        assert!(tree.get(root).unwrap().children.is_empty());
        assert!(!tree.is_dirty(child));
    }

    #[test]
    fn re_adding_moves_the_child() {
        let mut tree = LayerTree::new();
        let p1 = tree.create(Rect::default());
        let p2 = tree.create(Rect::default());
        let c = tree.create(Rect::default());
        tree.add_child(p1, c);
        tree.add_child(p2, c);
        assert!(tree.get(p1).unwrap().children.is_empty());
        assert_eq!(tree.get(p2).unwrap().children, vec![c]);
        assert_eq!(tree.get(c).unwrap().parent, Some(p2));
    }

    #[test]
    fn text_setters_mark_dirty_and_ignore_custom_layers() {
        let mut tree = LayerTree::new();
        let label = tree.create_text(Rect::new(0, 0, 144, 20));
        let custom = tree.create(Rect::new(0, 0, 144, 168));

        tree.set_text(label, "50");
        tree.set_text(custom, "ignored");
        assert_eq!(tree.text(label), Some("50"));
        assert_eq!(tree.text(custom), None);
        assert!(tree.is_dirty(label));
        assert!(!tree.is_dirty(custom));
    }

    #[test]
    fn marking_unknown_layers_is_a_no_op() {
        let mut tree = LayerTree::new();
        let id = tree.create(Rect::default());
        tree.destroy(id);
        tree.mark_dirty(id);
        assert!(!tree.any_dirty());
    }

    #[test]
    fn style_setters_update_text_state() {
        let mut tree = LayerTree::new();
        let label = tree.create_text(Rect::new(0, 0, 144, 20));
        let mut fonts = FontTable::new();
        let font = fonts.create_from_resource(crate::font::resource::ResourceId::TestFont);

        tree.set_text_color(label, Rgba::WHITE);
        tree.set_background_color(label, Rgba::BLACK);
        tree.set_font(label, font, 18.0);

        let Some(Layer {
            kind: LayerKind::Text(state),
            ..
        }) = tree.get(label)
        else {
            panic!("label is a text layer");
        };
        assert_eq!(state.color, Rgba::WHITE);
        assert_eq!(state.background, Rgba::BLACK);
        assert_eq!(state.font, font);
        assert_eq!(state.size_px, 18.0);
    }
}
