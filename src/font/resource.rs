//! Bundled font resources and the handles that refer to them.
//!
//! Resources are addressed by a build-time symbolic id (`ResourceId`). A
//! `ResourceTable` says where the bytes for each id come from; the rasterizer
//! resolves them through `FontSystem::load`. Application code never touches
//! bytes: it asks the host's `FontTable` for a `FontHandle` and passes that
//! handle into draw calls.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use crate::font::FontQuery;

/// Symbolic identifiers of the fonts this program ships with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceId {
    /// The vector font exercised by the demo.
    TestFont,
    /// Font used by text layers (the size label).
    SystemLabel,
}

/// Where the bytes for a resource come from.
#[derive(Debug, Clone)]
pub enum FontSource {
    /// Resolve against installed system fonts.
    Query(FontQuery),
    /// Read a TTF/OTF file from disk (face index 0).
    File(PathBuf),
    /// In-memory font data (face index 0).
    Bytes(Arc<[u8]>),
}

/// Resource id -> source mapping.
#[derive(Debug, Clone)]
pub struct ResourceTable {
    sources: BTreeMap<ResourceId, FontSource>,
}

impl Default for ResourceTable {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            ResourceId::TestFont,
            FontSource::Query(FontQuery {
                families: vec![
                    "DejaVu Sans".to_string(),
                    "Helvetica".to_string(),
                    "Arial".to_string(),
                    "sans-serif".to_string(),
                ],
                weight: 700,
                italic: false,
            }),
        );
        sources.insert(
            ResourceId::SystemLabel,
            FontSource::Query(FontQuery {
                families: vec!["sans-serif".to_string()],
                weight: 400,
                italic: false,
            }),
        );
        Self { sources }
    }
}

impl ResourceTable {
    /// Replace the source for one resource.
    pub fn with_source(mut self, id: ResourceId, source: FontSource) -> Self {
        self.sources.insert(id, source);
        self
    }

    pub fn source(&self, id: ResourceId) -> Option<&FontSource> {
        self.sources.get(&id)
    }
}

/// Opaque handle to a loaded font.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontHandle(u32);

/// Fonts registered with a host, in creation order.
///
/// Handles are never invalidated; fonts live as long as the table, which is
/// until process teardown. There is no unload: a window pushed again after a
/// pop registers a fresh handle and the earlier one stays resolvable.
#[derive(Debug, Clone)]
pub struct FontTable {
    entries: Vec<ResourceId>,
}

impl Default for FontTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FontTable {
    /// Handle of the font text layers use unless told otherwise.
    pub const SYSTEM: FontHandle = FontHandle(0);

    pub fn new() -> Self {
        Self {
            entries: vec![ResourceId::SystemLabel],
        }
    }

    /// Register a font backed by a bundled resource. Always appends, even when
    /// `id` is already registered.
    pub fn create_from_resource(&mut self, id: ResourceId) -> FontHandle {
        let handle = FontHandle(self.entries.len() as u32);
        self.entries.push(id);
        log::debug!("font {:?} created from resource {:?}", handle, id);
        handle
    }

    pub fn resource(&self, handle: FontHandle) -> Option<ResourceId> {
        self.entries.get(handle.0 as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_font_is_preregistered() {
        let fonts = FontTable::new();
        assert_eq!(fonts.resource(FontTable::SYSTEM), Some(ResourceId::SystemLabel));
        assert_eq!(fonts.len(), 1);
    }

    #[test]
    fn handles_map_back_to_their_resource() {
        let mut fonts = FontTable::new();
        let a = fonts.create_from_resource(ResourceId::TestFont);
        let b = fonts.create_from_resource(ResourceId::TestFont);
        assert_ne!(a, b);
        assert_eq!(fonts.resource(a), Some(ResourceId::TestFont));
        assert_eq!(fonts.resource(b), Some(ResourceId::TestFont));
    }

    #[test]
    fn default_table_covers_every_resource() {
        let table = ResourceTable::default();
        assert!(table.source(ResourceId::TestFont).is_some());
        assert!(table.source(ResourceId::SystemLabel).is_some());
    }

    #[test]
    fn with_source_overrides() {
        let table = ResourceTable::default()
            .with_source(ResourceId::TestFont, FontSource::File("/tmp/x.ttf".into()));
        assert!(matches!(
            table.source(ResourceId::TestFont),
            Some(FontSource::File(_))
        ));
    }
}
