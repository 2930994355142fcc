//! Asset lifetime tracking
//!
//! Screens and levels receive an `AssetContext` explicitly and balance every
//! `load` with an `unload`. Paths are reference counted so two owners can
//! share an asset; it is released when the last one lets go.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Map,
    Music,
    Texture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AssetEntry {
    kind: AssetKind,
    refs: u32,
}

#[derive(Debug, Default)]
pub struct AssetContext {
    entries: BTreeMap<String, AssetEntry>,
}

impl AssetContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire an asset, returning its new reference count
    pub fn load(&mut self, path: &str, kind: AssetKind) -> u32 {
        let entry = self
            .entries
            .entry(path.to_string())
            .or_insert(AssetEntry { kind, refs: 0 });
        if entry.kind != kind {
            log::warn!("Asset {} loaded as {:?}, requested as {:?}", path, entry.kind, kind);
        }
        entry.refs += 1;
        if entry.refs == 1 {
            log::info!("Loaded {:?} asset {}", kind, path);
        }
        entry.refs
    }

    /// Release one reference. Returns true if the asset is now fully unloaded.
    pub fn unload(&mut self, path: &str) -> bool {
        let Some(entry) = self.entries.get_mut(path) else {
            log::debug!("Unload of {} which is not loaded", path);
            return false;
        };
        entry.refs -= 1;
        if entry.refs > 0 {
            return false;
        }
        self.entries.remove(path);
        log::info!("Unloaded asset {}", path);
        true
    }

    pub fn is_loaded(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn ref_count(&self, path: &str) -> u32 {
        self.entries.get(path).map(|e| e.refs).unwrap_or(0)
    }

    pub fn kind(&self, path: &str) -> Option<AssetKind> {
        self.entries.get(path).map(|e| e.kind)
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
    fn test_shared_asset_released_by_last_owner() {
        let mut assets = AssetContext::new();
        assert_eq!(assets.load("data/march.mp3", AssetKind::Music), 1);
        assert_eq!(assets.load("data/march.mp3", AssetKind::Music), 2);

        assert!(!assets.unload("data/march.mp3"));
        assert!(assets.is_loaded("data/march.mp3"));
        assert!(assets.unload("data/march.mp3"));
        assert!(!assets.is_loaded("data/march.mp3"));
        assert!(!assets.unload("data/march.mp3"));
        assert!(assets.is_empty());
    }
}
