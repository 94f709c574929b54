//! The on-disk mind map document.
//!
//! A missing document is an empty map; anything else that fails to load is an
//! error and the file is left untouched.

use anyhow::{anyhow, Result};
use mindmap_core::{load_from_path, save_to_path, LayoutConfig, LayoutStrategy, MindMap};
use std::fs;
use std::path::Path;

pub fn open(path: &Path, strategy: LayoutStrategy) -> Result<MindMap> {
    let mut map = MindMap::with_layout(strategy, LayoutConfig::default());
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no document yet, starting empty");
        return Ok(map);
    }
    load_from_path(&mut map, path)
        .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), nodes = map.len(), "loaded document");
    Ok(map)
}

pub fn write(map: &MindMap, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    save_to_path(map, path).map_err(|e| anyhow!("failed to write {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let map = open(&dir.path().join("none.json"), LayoutStrategy::FlatGrid).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.strategy(), LayoutStrategy::FlatGrid);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/map.json");

        let mut map = MindMap::new();
        map.add_root("Root").unwrap();
        write(&map, &path).unwrap();

        let reopened = open(&path, LayoutStrategy::default()).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = open(&path, LayoutStrategy::default()).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }
}
