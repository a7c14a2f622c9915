use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::loader::{LoadReport, load_folder};

/// Folder-mode loads memoized by path.
///
/// Entries live until [`FolderCache::invalidate`] is called for their path;
/// there is no expiry.
#[derive(Debug, Default)]
pub struct FolderCache {
    entries: HashMap<PathBuf, LoadReport>,
}

impl FolderCache {
    /// Return the memoized report for `path`, loading it on first use.
    pub fn get_or_load(&mut self, path: &Path) -> LoadReport {
        if let Some(hit) = self.entries.get(path) {
            log::debug!("Folder cache hit for {}", path.display());
            return hit.clone();
        }
        let report = load_folder(path);
        self.entries.insert(path.to_path_buf(), report.clone());
        report
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
