//! Output routing
//!
//! Maps `(category, file name)` to a destination under the output root and
//! keeps the names handed out during a run, so two distinct targets that
//! happen to share a name never overwrite each other.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::domain::errors::DomainError;

/// Routes artifacts into `<output_root>/<category>/`
pub struct OutputRouter {
    root: PathBuf,
    claimed: Mutex<HashMap<PathBuf, HashSet<String>>>,
}

impl OutputRouter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            claimed: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory artifacts of `category` are written to
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(sanitize_category(category))
    }

    /// Claim a destination for `file_name`, creating the category directory.
    ///
    /// A name already claimed in this run gets a `_<n>` suffix before its
    /// extension. Files left by earlier runs are overwritten.
    pub fn route(&self, category: &str, file_name: &str) -> Result<PathBuf, DomainError> {
        let dir = self.category_dir(category);
        std::fs::create_dir_all(&dir).map_err(|e| {
            DomainError::FsFail(format!("Failed to create directory {}: {}", dir.display(), e))
        })?;

        let mut claimed = self
            .claimed
            .lock()
            .map_err(|_| DomainError::InternalError("output router lock poisoned".to_string()))?;
        let names = claimed.entry(dir.clone()).or_default();

        let mut candidate = file_name.to_string();
        let mut sequence = 1;
        while names.contains(&candidate) {
            candidate = with_suffix(file_name, sequence);
            sequence += 1;
        }
        if candidate != file_name {
            debug!(original = file_name, renamed = %candidate, "Name already used in this run");
        }
        names.insert(candidate.clone());

        Ok(dir.join(candidate))
    }

    /// Give back a claimed destination whose artifact was never written
    pub fn release(&self, path: &Path) {
        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        if let Ok(mut claimed) = self.claimed.lock() {
            if let Some(names) = claimed.get_mut(dir) {
                names.remove(&*name.to_string_lossy());
            }
        }
    }
}

/// `clip_58-64.mp4` + 2 -> `clip_58-64_2.mp4`
fn with_suffix(file_name: &str, sequence: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{}_{}.{}", stem, sequence, extension),
        _ => format!("{}_{}", file_name, sequence),
    }
}

/// Categories become a single directory level below the root
fn sanitize_category(category: &str) -> String {
    let name: String = category
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    // "", "." and ".." would resolve to the root or its parent
    if name.chars().all(|c| c == '.') {
        return "_".repeat(name.len().max(1));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_route_creates_category_directory() {
        let dir = TempDir::new().unwrap();
        let router = OutputRouter::new(dir.path().join("Extracted_Events"));

        let path = router.route("Corner", "frame750.jpg").unwrap();
        assert_eq!(path, dir.path().join("Extracted_Events").join("Corner").join("frame750.jpg"));
        assert!(path.parent().unwrap().is_dir());

        // idempotent directory creation
        router.route("Corner", "frame751.jpg").unwrap();
    }

    #[test]
    fn test_repeated_name_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let router = OutputRouter::new(dir.path());

        let first = router.route("Corner", "clip_58-64.mp4").unwrap();
        let second = router.route("Corner", "clip_58-64.mp4").unwrap();
        let third = router.route("Corner", "clip_58-64.mp4").unwrap();

        assert_eq!(first.file_name().unwrap(), "clip_58-64.mp4");
        assert_eq!(second.file_name().unwrap(), "clip_58-64_1.mp4");
        assert_eq!(third.file_name().unwrap(), "clip_58-64_2.mp4");
    }

    #[test]
    fn test_same_name_in_other_category_is_free() {
        let dir = TempDir::new().unwrap();
        let router = OutputRouter::new(dir.path());

        let corner = router.route("Corner", "frame10.jpg").unwrap();
        let penalty = router.route("Penalty", "frame10.jpg").unwrap();
        assert_eq!(corner.file_name(), penalty.file_name());
        assert_ne!(corner, penalty);
    }

    #[test]
    fn test_release_frees_name() {
        let dir = TempDir::new().unwrap();
        let router = OutputRouter::new(dir.path());

        let path = router.route("Goal", "frame5.jpg").unwrap();
        router.release(&path);
        assert_eq!(router.route("Goal", "frame5.jpg").unwrap(), path);
    }

    #[test]
    fn test_existing_files_are_overwritten_not_renamed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Goal")).unwrap();
        std::fs::write(dir.path().join("Goal").join("frame5.jpg"), b"old").unwrap();

        let router = OutputRouter::new(dir.path());
        assert_eq!(
            router.route("Goal", "frame5.jpg").unwrap(),
            dir.path().join("Goal").join("frame5.jpg")
        );
    }

    #[test]
    fn test_suffix_and_sanitize() {
        assert_eq!(with_suffix("frame3.jpg", 1), "frame3_1.jpg");
        assert_eq!(with_suffix("noext", 4), "noext_4");
        assert_eq!(sanitize_category("Shots on/off target"), "Shots on_off target");
        assert_eq!(sanitize_category("Ball out of play"), "Ball out of play");
        assert_eq!(sanitize_category("..."), "___");
    }

    #[test]
    fn test_dot_categories_stay_inside_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let router = OutputRouter::new(&root);

        for category in ["..", ".", "", "../.."] {
            let path = router.route(category, "frame1.jpg").unwrap();
            let category_dir = path.parent().unwrap();
            assert_eq!(category_dir.parent().unwrap(), root, "category {:?}", category);
            assert_ne!(category_dir, root);
            assert!(!category_dir.file_name().unwrap().to_string_lossy().chars().all(|c| c == '.'));
        }
        assert_eq!(router.category_dir(".."), root.join("__"));
    }
}
