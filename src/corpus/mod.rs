//! Corpus traversal
//!
//! A corpus is laid out as `<root>/<league>/<season>/<match>/`. The walker
//! only enumerates match directories; what happens inside a match is up to
//! the caller.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::DomainError;

/// Depth of match directories below the corpus root
const MATCH_DEPTH: usize = 3;

/// Enumerates match directories of a corpus
pub struct CorpusWalker {
    root: PathBuf,
    leagues: Vec<String>,
    seasons: Vec<String>,
    exclude: Option<PathBuf>,
}

impl CorpusWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            leagues: Vec::new(),
            seasons: Vec::new(),
            exclude: None,
        }
    }

    /// Restrict the walk to these leagues and seasons; empty lists mean all
    pub fn with_selection(mut self, leagues: Vec<String>, seasons: Vec<String>) -> Self {
        self.leagues = leagues;
        self.seasons = seasons;
        self
    }

    /// Skip a subtree, typically the output root when it lives inside the corpus
    pub fn excluding(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude = Some(path.into());
        self
    }

    /// Match directories in sorted order
    pub fn match_dirs(&self) -> Result<Vec<PathBuf>, DomainError> {
        if !self.root.is_dir() {
            return Err(DomainError::FileNotFound(format!(
                "Corpus root is not a directory: {}",
                self.root.display()
            )));
        }

        let mut matches = Vec::new();
        for season_dir in self.season_dirs()? {
            for entry in WalkDir::new(&season_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| DomainError::FsFail(e.to_string()))?;
                if entry.file_type().is_dir() && !self.is_excluded(entry.path()) {
                    matches.push(entry.into_path());
                }
            }
        }

        debug!(root = %self.root.display(), count = matches.len(), "Enumerated match directories");
        Ok(matches)
    }

    /// `<league>/<season>` directories to visit
    fn season_dirs(&self) -> Result<Vec<PathBuf>, DomainError> {
        if self.leagues.is_empty() && self.seasons.is_empty() {
            let mut dirs = Vec::new();
            for entry in WalkDir::new(&self.root)
                .min_depth(MATCH_DEPTH - 1)
                .max_depth(MATCH_DEPTH - 1)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !self.is_excluded(entry.path()))
            {
                let entry = entry.map_err(|e| DomainError::FsFail(e.to_string()))?;
                if entry.file_type().is_dir() {
                    dirs.push(entry.into_path());
                }
            }
            return Ok(dirs);
        }

        let leagues = if self.leagues.is_empty() {
            Self::child_names(&self.root)?
        } else {
            self.leagues.clone()
        };

        let mut dirs = Vec::new();
        for league in &leagues {
            let league_dir = self.root.join(league);
            let seasons = if self.seasons.is_empty() {
                if !league_dir.is_dir() {
                    warn!(league = %league, "League directory not found, skipping");
                    continue;
                }
                Self::child_names(&league_dir)?
            } else {
                self.seasons.clone()
            };

            for season in &seasons {
                let season_dir = league_dir.join(season);
                if season_dir.is_dir() {
                    dirs.push(season_dir);
                } else {
                    warn!(league = %league, season = %season, "Season directory not found, skipping");
                }
            }
        }
        Ok(dirs)
    }

    fn child_names(dir: &Path) -> Result<Vec<String>, DomainError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| DomainError::FsFail(e.to_string()))?;
            if entry.file_type().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude
            .as_deref()
            .map_or(false, |excluded| path.starts_with(excluded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        for path in [
            "england_epl/2015-2016/2015-08-08 - Chelsea 2 - 2 Swansea",
            "england_epl/2015-2016/2015-08-16 - Manchester City 3 - 0 Chelsea",
            "england_epl/2016-2017/2016-08-14 - Arsenal 3 - 4 Liverpool",
            "spain_laliga/2016-2017/2016-08-20 - Barcelona 6 - 2 Betis",
        ] {
            std::fs::create_dir_all(dir.path().join(path)).unwrap();
        }
        std::fs::write(dir.path().join("england_epl/2015-2016/notes.txt"), "x").unwrap();
        dir
    }

    fn names(dirs: &[PathBuf]) -> Vec<String> {
        dirs.iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_walks_every_match_sorted() {
        let dir = corpus();
        let matches = CorpusWalker::new(dir.path()).match_dirs().unwrap();
        assert_eq!(
            names(&matches),
            vec![
                "2015-08-08 - Chelsea 2 - 2 Swansea",
                "2015-08-16 - Manchester City 3 - 0 Chelsea",
                "2016-08-14 - Arsenal 3 - 4 Liverpool",
                "2016-08-20 - Barcelona 6 - 2 Betis",
            ]
        );
    }

    #[test]
    fn test_selection_and_missing_combinations() {
        let dir = corpus();
        let matches = CorpusWalker::new(dir.path())
            .with_selection(
                vec!["england_epl".to_string(), "italy_serie-a".to_string()],
                vec!["2016-2017".to_string()],
            )
            .match_dirs()
            .unwrap();
        assert_eq!(names(&matches), vec!["2016-08-14 - Arsenal 3 - 4 Liverpool"]);
    }

    #[test]
    fn test_seasons_only_applies_to_every_league() {
        let dir = corpus();
        let matches = CorpusWalker::new(dir.path())
            .with_selection(vec![], vec!["2016-2017".to_string()])
            .match_dirs()
            .unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_output_root_inside_corpus_is_skipped() {
        let dir = corpus();
        let output = dir.path().join("Extracted_Events");
        std::fs::create_dir_all(output.join("Corner").join("nested")).unwrap();

        let matches = CorpusWalker::new(dir.path())
            .excluding(&output)
            .match_dirs()
            .unwrap();
        assert_eq!(matches.len(), 4);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = CorpusWalker::new(dir.path().join("Dataset")).match_dirs();
        assert!(matches!(result, Err(DomainError::FileNotFound(_))));
    }
}
