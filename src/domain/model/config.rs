// Extraction configuration - explicit run settings passed into the core

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{ExtractionMode, HalfPair, Window, WindowTable};
use crate::domain::errors::DomainError;

/// Name of the output directory created under the corpus root when no output root is given
pub const DEFAULT_OUTPUT_DIR: &str = "Extracted_Events";

/// Everything a run needs to know; loaded from TOML and overridden from the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Root of the league/season/match tree
    pub corpus_root: PathBuf,
    /// Where artifacts are written (`<corpus_root>/Extracted_Events` when unset)
    pub output_root: Option<PathBuf>,
    /// League directories to visit; empty means all
    pub leagues: Vec<String>,
    /// Season directories to visit inside each league; empty means all
    pub seasons: Vec<String>,
    /// Annotation file name inside each match directory
    pub annotation_file: String,
    /// Video file names for the first and second half
    pub half_files: [String; 2],
    /// Annotation field holding the category (`label`, `change_type`, ...)
    pub label_field: String,
    /// Category value to extract, e.g. `"Corner"`
    pub event: Option<String>,
    pub mode: ExtractionMode,
    /// Window table key for clip extraction; falls back to the event name
    pub window: Option<String>,
    /// Explicit window that bypasses the table
    pub custom_window: Option<Window>,
    pub windows: WindowTable,
    pub encoding: EncodingConfig,
}

/// Output encoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub image_extension: String,
    pub clip_extension: String,
    /// Encoder name as known to libavcodec
    pub video_codec: String,
    pub preset: String,
    /// Constant rate factor (0-51)
    pub crf: u8,
    /// Codec threads; 0 lets libav decide
    pub threads: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            image_extension: "jpg".to_string(),
            clip_extension: "mp4".to_string(),
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            threads: num_cpus::get(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from("Dataset"),
            output_root: None,
            leagues: Vec::new(),
            seasons: Vec::new(),
            annotation_file: "Labels-v2.json".to_string(),
            half_files: ["1_224p.mkv".to_string(), "2_224p.mkv".to_string()],
            label_field: "label".to_string(),
            event: None,
            mode: ExtractionMode::default(),
            window: None,
            custom_window: None,
            windows: WindowTable::default(),
            encoding: EncodingConfig::default(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub corpus_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub label_field: Option<String>,
    pub event: Option<String>,
    pub mode: Option<ExtractionMode>,
    pub window: Option<String>,
    pub custom_window: Option<Window>,
    pub video_codec: Option<String>,
    pub preset: Option<String>,
    pub crf: Option<u8>,
    pub threads: Option<usize>,
}

impl ExtractionConfig {
    /// Apply CLI/env overrides on top of file values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(root) = overrides.corpus_root {
            self.corpus_root = root;
        }
        if let Some(output) = overrides.output_root {
            self.output_root = Some(output);
        }
        if let Some(field) = overrides.label_field {
            self.label_field = field;
        }
        if let Some(event) = overrides.event {
            self.event = Some(event);
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(window) = overrides.window {
            self.window = Some(window);
        }
        if let Some(window) = overrides.custom_window {
            self.custom_window = Some(window);
        }
        if let Some(codec) = overrides.video_codec {
            self.encoding.video_codec = codec;
        }
        if let Some(preset) = overrides.preset {
            self.encoding.preset = preset;
        }
        if let Some(crf) = overrides.crf {
            self.encoding.crf = crf;
        }
        if let Some(threads) = overrides.threads {
            self.encoding.threads = threads;
        }
    }

    pub fn output_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| self.corpus_root.join(DEFAULT_OUTPUT_DIR))
    }

    pub fn event(&self) -> Result<&str, DomainError> {
        self.event
            .as_deref()
            .filter(|event| !event.trim().is_empty())
            .ok_or_else(|| DomainError::BadArgs("No event category selected (set `event` or --event)".to_string()))
    }

    pub fn half_paths(&self, match_dir: &std::path::Path) -> HalfPair<PathBuf> {
        HalfPair::new(
            match_dir.join(&self.half_files[0]),
            match_dir.join(&self.half_files[1]),
        )
    }

    /// Window used for every clip of the run.
    ///
    /// An explicit pair wins, then the `window` key, then the event name itself.
    pub fn active_window(&self) -> Result<Window, DomainError> {
        if let Some(window) = self.custom_window {
            return Ok(window);
        }
        match &self.window {
            Some(key) => self.windows.select(key),
            None => self.windows.select(self.event()?),
        }
    }

    /// Check the settings a run depends on before touching any match
    pub fn validate(&self) -> Result<(), DomainError> {
        self.event()?;

        if self.label_field.trim().is_empty() {
            return Err(DomainError::BadArgs("label_field cannot be empty".to_string()));
        }
        if self.encoding.crf > 51 {
            return Err(DomainError::BadArgs(format!(
                "CRF value {} is invalid (must be 0-51)",
                self.encoding.crf
            )));
        }
        if let Some(window) = self.custom_window {
            Window::new(window.before, window.after)?;
        }
        self.windows.check()?;
        if self.mode == ExtractionMode::Clip {
            self.active_window()?;
        }

        Ok(())
    }
}
