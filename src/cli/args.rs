//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::domain::errors::DomainError;
use crate::domain::model::{ConfigOverrides, ExtractionMode, Window};

/// Run settings shared by every command; each one overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Corpus root holding <league>/<season>/<match> directories
    #[arg(long, env = "EVENTCUT_CORPUS")]
    pub corpus: Option<PathBuf>,

    /// Output root (default: <corpus>/Extracted_Events)
    #[arg(short, long, env = "EVENTCUT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Annotation field holding the category
    #[arg(long, env = "EVENTCUT_LABEL_FIELD")]
    pub label_field: Option<String>,

    /// Category value to extract, e.g. "Corner"
    #[arg(short, long, env = "EVENTCUT_EVENT")]
    pub event: Option<String>,

    /// Extraction mode (frame or clip)
    #[arg(short, long, env = "EVENTCUT_MODE", value_parser = parse_mode)]
    pub mode: Option<ExtractionMode>,

    /// Window table key for clips (default: the event name)
    #[arg(short, long, env = "EVENTCUT_WINDOW")]
    pub window: Option<String>,

    /// Seconds kept before the event; bypasses the window table
    #[arg(long, requires = "after")]
    pub before: Option<f64>,

    /// Seconds kept after the event; bypasses the window table
    #[arg(long, requires = "before")]
    pub after: Option<f64>,

    /// Video encoder for clips
    #[arg(long, env = "EVENTCUT_CODEC")]
    pub codec: Option<String>,

    /// Constant Rate Factor (0-51)
    #[arg(long, env = "EVENTCUT_CRF", value_parser = crf_in_range)]
    pub crf: Option<u8>,

    /// Encoding preset
    #[arg(long, env = "EVENTCUT_PRESET")]
    pub preset: Option<String>,

    /// Codec threads (0 lets libav decide)
    #[arg(long, env = "EVENTCUT_THREADS")]
    pub threads: Option<usize>,
}

impl SelectionArgs {
    /// Convert into config overrides, checking the explicit window
    pub fn overrides(&self) -> Result<ConfigOverrides, DomainError> {
        let custom_window = match (self.before, self.after) {
            (Some(before), Some(after)) => Some(Window::new(before, after)?),
            _ => None,
        };

        Ok(ConfigOverrides {
            corpus_root: self.corpus.clone(),
            output_root: self.output.clone(),
            label_field: self.label_field.clone(),
            event: self.event.clone(),
            mode: self.mode,
            window: self.window.clone(),
            custom_window,
            video_codec: self.codec.clone(),
            preset: self.preset.clone(),
            crf: self.crf,
            threads: self.threads,
        })
    }
}

fn parse_mode(value: &str) -> Result<ExtractionMode, String> {
    ExtractionMode::parse(value).map_err(|e| e.to_string())
}

fn crf_in_range(value: &str) -> Result<u8, String> {
    number_range(value, 0, 51)
}

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Process only these match directories instead of walking the corpus
    #[arg(long = "match", value_name = "DIR")]
    pub matches: Vec<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Match directory to plan
    #[arg(long = "match", value_name = "DIR")]
    pub match_dir: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Match directory to inspect
    #[arg(long = "match", value_name = "DIR")]
    pub match_dir: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
