// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

mod config;

pub use config::{ConfigOverrides, EncodingConfig, ExtractionConfig};

/// One of the two continuous recordings composing a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Half {
    First,
    Second,
}

impl Half {
    /// Both halves in timeline order
    pub const ALL: [Half; 2] = [Half::First, Half::Second];

    /// Parse the half from a `gameTime` value such as `"1 - 00:30"`.
    ///
    /// Only the first character is significant and must be `'1'` or `'2'`.
    pub fn from_game_time(game_time: &str) -> Result<Self, DomainError> {
        match game_time.chars().next() {
            Some('1') => Ok(Half::First),
            Some('2') => Ok(Half::Second),
            _ => Err(DomainError::InvalidHalf(format!(
                "gameTime '{}' does not start with '1' or '2'",
                game_time
            ))),
        }
    }

    /// Half number as written in annotations
    pub fn number(&self) -> u8 {
        match self {
            Half::First => 1,
            Half::Second => 2,
        }
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A value held once per half; the halves are never merged into one timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfPair<T> {
    pub first: T,
    pub second: T,
}

impl<T> HalfPair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    pub fn get(&self, half: Half) -> &T {
        match half {
            Half::First => &self.first,
            Half::Second => &self.second,
        }
    }

    pub fn get_mut(&mut self, half: Half) -> &mut T {
        match half {
            Half::First => &mut self.first,
            Half::Second => &mut self.second,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> HalfPair<U> {
        HalfPair {
            first: f(self.first),
            second: f(self.second),
        }
    }

    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<HalfPair<U>, E> {
        Ok(HalfPair {
            first: f(self.first)?,
            second: f(self.second)?,
        })
    }
}

/// One event record from a match annotation file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnnotation")]
pub struct Annotation {
    /// Half indicator followed by a human readable clock, e.g. `"1 - 00:30"`
    #[serde(rename = "gameTime")]
    pub game_time: String,
    /// Milliseconds since the start of the half
    #[serde(rename = "position")]
    pub position_ms: i64,
    /// Every other string field, used for filtering (`label`, `change_type`, ...)
    #[serde(flatten)]
    pub labels: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(game_time: impl Into<String>, position_ms: i64) -> Self {
        Self {
            game_time: game_time.into(),
            position_ms,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(field.into(), value.into());
        self
    }

    pub fn half(&self) -> Result<Half, DomainError> {
        Half::from_game_time(&self.game_time)
    }

    pub fn label(&self, field: &str) -> Option<&str> {
        self.labels.get(field).map(String::as_str)
    }
}

/// Wire shape of an annotation; `position` arrives as a string or a number.
#[derive(Deserialize)]
struct RawAnnotation {
    #[serde(rename = "gameTime")]
    game_time: String,
    position: RawPosition,
    #[serde(flatten)]
    fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawAnnotation> for Annotation {
    type Error = String;

    fn try_from(raw: RawAnnotation) -> Result<Self, Self::Error> {
        let position_ms = match raw.position {
            RawPosition::Integer(ms) => ms,
            RawPosition::Float(ms) => ms.trunc() as i64,
            RawPosition::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid position '{}': {}", text, e))?,
        };

        // Non-string values (nested objects, numbers) are not labels.
        let labels = raw
            .fields
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect();

        Ok(Self {
            game_time: raw.game_time,
            position_ms,
            labels,
        })
    }
}

/// Per-match annotation document, either wrapped (`{"annotations": [...]}`) or a bare array
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDocument {
    pub annotations: Vec<Annotation>,
}

impl AnnotationDocument {
    pub fn from_json_str(text: &str) -> Result<Self, DomainError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| DomainError::MalformedAnnotations(format!("invalid JSON: {}", e)))?;

        let list = match value {
            serde_json::Value::Object(mut object) => object.remove("annotations").ok_or_else(|| {
                DomainError::MalformedAnnotations("missing top-level `annotations` array".to_string())
            })?,
            array @ serde_json::Value::Array(_) => array,
            _ => {
                return Err(DomainError::MalformedAnnotations(
                    "expected an object or an array at the top level".to_string(),
                ))
            }
        };

        let annotations = serde_json::from_value(list)
            .map_err(|e| DomainError::MalformedAnnotations(e.to_string()))?;
        Ok(Self { annotations })
    }

    pub fn into_annotations(self) -> Vec<Annotation> {
        self.annotations
    }
}

/// Properties of one half's video source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfInfo {
    /// Frames per second
    pub fps: f64,
    /// Total number of frames (container count, or estimated from duration)
    pub total_frames: i64,
    /// Duration in seconds
    pub duration_secs: f64,
}

/// Seconds kept before and after an event when cutting a clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub before: f64,
    pub after: f64,
}

impl Window {
    pub fn new(before: f64, after: f64) -> Result<Self, DomainError> {
        if !(before >= 0.0 && after >= 0.0) {
            return Err(DomainError::BadArgs(format!(
                "Window bounds must be non-negative (before={}, after={})",
                before, after
            )));
        }
        Ok(Self { before, after })
    }
}

/// Event category to window lookup.
///
/// Keys are normalized (`"Free kick"`, `"FREE_KICK"` and `"free-kick"` are the
/// same entry). Entries supplied from configuration extend the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Window>", into = "BTreeMap<String, Window>")]
pub struct WindowTable {
    entries: BTreeMap<String, Window>,
}

impl WindowTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn normalize_key(key: &str) -> String {
        key.trim()
            .to_lowercase()
            .replace([' ', '_'], "-")
    }

    pub fn insert(&mut self, category: &str, window: Window) {
        self.entries.insert(Self::normalize_key(category), window);
    }

    pub fn get(&self, category: &str) -> Option<Window> {
        self.entries.get(&Self::normalize_key(category)).copied()
    }

    /// Look up a category, failing rather than guessing when it is absent
    pub fn select(&self, category: &str) -> Result<Window, DomainError> {
        self.get(category).ok_or_else(|| {
            DomainError::UnknownWindow(format!(
                "'{}' is not in the window table (known: {})",
                category,
                self.categories().join(", ")
            ))
        })
    }

    pub fn categories(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
    /// Fail on the first entry with a negative or NaN bound
    pub fn check(&self) -> Result<(), DomainError> {
        for (category, window) in &self.entries {
            if let Err(DomainError::BadArgs(msg)) = Window::new(window.before, window.after) {
                return Err(DomainError::BadArgs(format!("windows.{}: {}", category, msg)));
            }
        }
        Ok(())
    }
}

impl Default for WindowTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("corner", Window { before: 2.0, after: 4.0 });
        table.insert("free-kick", Window { before: 3.0, after: 4.0 });
        table.insert("penalty", Window { before: 1.0, after: 2.0 });
        table.insert("open-play", Window { before: 4.0, after: 4.0 });
        table
    }
}

impl From<BTreeMap<String, Window>> for WindowTable {
    fn from(entries: BTreeMap<String, Window>) -> Self {
        let mut table = Self::default();
        for (category, window) in entries {
            table.insert(&category, window);
        }
        table
    }
}

impl From<WindowTable> for BTreeMap<String, Window> {
    fn from(table: WindowTable) -> Self {
        table.entries
    }
}

/// Extraction mode for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// One still image per annotation
    Frame,
    /// One short clip with audio per annotation
    #[default]
    Clip,
}

impl ExtractionMode {
    pub fn parse(mode: &str) -> Result<Self, DomainError> {
        match mode.trim().to_lowercase().as_str() {
            "frame" | "frames" => Ok(ExtractionMode::Frame),
            "clip" | "clips" => Ok(ExtractionMode::Clip),
            other => Err(DomainError::BadArgs(format!(
                "Invalid extraction mode: {}. Valid modes: frame, clip",
                other
            ))),
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Frame => write!(f, "frame"),
            ExtractionMode::Clip => write!(f, "clip"),
        }
    }
}

/// Time range of a clip within one half, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRange {
    pub start: f64,
    pub end: f64,
}

impl ClipRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Where in a match an artifact comes from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TemporalTarget {
    Frame { half: Half, index: i64 },
    Clip { half: Half, range: ClipRange },
}

impl TemporalTarget {
    pub fn half(&self) -> Half {
        match self {
            TemporalTarget::Frame { half, .. } | TemporalTarget::Clip { half, .. } => *half,
        }
    }
}

impl fmt::Display for TemporalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalTarget::Frame { half, index } => write!(f, "half {} frame {}", half, index),
            TemporalTarget::Clip { half, range } => {
                write!(f, "half {} {:.3}s-{:.3}s", half, range.start, range.end)
            }
        }
    }
}

/// Why a single annotation produced no artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidHalf(String),
    FrameOutOfRange { index: i64, total_frames: i64 },
    EmptyRange { start: f64, end: f64 },
    Routing(String),
    Extraction(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidHalf(msg) => write!(f, "invalid half: {}", msg),
            SkipReason::FrameOutOfRange { index, total_frames } => write!(
                f,
                "frame {} outside [0, {})",
                index, total_frames
            ),
            SkipReason::EmptyRange { start, end } => {
                write!(f, "empty clip range {:.3}s-{:.3}s", start, end)
            }
            SkipReason::Routing(msg) => write!(f, "output routing failed: {}", msg),
            SkipReason::Extraction(msg) => write!(f, "extraction failed: {}", msg),
        }
    }
}

/// An annotation paired with the target it resolves to (or why it does not)
#[derive(Debug, Clone, Serialize)]
pub struct PlannedItem {
    pub annotation: Annotation,
    pub target: Result<TemporalTarget, SkipReason>,
    pub file_name: Option<String>,
}

/// Dry-run result for one match
#[derive(Debug, Clone, Serialize)]
pub struct MatchPlan {
    pub match_dir: PathBuf,
    pub event: String,
    pub mode: ExtractionMode,
    pub output_dir: PathBuf,
    pub total_annotations: usize,
    /// Only probed in frame mode
    pub halves: Option<HalfPair<HalfInfo>>,
    pub items: Vec<PlannedItem>,
}

/// Stream properties of both halves of a match
#[derive(Debug, Clone, Serialize)]
pub struct MatchInspection {
    pub match_dir: PathBuf,
    pub sources: HalfPair<PathBuf>,
    pub halves: HalfPair<HalfInfo>,
}

/// Outcome of one annotation in a batch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    Written { target: TemporalTarget, path: PathBuf },
    Skipped { game_time: String, reason: SkipReason },
}

/// Result of extracting one match
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub match_dir: PathBuf,
    pub event: String,
    pub mode: ExtractionMode,
    pub total_annotations: usize,
    pub selected: usize,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, ItemOutcome::Written { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.items.len() - self.written()
    }
}

/// A match that could not be processed at all
#[derive(Debug, Clone, Serialize)]
pub struct MatchFailure {
    pub match_dir: PathBuf,
    pub error: String,
}

/// Result of a whole run over several matches
#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub batches: Vec<BatchReport>,
    pub failures: Vec<MatchFailure>,
}

impl CorpusReport {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Utc::now(),
            batches: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn artifacts_written(&self) -> usize {
        self.batches.iter().map(BatchReport::written).sum()
    }

    pub fn items_skipped(&self) -> usize {
        self.batches.iter().map(BatchReport::skipped).sum()
    }
}

impl Default for CorpusReport {
    fn default() -> Self {
        Self::new()
    }
}
