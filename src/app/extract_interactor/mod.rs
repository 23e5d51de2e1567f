// Extract interactor - Orchestrates event extraction for matches and corpora

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::corpus::CorpusWalker;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::output::OutputRouter;
use crate::ports::*;
use crate::utils::format_duration;

/// How a run turns annotations into targets
#[derive(Clone, Copy)]
enum Resolution<'a> {
    Frame(&'a HalfPair<HalfInfo>),
    Clip(Window),
}

impl Resolution<'_> {
    fn resolve(&self, annotation: &Annotation) -> Result<TemporalTarget, SkipReason> {
        match self {
            Resolution::Frame(halves) => TemporalResolver::resolve_frame(annotation, halves),
            Resolution::Clip(window) => TemporalResolver::resolve_clip(annotation, *window),
        }
    }
}

/// Interactor for the extract, plan and inspect use cases
pub struct ExtractInteractor {
    annotation_port: Arc<dyn AnnotationPort>,
    media_port: Arc<dyn MediaPort>,
}

impl ExtractInteractor {
    /// Create new extract interactor with injected ports
    pub fn new(annotation_port: Arc<dyn AnnotationPort>, media_port: Arc<dyn MediaPort>) -> Self {
        Self {
            annotation_port,
            media_port,
        }
    }

    /// Match directories of the configured corpus, skipping the output root
    pub fn discover_matches(config: &ExtractionConfig) -> Result<Vec<PathBuf>, DomainError> {
        CorpusWalker::new(&config.corpus_root)
            .with_selection(config.leagues.clone(), config.seasons.clone())
            .excluding(config.output_root())
            .match_dirs()
    }

    /// Extract every given match; a failing match is recorded and the run continues
    pub async fn extract_corpus(
        &self,
        config: &ExtractionConfig,
        match_dirs: &[PathBuf],
    ) -> Result<CorpusReport, DomainError> {
        config.validate()?;

        let event = config.event()?;
        let router = Arc::new(OutputRouter::new(config.output_root()));
        let mut report = CorpusReport::new();
        info!(
            matches = match_dirs.len(),
            event = %event,
            mode = %config.mode,
            output = %router.root().display(),
            "Starting extraction run"
        );

        for match_dir in match_dirs {
            match self.extract_match(config, Arc::clone(&router), match_dir).await {
                Ok(batch) => report.batches.push(batch),
                Err(e) => {
                    error!(match_dir = %match_dir.display(), error = %e, "Match failed");
                    report.failures.push(MatchFailure {
                        match_dir: match_dir.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = report.batches.len(),
            failed = report.failures.len(),
            written = report.artifacts_written(),
            skipped = report.items_skipped(),
            "Extraction run completed"
        );
        Ok(report)
    }

    /// Extract one match.
    ///
    /// Errors returned here are match-level: unreadable annotations or
    /// sources that cannot be opened. Item failures end up in the report.
    pub async fn extract_match(
        &self,
        config: &ExtractionConfig,
        router: Arc<OutputRouter>,
        match_dir: &Path,
    ) -> Result<BatchReport, DomainError> {
        let event = config.event()?.to_string();
        let annotations = self
            .annotation_port
            .load_annotations(&match_dir.join(&config.annotation_file))
            .await?;
        let total_annotations = annotations.len();
        let selected = AnnotationFilter::select(&annotations, &config.label_field, &event);

        let media_port = Arc::clone(&self.media_port);
        let config = config.clone();
        let match_dir = match_dir.to_path_buf();
        tokio::task::spawn_blocking(move || {
            run_batch(
                media_port.as_ref(),
                &config,
                &router,
                &match_dir,
                selected,
                total_annotations,
            )
        })
        .await
        .map_err(|e| DomainError::InternalError(format!("Batch task failed: {}", e)))?
    }

    /// Resolve one match without writing anything
    pub async fn plan_match(&self, config: &ExtractionConfig, match_dir: &Path) -> Result<MatchPlan, DomainError> {
        let event = config.event()?.to_string();
        let annotations = self
            .annotation_port
            .load_annotations(&match_dir.join(&config.annotation_file))
            .await?;
        let selected = AnnotationFilter::select(&annotations, &config.label_field, &event);

        let halves = match config.mode {
            ExtractionMode::Frame => Some(self.probe(config, match_dir).await?),
            ExtractionMode::Clip => None,
        };
        let resolution = match &halves {
            Some(halves) => Resolution::Frame(halves),
            None => Resolution::Clip(config.active_window()?),
        };

        let router = OutputRouter::new(config.output_root());
        let items = selected
            .into_iter()
            .map(|annotation| {
                let target = resolution.resolve(&annotation);
                let file_name = target
                    .as_ref()
                    .ok()
                    .map(|target| ArtifactNamer::file_name(target, &config.encoding));
                PlannedItem {
                    annotation,
                    target,
                    file_name,
                }
            })
            .collect();

        Ok(MatchPlan {
            match_dir: match_dir.to_path_buf(),
            output_dir: router.category_dir(&event),
            event,
            mode: config.mode,
            total_annotations: annotations.len(),
            halves,
            items,
        })
    }

    /// Probe both halves of a match
    pub async fn inspect(&self, config: &ExtractionConfig, match_dir: &Path) -> Result<MatchInspection, DomainError> {
        let halves = self.probe(config, match_dir).await?;
        Ok(MatchInspection {
            match_dir: match_dir.to_path_buf(),
            sources: config.half_paths(match_dir),
            halves,
        })
    }

    async fn probe(&self, config: &ExtractionConfig, match_dir: &Path) -> Result<HalfPair<HalfInfo>, DomainError> {
        let media_port = Arc::clone(&self.media_port);
        let paths = config.half_paths(match_dir);
        tokio::task::spawn_blocking(move || -> Result<HalfPair<HalfInfo>, DomainError> {
            let sources = media_port.open_match(&paths)?;
            Ok(HalfPair::new(
                sources.half_info(Half::First),
                sources.half_info(Half::Second),
            ))
        })
        .await
        .map_err(|e| DomainError::InternalError(format!("Probe task failed: {}", e)))?
    }
}

/// Extract the selected annotations of one match, one after another.
///
/// Both halves are opened once up front and released when the batch ends.
/// Only failing to open them is an error; every item failure is logged and
/// recorded as skipped.
pub fn run_batch(
    media_port: &dyn MediaPort,
    config: &ExtractionConfig,
    router: &OutputRouter,
    match_dir: &Path,
    selected: Vec<Annotation>,
    total_annotations: usize,
) -> Result<BatchReport, DomainError> {
    let started = Instant::now();
    let event = config.event()?.to_string();
    let mut report = BatchReport {
        match_dir: match_dir.to_path_buf(),
        event: event.clone(),
        mode: config.mode,
        total_annotations,
        selected: selected.len(),
        items: Vec::with_capacity(selected.len()),
    };

    if selected.is_empty() {
        info!(match_dir = %match_dir.display(), event = %event, "No matching annotations");
        return Ok(report);
    }

    let window = match config.mode {
        ExtractionMode::Clip => Some(config.active_window()?),
        ExtractionMode::Frame => None,
    };

    let mut sources = media_port.open_match(&config.half_paths(match_dir))?;
    let halves = HalfPair::new(
        sources.half_info(Half::First),
        sources.half_info(Half::Second),
    );
    debug!(
        match_dir = %match_dir.display(),
        selected = selected.len(),
        first_frames = halves.first.total_frames,
        second_frames = halves.second.total_frames,
        "Sources opened"
    );

    let resolution = match window {
        Some(window) => Resolution::Clip(window),
        None => Resolution::Frame(&halves),
    };

    for annotation in &selected {
        let outcome = extract_item(sources.as_mut(), resolution, router, &event, annotation, &config.encoding);
        report.items.push(outcome);
    }
    drop(sources);

    info!(
        match_dir = %match_dir.display(),
        written = report.written(),
        skipped = report.skipped(),
        elapsed = %format_duration(started.elapsed()),
        "Batch completed"
    );
    Ok(report)
}

fn extract_item(
    sources: &mut dyn MatchMedia,
    resolution: Resolution<'_>,
    router: &OutputRouter,
    event: &str,
    annotation: &Annotation,
    encoding: &EncodingConfig,
) -> ItemOutcome {
    let skipped = |reason: SkipReason| ItemOutcome::Skipped {
        game_time: annotation.game_time.clone(),
        reason,
    };

    let target = match resolution.resolve(annotation) {
        Ok(target) => target,
        Err(reason @ SkipReason::InvalidHalf(_)) => {
            error!(game_time = %annotation.game_time, reason = %reason, "Annotation rejected");
            return skipped(reason);
        }
        Err(reason) => {
            warn!(game_time = %annotation.game_time, reason = %reason, "Annotation skipped");
            return skipped(reason);
        }
    };

    let file_name = ArtifactNamer::file_name(&target, encoding);
    let path = match router.route(event, &file_name) {
        Ok(path) => path,
        Err(e) => {
            warn!(item = %target, error = %e, "Output path unavailable");
            return skipped(SkipReason::Routing(e.to_string()));
        }
    };

    let result = match &target {
        TemporalTarget::Frame { half, index } => sources.extract_frame(*half, *index, &path),
        TemporalTarget::Clip { half, range } => sources.extract_clip(*half, range, &path),
    };

    match result {
        Ok(()) => {
            match target {
                TemporalTarget::Frame { half, index } => {
                    info!(half = %half, frame = index, path = %path.display(), "Frame saved")
                }
                TemporalTarget::Clip { half, range } => info!(
                    half = %half,
                    start = range.start,
                    end = range.end,
                    path = %path.display(),
                    "Clip saved"
                ),
            }
            ItemOutcome::Written { target, path }
        }
        Err(e) => {
            warn!(item = %target, path = %path.display(), reason = %e, "Extraction failed");
            router.release(&path);
            skipped(SkipReason::Extraction(e.to_string()))
        }
    }
}
