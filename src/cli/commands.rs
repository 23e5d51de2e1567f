//! Command implementations

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::TomlConfigAdapter;
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::ExtractInteractor;
use crate::cli::args::{ExtractArgs, InspectArgs, PlanArgs, SelectionArgs};
use crate::domain::model::*;
use crate::domain::rules::TemporalResolver;
use crate::ports::ConfigPort;
use crate::utils::{format_clock, format_duration};

/// Load the config file and apply command-line overrides on top
pub fn load_config(config_path: Option<&Path>, selection: &SelectionArgs) -> Result<ExtractionConfig> {
    let adapter = TomlConfigAdapter::new();
    if config_path.is_none() {
        debug!(paths = ?adapter.default_config_paths(), "Searching for config file");
    }
    let mut config = adapter
        .load_config(config_path)
        .context("Failed to load configuration")?;
    config.apply_overrides(selection.overrides()?);
    Ok(config)
}

fn interactor(config: &ExtractionConfig) -> Result<std::sync::Arc<ExtractInteractor>> {
    let container = DefaultAppContainer::new(config.encoding.clone())
        .context("Failed to initialize media backend")?;
    Ok(container.extract_interactor())
}

/// Execute the extract command
pub async fn extract(config_path: Option<&Path>, args: ExtractArgs) -> Result<()> {
    let config = load_config(config_path, &args.selection)?;
    config.validate()?;

    let match_dirs = if args.matches.is_empty() {
        info!("Walking corpus: {}", config.corpus_root.display());
        ExtractInteractor::discover_matches(&config).context("Failed to enumerate matches")?
    } else {
        args.matches.clone()
    };

    let report = interactor(&config)?
        .extract_corpus(&config, &match_dirs)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.failures.is_empty() {
        anyhow::bail!(
            "{} of {} matches failed",
            report.failures.len(),
            report.failures.len() + report.batches.len()
        );
    }
    Ok(())
}

/// Execute the plan command
pub async fn plan(config_path: Option<&Path>, args: PlanArgs) -> Result<()> {
    let config = load_config(config_path, &args.selection)?;
    config.validate()?;

    let plan = interactor(&config)?
        .plan_match(&config, &args.match_dir)
        .await
        .with_context(|| format!("Failed to plan {}", args.match_dir.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

/// Execute the inspect command
pub async fn inspect(config_path: Option<&Path>, args: InspectArgs) -> Result<()> {
    let config = load_config(config_path, &args.selection)?;

    let inspection = interactor(&config)?
        .inspect(&config, &args.match_dir)
        .await
        .with_context(|| format!("Failed to inspect {}", args.match_dir.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        println!("Match: {}", inspection.match_dir.display());
        for half in Half::ALL {
            let info = inspection.halves.get(half);
            println!(
                "  Half {}: {}",
                half,
                inspection.sources.get(half).display()
            );
            println!(
                "    {:.3} fps, {} frames, {}",
                info.fps,
                info.total_frames,
                format_duration(Duration::from_secs_f64(info.duration_secs.max(0.0)))
            );
        }
    }
    Ok(())
}

fn print_report(report: &CorpusReport) {
    for batch in &report.batches {
        println!(
            "{}: {} written, {} skipped ({} of {} annotations selected)",
            batch.match_dir.display(),
            batch.written(),
            batch.skipped(),
            batch.selected,
            batch.total_annotations
        );
        for item in &batch.items {
            if let ItemOutcome::Skipped { game_time, reason } = item {
                println!("  skipped {}: {}", game_time, reason);
            }
        }
    }
    for failure in &report.failures {
        println!("{}: FAILED: {}", failure.match_dir.display(), failure.error);
    }
    println!(
        "Run started {}: {} matches, {} failed, {} artifacts written, {} items skipped",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.batches.len() + report.failures.len(),
        report.failures.len(),
        report.artifacts_written(),
        report.items_skipped()
    );
}

fn print_plan(plan: &MatchPlan) {
    let selected = plan.items.len();
    println!("Match: {}", plan.match_dir.display());
    println!(
        "Event: {} ({} mode), {} of {} annotations selected",
        plan.event, plan.mode, selected, plan.total_annotations
    );
    println!("Output: {}", plan.output_dir.display());

    for item in &plan.items {
        let clock = format_clock(TemporalResolver::event_seconds(item.annotation.position_ms));
        match (&item.target, &item.file_name) {
            (Ok(target), Some(name)) => {
                println!("  {:<12} [{}] {} -> {}", item.annotation.game_time, clock, target, name)
            }
            (Ok(target), None) => println!("  {:<12} [{}] {}", item.annotation.game_time, clock, target),
            (Err(reason), _) => {
                println!("  {:<12} [{}] skipped: {}", item.annotation.game_time, clock, reason)
            }
        }
    }
}
