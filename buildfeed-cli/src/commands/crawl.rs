//! Crawl command handler
//!
//! Runs one crawl of a job and prints a line per processed build followed by
//! the run totals.

use anyhow::{Context, Result};
use buildfeed_core::domain::build::BuildOutcome;
use buildfeed_core::domain::summary::{BuildDisposition, BuildReport, RunSummary};
use buildfeed_crawler::Crawler;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::config::GlobalArgs;

/// Handle the crawl command
///
/// # Arguments
/// * `global` - Flags shared by every command
/// * `job_url` - Job-history URL to crawl
/// * `tracker_dir` - Directory holding the tracker files
/// * `limit` - Maximum number of new builds to process
/// * `delay_ms` - Pause between builds
pub async fn handle_crawl(
    global: &GlobalArgs,
    job_url: &str,
    tracker_dir: PathBuf,
    limit: usize,
    delay_ms: u64,
) -> Result<()> {
    let mut config = global.to_config();
    config.tracker_dir = tracker_dir;
    config.limit = limit;
    config.build_delay = Duration::from_millis(delay_ms);

    info!(
        "Loaded configuration: tracker_dir={}, limit={}, bucket={}, ingest_url={}",
        config.tracker_dir.display(),
        config.limit,
        config.bucket,
        config.ingest_url
    );

    let crawler = Crawler::from_config(&config)?;
    let summary = crawler
        .run(job_url)
        .await
        .with_context(|| format!("Crawl of {} failed", job_url))?;

    print_summary(&summary);

    Ok(())
}

/// Print the per-build lines and totals of a run
fn print_summary(summary: &RunSummary) {
    let title = if summary.dry_run {
        format!("Dry run of {} ({})", summary.job_name, summary.run_id)
    } else {
        format!("Crawl of {} ({})", summary.job_name, summary.run_id)
    };
    println!("{}", title.bold());

    if summary.builds.is_empty() {
        println!("{}", "  No new builds.".yellow());
    }

    for build in &summary.builds {
        print_build(build);
    }

    println!();
    println!("  Discovered:      {}", summary.discovered);
    println!("  Already tracked: {}", summary.already_tracked.to_string().dimmed());
    println!("  Processed:       {}", summary.processed);
    println!("  Succeeded:       {}", summary.succeeded.to_string().green());
    println!("  Failed:          {}", colorize_count(summary.failed));

    if summary.remaining() > 0 {
        println!(
            "  {}",
            format!("{} new build(s) left for the next run", summary.remaining()).dimmed()
        );
    }
}

fn print_build(build: &BuildReport) {
    print!(
        "  {} {}  {:<8} {}",
        "▸".cyan(),
        build.build_id,
        colorize_outcome(build.outcome),
        colorize_disposition(build.disposition)
    );

    if let Some(detail) = &build.detail {
        print!("  {}", detail.dimmed());
    }
    println!();
}

/// Colorize a build outcome for display
fn colorize_outcome(outcome: BuildOutcome) -> ColoredString {
    match outcome {
        BuildOutcome::Success => "success".green(),
        BuildOutcome::Failure => "failure".red(),
        BuildOutcome::Unknown => "unknown".yellow(),
    }
}

fn colorize_disposition(disposition: BuildDisposition) -> ColoredString {
    match disposition {
        BuildDisposition::Tracked => "✓ tracked".green(),
        BuildDisposition::Verified => "✓ verified".cyan(),
        BuildDisposition::Deferred => "✗ deferred".red(),
        BuildDisposition::Unresolvable => "… unresolved".yellow(),
    }
}

/// Colorize a failure count, red when non-zero
pub fn colorize_count(count: usize) -> ColoredString {
    if count == 0 {
        count.to_string().normal()
    } else {
        count.to_string().red()
    }
}
