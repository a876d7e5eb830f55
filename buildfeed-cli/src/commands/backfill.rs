//! Backfill command handler

use anyhow::{Context, Result};
use buildfeed_core::domain::summary::BackfillSummary;
use buildfeed_crawler::{Backfill, BackfillRequest};
use colored::*;
use std::time::Duration;
use tracing::info;

use super::crawl::colorize_count;
use crate::config::GlobalArgs;

/// Arguments of the backfill command
pub struct BackfillOptions {
    pub repo: String,
    pub start_pr: u64,
    pub end_pr: Option<u64>,
    pub ci_context: String,
    pub github_token: Option<String>,
    pub delay_ms: u64,
}

/// Handle the backfill command
pub async fn handle_backfill(global: &GlobalArgs, options: BackfillOptions) -> Result<()> {
    let mut config = global
        .to_config()
        .with_github_token(options.github_token);
    config.pull_request_delay = Duration::from_millis(options.delay_ms);

    info!(
        "Loaded configuration: github_url={}, bucket={}, ingest_url={}",
        config.github_url, config.bucket, config.ingest_url
    );

    let backfill = Backfill::from_config(&config)?;
    let request = BackfillRequest {
        repo: options.repo,
        start_pr: options.start_pr,
        end_pr: options.end_pr,
        ci_context: options.ci_context,
    };

    let summary = backfill
        .run(&request)
        .await
        .with_context(|| format!("Backfill of {} failed", request.repo))?;

    print_summary(&request, config.dry_run, &summary);

    Ok(())
}

fn print_summary(request: &BackfillRequest, dry_run: bool, summary: &BackfillSummary) {
    let title = if dry_run {
        format!("Dry run backfill of {}", request.repo)
    } else {
        format!("Backfill of {}", request.repo)
    };
    println!("{}", title.bold());
    println!("  Context:   {}", request.ci_context.cyan());
    println!("  Processed: {}", summary.processed);
    println!("  Succeeded: {}", summary.succeeded.to_string().green());
    println!("  Failed:    {}", colorize_count(summary.failed));
}
