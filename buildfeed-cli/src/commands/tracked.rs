//! Tracked command handler
//!
//! Prints the builds already forwarded for a job, straight from its
//! tracker file.

use anyhow::{Context, Result};
use buildfeed_core::domain::job::JobName;
use buildfeed_core::listing::parse_job_name;
use buildfeed_crawler::{FileTrackerStore, TrackerStore};
use colored::*;
use std::path::PathBuf;

/// Handle the tracked command
///
/// # Arguments
/// * `job` - Job name, or a job-history URL ending in the job name
/// * `tracker_dir` - Directory holding the tracker files
pub fn handle_tracked(job: &str, tracker_dir: PathBuf) -> Result<()> {
    let job_name = resolve_job_name(job)?;
    let store = FileTrackerStore::new(tracker_dir);
    let ids = store.load(&job_name)?;

    if ids.is_empty() {
        println!(
            "{}",
            format!("No builds tracked for {}.", job_name).yellow()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("{} build(s) tracked for {}:", ids.len(), job_name).bold()
    );
    println!("{}", store.path(&job_name).display().to_string().dimmed());
    for id in ids {
        println!("  {} {}", "▸".cyan(), id);
    }

    Ok(())
}

fn resolve_job_name(job: &str) -> Result<JobName> {
    if job.contains("://") {
        return Ok(parse_job_name(job)?);
    }

    job.parse::<JobName>()
        .with_context(|| format!("Invalid job name {:?}", job))
}
