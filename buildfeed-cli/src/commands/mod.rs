//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod backfill;
mod crawl;
mod tracked;

use anyhow::Result;
use buildfeed_crawler::DEFAULT_CI_CONTEXT;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::GlobalArgs;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Forward new builds of a job to the analytics platform
    Crawl {
        /// Job-history URL of the job
        job_url: String,

        /// Directory holding the tracker files
        #[arg(long, env = "BUILDFEED_TRACKER_DIR", default_value = "./tracker")]
        tracker_dir: PathBuf,

        /// Maximum number of new builds processed in this run
        #[arg(long, env = "BUILDFEED_LIMIT", default_value_t = 50)]
        limit: usize,

        /// Pause between builds in milliseconds
        #[arg(long, env = "BUILDFEED_DELAY_MS", default_value_t = 1000)]
        delay_ms: u64,
    },
    /// Forward CI results of historical pull requests
    Backfill {
        /// Repository as owner/name
        #[arg(long)]
        repo: String,

        /// First pull request number
        #[arg(long, default_value_t = 1)]
        start_pr: u64,

        /// Last pull request number, defaults to the newest one
        #[arg(long)]
        end_pr: Option<u64>,

        /// Status context holding the CI result
        #[arg(long, default_value = DEFAULT_CI_CONTEXT)]
        ci_context: String,

        /// GitHub token with repository read access
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// Pause between pull requests in milliseconds
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,
    },
    /// List builds already forwarded for a job
    Tracked {
        /// Job name or job-history URL
        job: String,

        /// Directory holding the tracker files
        #[arg(long, env = "BUILDFEED_TRACKER_DIR", default_value = "./tracker")]
        tracker_dir: PathBuf,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `global` - Flags shared by every command
pub async fn handle_command(command: Commands, global: &GlobalArgs) -> Result<()> {
    match command {
        Commands::Crawl {
            job_url,
            tracker_dir,
            limit,
            delay_ms,
        } => crawl::handle_crawl(global, &job_url, tracker_dir, limit, delay_ms).await,
        Commands::Backfill {
            repo,
            start_pr,
            end_pr,
            ci_context,
            github_token,
            delay_ms,
        } => {
            let options = backfill::BackfillOptions {
                repo,
                start_pr,
                end_pr,
                ci_context,
                github_token,
                delay_ms,
            };
            backfill::handle_backfill(global, options).await
        }
        Commands::Tracked { job, tracker_dir } => tracked::handle_tracked(&job, tracker_dir),
    }
}
