//! Configuration module
//!
//! Global flags shared by every subcommand, and their translation into the
//! crawler configuration.

use buildfeed_crawler::Config;
use buildfeed_crawler::config::DEFAULT_BROWSE_URL;
use clap::Args;
use std::time::Duration;

/// Upstream services and run mode
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Resolve builds without uploading or tracking anything
    #[arg(long, global = true, env = "BUILDFEED_DRY_RUN")]
    pub dry_run: bool,

    /// Analytics platform URL
    #[arg(long, global = true, env = "LOGILICA_URL", default_value = "https://logilica.io")]
    pub ingest_url: String,

    /// Analytics platform tenant domain
    #[arg(long, global = true, env = "LOGILICA_DOMAIN", default_value = "redhat")]
    pub ingest_domain: String,

    /// Analytics import token
    #[arg(long, global = true, env = "LOGILICA_TOKEN", hide_env_values = true)]
    pub ingest_token: Option<String>,

    /// Public object storage endpoint
    #[arg(
        long,
        global = true,
        env = "BUILDFEED_STORAGE_URL",
        default_value = "https://storage.googleapis.com"
    )]
    pub storage_url: String,

    /// Bucket holding build artifacts
    #[arg(long, global = true, env = "BUILDFEED_BUCKET", default_value = "test-platform-results")]
    pub bucket: String,

    /// Storage browser used for build links
    #[arg(long, global = true, env = "BUILDFEED_BROWSE_URL", default_value = DEFAULT_BROWSE_URL)]
    pub browse_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "BUILDFEED_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,

    /// Upload attempts per build before giving up
    #[arg(long, global = true, env = "BUILDFEED_UPLOAD_ATTEMPTS", default_value_t = 7)]
    pub upload_attempts: u32,
}

impl GlobalArgs {
    /// Builds the crawler configuration shared by all subcommands
    pub fn to_config(&self) -> Config {
        let mut config = Config::default().with_ingest_token(self.ingest_token.clone());
        config.dry_run = self.dry_run;
        config.ingest_url = self.ingest_url.clone();
        config.ingest_domain = self.ingest_domain.clone();
        config.storage_url = self.storage_url.clone();
        config.bucket = self.bucket.clone();
        config.browse_url = self.browse_url.clone();
        config.http_timeout = Duration::from_secs(self.http_timeout);
        config.upload_retry.max_attempts = self.upload_attempts.max(1);
        config
    }
}
