//! Repository layer
//!
//! Repositories are thin adapters over the HTTP clients. Each one is a
//! collaborator seam of the crawler: the orchestrator and the backfill only
//! ever see these traits, so tests can swap in fakes.

mod github;
mod listing;
mod objects;
mod upload;

// Re-export traits
pub use github::PullRequestRepository;
pub use listing::ListingRepository;
pub use objects::ObjectRepository;
pub use upload::BuildUploader;

// Re-export implementations
pub use github::HttpPullRequestRepository;
pub use listing::HttpListingRepository;
pub use objects::HttpObjectRepository;
pub use upload::HttpBuildUploader;
