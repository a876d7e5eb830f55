//! Data Transfer Objects
//!
//! Wire formats for the external HTTP APIs the forwarder talks to.

pub mod github;
pub mod ingest;
