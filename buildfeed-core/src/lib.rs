//! Buildfeed Core
//!
//! Core types and pure logic for the buildfeed CI build forwarder.
//!
//! This crate contains:
//! - Domain types: jobs, builds, outcomes, storage locations and run summaries
//! - DTOs: wire formats of the ingestion API and the GitHub REST API
//! - Listing: job-name extraction and build-ID discovery from job-history pages

pub mod domain;
pub mod dto;
pub mod listing;
