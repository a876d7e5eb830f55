//! Core domain types
//!
//! This module contains the domain structures shared by the crawler (which
//! discovers, resolves and forwards builds) and the CLI (which reports on them).

pub mod build;
pub mod job;
pub mod location;
pub mod marker;
pub mod summary;
