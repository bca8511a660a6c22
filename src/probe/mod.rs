//! File-system probes.
//!
//! Each probe runs a fixed sequence of calls and either returns a report for
//! `main` to print or the first failure it hit.

pub mod append;
pub mod import;
pub mod stat;
