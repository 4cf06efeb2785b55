//! Core pipeline orchestration for askctx.
//!
//! This crate ties together credential resolution, source acquisition,
//! corpus aggregation, and the backend call into one end-to-end run
//! ([`pipeline::run_query`]).

pub mod pipeline;

pub use pipeline::{ProgressReporter, QueryConfig, QueryResult, SilentProgress, run_query};
