//! Analysis summaries.
//!
//! Counting and averaging over finished analysis results, used by the
//! report generator and the `--fail-on` check.

pub mod aggregator;

pub use aggregator::*;
