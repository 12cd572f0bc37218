//! Sheet profiling and the heuristic insights derived from it.
//!
//! [`SheetProfiler`] turns one sheet's columns into a [`SheetProfile`];
//! [`InsightGenerator`] reads a set of profiles and produces per-sheet
//! [`Insight`]s. Neither performs I/O.

pub mod insights;
pub mod profiler;
pub mod stats;
pub mod types;

pub use insights::{InsightGenerator, InsightThresholds};
pub use profiler::SheetProfiler;
pub use types::{Insight, InsightKind, NumericStats, ProfileWarning, Severity, SheetProfile, TextStats};
