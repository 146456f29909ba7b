//! # sesg-metrics
//!
//! Reduces one remote result set into a [`PerformanceMetrics`] value:
//! fuzzy title matching against the QGS and GS, then snowball recall by
//! breadth-first traversal of the GS citation graph.
//!
//! [`PerformanceMetrics`]: sesg_core::entities::PerformanceMetrics

pub mod computer;
pub mod error;
pub mod graph;
pub mod similarity;

pub use computer::PerformanceComputer;
pub use error::MetricsError;
pub use graph::{CitationGraph, Traversal};
pub use similarity::{SimilarityMatcher, normalize_title};
