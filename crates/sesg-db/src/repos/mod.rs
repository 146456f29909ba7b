//! Repository modules. Each adds methods to `SesgService` via
//! `impl SesgService` blocks.

pub mod experiment;
pub mod params;
pub mod performance;
pub mod results;
pub mod review;
pub mod search_string;
pub mod similar_words;
