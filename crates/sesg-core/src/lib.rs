//! # sesg-core
//!
//! Core types, ID prefixes, and error types for the search-string experiment
//! runner.
//!
//! This crate provides the foundational types shared across all `sesg` crates:
//! - Entity structs for reviews, studies, experiments, parameter sets,
//!   search strings, performances, and cached similar words
//! - Strategy and status enums with their SQL string forms
//! - ID prefix constants
//! - Cross-cutting error types
//! - Read-only reporting rows

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;
