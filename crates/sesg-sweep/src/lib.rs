//! # sesg-sweep
//!
//! The experiment pipeline between configuration and stored performances:
//!
//! - [`planner`] expands the configured parameter lists into parameter sets,
//!   creating only the combinations not yet stored.
//! - [`generation`] turns each unformulated parameter set into a search
//!   string through the external topic and word providers.
//! - [`coordinator`] runs pending strings through several remote clients
//!   and persists one performance per completed string.
//! - [`revalidation`] re-checks suspicious performances and flags the ones
//!   the remote now rejects.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod formulation;
pub mod generation;
pub mod planner;
pub mod providers;
pub mod revalidation;

pub use error::{ProviderError, SweepError};
pub use events::SearchEvent;
