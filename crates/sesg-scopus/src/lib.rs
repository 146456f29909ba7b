//! # sesg-scopus
//!
//! Remote search client used by the search coordinator.
//!
//! A search is a sequence of page requests. Every request either returns a
//! [`Page`] or fails with one [`PageFailure`] class; the coordinator decides
//! what each class means for the run. [`ScopusClient`] is the production
//! implementation over the Scopus Search API; tests drive the coordinator
//! with scripted [`SearchClient`]s instead.

mod client;
mod credentials;
mod error;
mod http;
mod scopus;

pub use client::{Entry, Page, SearchClient};
pub use credentials::{CredentialPool, KeyLease};
pub use error::{ClientError, PageFailure};
pub use scopus::ScopusClient;
