//! Progress events emitted by the search coordinator.
//!
//! Events are sent on an unbounded channel and never read back by the
//! coordinator; a dropped receiver is ignored.

use sesg_core::enums::SkipReason;
use tokio::sync::mpsc::UnboundedSender;

use crate::coordinator::FatalReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// A client starts searching a string. `position` is 0-based within
    /// the client's partition.
    ClientAssigned {
        client: usize,
        search_string_id: String,
        position: usize,
        assigned: usize,
    },
    PageReceived {
        client: usize,
        search_string_id: String,
        page: u32,
        n_pages: u32,
    },
    KeyRotated {
        client: usize,
        key_index: usize,
    },
    RetryOccurred {
        client: usize,
        search_string_id: String,
        attempts_left: u32,
    },
    StringCompleted {
        client: usize,
        search_string_id: String,
        n_results: u64,
        /// Strings finished by all clients so far.
        done: usize,
    },
    StringSkipped {
        client: usize,
        search_string_id: String,
        reason: SkipReason,
        done: usize,
    },
    CoordinatorFatal {
        client: usize,
        reason: FatalReason,
    },
}

/// Optional event sink.
#[derive(Debug, Clone, Default)]
pub struct EventSink(Option<UnboundedSender<SearchEvent>>);

impl EventSink {
    #[must_use]
    pub const fn new(sender: UnboundedSender<SearchEvent>) -> Self {
        Self(Some(sender))
    }

    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    pub fn emit(&self, event: SearchEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.send(event);
        }
    }
}
