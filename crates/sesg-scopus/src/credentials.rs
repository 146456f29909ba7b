//! API key pool shared by all clients of a run.
//!
//! Keys are handed out round-robin. A key reported expired is never handed
//! out again; once every key is expired the pool is exhausted.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::ClientError;

/// A key handed to one client, with its position in the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLease {
    pub index: usize,
    pub key: String,
}

pub struct CredentialPool {
    keys: Vec<String>,
    expired: Vec<AtomicBool>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// # Errors
    ///
    /// Returns [`ClientError::NoApiKeys`] if `keys` is empty.
    pub fn new(keys: Vec<String>) -> Result<Self, ClientError> {
        if keys.is_empty() {
            return Err(ClientError::NoApiKeys);
        }
        let expired = keys.iter().map(|_| AtomicBool::new(false)).collect();
        Ok(Self {
            keys,
            expired,
            cursor: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Next key that is not expired, or `None` when all are.
    #[must_use]
    pub fn acquire(&self) -> Option<KeyLease> {
        let n = self.keys.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        (0..n)
            .map(|offset| (start + offset) % n)
            .find(|&index| !self.expired[index].load(Ordering::Acquire))
            .map(|index| KeyLease {
                index,
                key: self.keys[index].clone(),
            })
    }

    /// Mark `lease` expired and acquire a replacement.
    #[must_use]
    pub fn rotate(&self, lease: &KeyLease) -> Option<KeyLease> {
        self.expired[lease.index].store(true, Ordering::Release);
        tracing::warn!(key_index = lease.index, "API key expired");
        self.acquire()
    }

    /// Keys not yet reported expired.
    #[must_use]
    pub fn available(&self) -> usize {
        self.expired
            .iter()
            .filter(|e| !e.load(Ordering::Acquire))
            .count()
    }
}
