//! Out-of-band correction of suspicious performances.
//!
//! A performance with zero results or zero precision may stem from a string
//! the remote silently mishandled. Page 1 of each such string is requested
//! again; if the remote now rejects the string, the performance is flagged
//! invalid. Figures are never recomputed and rows are never deleted.

use sesg_core::enums::SkipReason;
use sesg_core::responses::FixInvalidSummary;
use sesg_db::service::SesgService;
use sesg_scopus::{CredentialPool, KeyLease, PageFailure, SearchClient};

use crate::coordinator::{FatalReason, SearchSettings};
use crate::error::SweepError;

/// How the remote answers page 1 of a string today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Accepted,
    Rejected(SkipReason),
}

pub struct Revalidator<'a, C> {
    client: C,
    pool: &'a CredentialPool,
    service: &'a SesgService,
    settings: SearchSettings,
}

impl<'a, C: SearchClient> Revalidator<'a, C> {
    pub const fn new(
        client: C,
        pool: &'a CredentialPool,
        service: &'a SesgService,
        settings: SearchSettings,
    ) -> Self {
        Self {
            client,
            pool,
            service,
            settings,
        }
    }

    /// Probe every suspicious performance, optionally of one experiment,
    /// and flag those whose string is now rejected.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Aborted`] when the retry budget or the API keys
    /// run out; flags set before the failure stay set.
    pub async fn fix_invalid(&self, experiment_id: Option<&str>) -> Result<FixInvalidSummary, SweepError> {
        let suspicious = self.service.suspicious_performances(experiment_id).await?;
        tracing::info!(candidates = suspicious.len(), "revalidating suspicious performances");

        let mut lease = None;
        let mut flagged = Vec::new();
        for (performance, search_string) in &suspicious {
            match self.probe(&mut lease, &search_string.string).await? {
                Probe::Accepted => {
                    tracing::debug!(search_string = %search_string.id, "still accepted");
                }
                Probe::Rejected(reason) => {
                    tracing::warn!(
                        performance = %performance.id,
                        search_string = %search_string.id,
                        %reason,
                        "performance flagged invalid"
                    );
                    self.service.flag_performance_invalid(&performance.id).await?;
                    flagged.push(performance.id.clone());
                }
            }
        }

        Ok(FixInvalidSummary {
            checked: suspicious.len() as u64,
            flagged,
        })
    }

    /// Request page 1 of `query`, retrying timeouts within the budget and
    /// rotating expired keys.
    async fn probe(&self, lease: &mut Option<KeyLease>, query: &str) -> Result<Probe, SweepError> {
        let budget = self.settings.timeout_retries;
        let mut timeouts = 0;
        loop {
            let current = match lease {
                Some(current) => current.clone(),
                None => {
                    let acquired = self
                        .pool
                        .acquire()
                        .ok_or(SweepError::Aborted(FatalReason::OutOfApiKeys))?;
                    *lease = Some(acquired.clone());
                    acquired
                }
            };
            match self.client.fetch_page(query, 1, &current.key).await {
                Ok(_) => return Ok(Probe::Accepted),
                Err(PageFailure::UnprocessableQuery) => {
                    return Ok(Probe::Rejected(SkipReason::UnprocessableQuery));
                }
                Err(PageFailure::PayloadTooLarge) => {
                    return Ok(Probe::Rejected(SkipReason::PayloadTooLarge));
                }
                Err(PageFailure::KeyExpired) => {
                    timeouts = 0;
                    let next = self
                        .pool
                        .rotate(&current)
                        .ok_or(SweepError::Aborted(FatalReason::OutOfApiKeys))?;
                    *lease = Some(next);
                }
                Err(PageFailure::Timeout) => {
                    timeouts += 1;
                    if timeouts > budget {
                        return Err(SweepError::Aborted(FatalReason::RetriesExhausted {
                            client: 0,
                            budget,
                        }));
                    }
                    let delay = self.settings.backoff(timeouts);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
