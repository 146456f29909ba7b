//! Multi-client search coordinator.
//!
//! Pending strings are split round-robin into one static partition per
//! client. Every client works through its partition on the same task
//! (`join_all`), one string at a time and one page at a time:
//!
//! ```text
//! queued → fetching page ─┬─ more pages  → fetching page
//!                         ├─ final page  → complete (performance persisted)
//!                         ├─ timeout     → retry same page (budgeted)
//!                         ├─ key expired → rotate key, retry same page
//!                         ├─ rejected    → skipped (client continues)
//!                         └─ budget/keys exhausted → fatal (all clients stop)
//! ```
//!
//! A fatal termination raises a shared stop flag. No client dispatches a
//! new request afterwards and the pages accumulated for an unfinished
//! string are dropped. Performances already committed stay.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;

use sesg_config::{ScopusConfig, SesgConfig};
use sesg_core::entities::SearchString;
use sesg_core::enums::SkipReason;
use sesg_core::responses::SearchSummary;
use sesg_db::service::SesgService;
use sesg_metrics::PerformanceComputer;
use sesg_scopus::{CredentialPool, KeyLease, PageFailure, SearchClient};

use crate::error::SweepError;
use crate::events::{EventSink, SearchEvent};

/// Retry policy of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Consecutive timeouts one client tolerates. One more is fatal.
    pub timeout_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl SearchSettings {
    #[must_use]
    pub fn from_config(config: &ScopusConfig) -> Self {
        Self {
            timeout_retries: config.timeout_retries,
            backoff_base: config.backoff_base(),
            backoff_max: config.backoff_max(),
        }
    }

    /// Delay before retry number `attempt` (1-based): the base doubled per
    /// attempt, capped at the maximum.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.backoff_base.is_zero() {
            return Duration::ZERO;
        }
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_max)
    }
}

/// Why a run was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReason {
    /// A client timed out more times in a row than the budget allows.
    RetriesExhausted { client: usize, budget: u32 },
    /// Every API key was reported expired.
    OutOfApiKeys,
    /// A completed or skipped string could not be recorded.
    Store(String),
}

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted { client, budget } => {
                write!(f, "client {client} exceeded {budget} consecutive timeout retries")
            }
            Self::OutOfApiKeys => f.write_str("ran out of API keys"),
            Self::Store(e) => write!(f, "store failure: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Completed,
    Fatal(FatalReason),
}

impl Termination {
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Fatal(reason) => write!(f, "fatal: {reason}"),
        }
    }
}

/// Outcome of one coordinator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    /// Strings handed to the run.
    pub pending: usize,
    /// Strings whose performance is now recorded.
    pub completed: usize,
    pub skipped: usize,
    pub termination: Termination,
}

impl SearchReport {
    #[must_use]
    pub fn to_summary(&self, experiment: &str, n_clients: usize) -> SearchSummary {
        SearchSummary {
            experiment: experiment.to_string(),
            n_clients: n_clients as u64,
            pending: self.pending as u64,
            completed: self.completed as u64,
            skipped: self.skipped as u64,
            termination: self.termination.to_string(),
        }
    }
}

/// Split `strings` into `n` partitions, string `i` going to partition
/// `i % n`. Partitions may be empty.
#[must_use]
pub fn partition<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let mut partitions: Vec<Vec<T>> = (0..n).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        partitions[i % n].push(item);
    }
    partitions
}

/// Shared state of one run.
#[derive(Default)]
struct RunState {
    stop: AtomicBool,
    fatal: OnceLock<FatalReason>,
    done: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
}

impl RunState {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

enum Outcome {
    Complete(Vec<String>),
    Skipped(SkipReason),
    Fatal(FatalReason),
    Stopped,
}

/// Per-client cursor state. The lease survives across the client's
/// strings; the timeout streak ends at any other answer and at the next
/// string.
struct ClientState {
    index: usize,
    lease: Option<KeyLease>,
    consecutive_timeouts: u32,
}

pub struct Coordinator<'a, C> {
    clients: Vec<C>,
    pool: &'a CredentialPool,
    service: &'a SesgService,
    computer: &'a PerformanceComputer,
    settings: SearchSettings,
    events: EventSink,
}

impl<'a, C: SearchClient> Coordinator<'a, C> {
    /// # Errors
    ///
    /// Returns [`SweepError::Config`] if `clients` is empty.
    pub fn new(
        clients: Vec<C>,
        pool: &'a CredentialPool,
        service: &'a SesgService,
        computer: &'a PerformanceComputer,
        settings: SearchSettings,
    ) -> Result<Self, SweepError> {
        if clients.is_empty() {
            return Err(SweepError::Config(sesg_config::ConfigError::InvalidValue {
                field: "scopus.n_clients".into(),
                reason: "must be positive".into(),
            }));
        }
        Ok(Self {
            clients,
            pool,
            service,
            computer,
            settings,
            events: EventSink::none(),
        })
    }

    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn n_clients(&self) -> usize {
        self.clients.len()
    }

    /// Search every string once and persist the outcome.
    pub async fn run(&self, strings: Vec<SearchString>) -> SearchReport {
        let pending = strings.len();
        let state = RunState::default();
        tracing::info!(pending, clients = self.clients.len(), "search run started");

        let partitions = partition(strings, self.clients.len());
        let workers = self
            .clients
            .iter()
            .zip(partitions)
            .enumerate()
            .map(|(index, (client, strings))| self.worker(&state, index, client, strings));
        join_all(workers).await;

        let termination = match state.fatal.get() {
            Some(reason) => Termination::Fatal(reason.clone()),
            None => Termination::Completed,
        };
        let report = SearchReport {
            pending,
            completed: state.completed.load(Ordering::Acquire),
            skipped: state.skipped.load(Ordering::Acquire),
            termination,
        };
        tracing::info!(
            completed = report.completed,
            skipped = report.skipped,
            termination = %report.termination,
            "search run finished"
        );
        report
    }

    async fn worker(&self, state: &RunState, index: usize, client: &C, strings: Vec<SearchString>) {
        let assigned = strings.len();
        let mut cursor = ClientState {
            index,
            lease: None,
            consecutive_timeouts: 0,
        };

        for (position, search_string) in strings.iter().enumerate() {
            if state.stopped() {
                return;
            }
            self.events.emit(SearchEvent::ClientAssigned {
                client: index,
                search_string_id: search_string.id.clone(),
                position,
                assigned,
            });

            let outcome = self.search_one(state, &mut cursor, client, search_string).await;
            let settled = match outcome {
                Outcome::Complete(titles) => self.complete(state, index, search_string, &titles).await,
                Outcome::Skipped(reason) => self.skip(state, index, search_string, reason).await,
                Outcome::Fatal(reason) => Err(reason),
                Outcome::Stopped => return,
            };
            if let Err(reason) = settled {
                self.abort(state, index, reason);
                return;
            }
        }
    }

    /// Fetch every page of one string.
    async fn search_one(
        &self,
        state: &RunState,
        cursor: &mut ClientState,
        client: &C,
        search_string: &SearchString,
    ) -> Outcome {
        let budget = self.settings.timeout_retries;
        let mut titles = Vec::new();
        let mut page_number = 1;
        cursor.consecutive_timeouts = 0;

        loop {
            if state.stopped() {
                return Outcome::Stopped;
            }
            let lease = match &cursor.lease {
                Some(lease) => lease.clone(),
                None => match self.pool.acquire() {
                    Some(lease) => {
                        cursor.lease = Some(lease.clone());
                        lease
                    }
                    None => return Outcome::Fatal(FatalReason::OutOfApiKeys),
                },
            };

            let answer = client
                .fetch_page(&search_string.string, page_number, &lease.key)
                .await;
            if !matches!(answer, Err(PageFailure::Timeout)) {
                cursor.consecutive_timeouts = 0;
            }
            match answer {
                Ok(page) => {
                    tracing::debug!(
                        client = cursor.index,
                        search_string = %search_string.id,
                        page = page.number,
                        n_pages = page.n_pages,
                        entries = page.entries.len(),
                        "page received"
                    );
                    self.events.emit(SearchEvent::PageReceived {
                        client: cursor.index,
                        search_string_id: search_string.id.clone(),
                        page: page.number,
                        n_pages: page.n_pages,
                    });
                    let last = page.is_final();
                    titles.extend(page.entries.into_iter().map(|e| e.title));
                    if last {
                        return Outcome::Complete(titles);
                    }
                    page_number += 1;
                }
                Err(PageFailure::Timeout) => {
                    cursor.consecutive_timeouts += 1;
                    if cursor.consecutive_timeouts > budget {
                        return Outcome::Fatal(FatalReason::RetriesExhausted {
                            client: cursor.index,
                            budget,
                        });
                    }
                    let attempts_left = budget - cursor.consecutive_timeouts;
                    tracing::debug!(
                        client = cursor.index,
                        search_string = %search_string.id,
                        page = page_number,
                        attempts_left,
                        "page timed out"
                    );
                    self.events.emit(SearchEvent::RetryOccurred {
                        client: cursor.index,
                        search_string_id: search_string.id.clone(),
                        attempts_left,
                    });
                    let delay = self.settings.backoff(cursor.consecutive_timeouts);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(PageFailure::KeyExpired) => match self.pool.rotate(&lease) {
                    Some(next) => {
                        self.events.emit(SearchEvent::KeyRotated {
                            client: cursor.index,
                            key_index: next.index,
                        });
                        cursor.lease = Some(next);
                    }
                    None => return Outcome::Fatal(FatalReason::OutOfApiKeys),
                },
                Err(PageFailure::UnprocessableQuery) => {
                    return Outcome::Skipped(SkipReason::UnprocessableQuery);
                }
                Err(PageFailure::PayloadTooLarge) => {
                    return Outcome::Skipped(SkipReason::PayloadTooLarge);
                }
            }
        }
    }

    async fn complete(
        &self,
        state: &RunState,
        client: usize,
        search_string: &SearchString,
        titles: &[String],
    ) -> Result<(), FatalReason> {
        let metrics = self.computer.compute(titles);
        let n_results = metrics.n_results;
        match self
            .service
            .record_performance(&search_string.id, &metrics)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => tracing::debug!(
                search_string = %search_string.id,
                "performance already recorded"
            ),
            Err(e) => return Err(FatalReason::Store(e.to_string())),
        }
        state.completed.fetch_add(1, Ordering::AcqRel);
        let done = state.done.fetch_add(1, Ordering::AcqRel) + 1;
        self.events.emit(SearchEvent::StringCompleted {
            client,
            search_string_id: search_string.id.clone(),
            n_results,
            done,
        });
        Ok(())
    }

    async fn skip(
        &self,
        state: &RunState,
        client: usize,
        search_string: &SearchString,
        reason: SkipReason,
    ) -> Result<(), FatalReason> {
        tracing::warn!(
            client,
            search_string = %search_string.id,
            %reason,
            "search string skipped"
        );
        self.service
            .record_skip(&search_string.id, reason)
            .await
            .map_err(|e| FatalReason::Store(e.to_string()))?;
        state.skipped.fetch_add(1, Ordering::AcqRel);
        let done = state.done.fetch_add(1, Ordering::AcqRel) + 1;
        self.events.emit(SearchEvent::StringSkipped {
            client,
            search_string_id: search_string.id.clone(),
            reason,
            done,
        });
        Ok(())
    }

    fn abort(&self, state: &RunState, client: usize, reason: FatalReason) {
        state.stop.store(true, Ordering::Release);
        tracing::error!(client, %reason, "search run aborted");
        // First fatal classification wins.
        let _ = state.fatal.set(reason.clone());
        self.events
            .emit(SearchEvent::CoordinatorFatal { client, reason });
    }
}

/// What `sesg experiment search` runs.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub experiment_name: &'a str,
    pub retry_skipped: bool,
}

/// Load the pending strings of an experiment and run them through
/// `clients`.
///
/// # Errors
///
/// Returns [`SweepError`] if the configuration is incomplete for a search,
/// the experiment is unknown, or the metric inputs cannot be loaded. A
/// fatal termination of the run itself is reported in the returned
/// [`SearchReport`].
pub async fn search_experiment<C: SearchClient>(
    service: &SesgService,
    config: &SesgConfig,
    clients: Vec<C>,
    request: SearchRequest<'_>,
    events: EventSink,
) -> Result<SearchReport, SweepError> {
    config.validate_for_search()?;
    let experiment = service
        .get_experiment_by_name(request.experiment_name)
        .await?;
    let pool = CredentialPool::new(config.scopus.usable_keys())?;
    let computer = PerformanceComputer::from_service(
        service,
        &experiment.id,
        &experiment.review_id,
        config.metrics.similarity_threshold,
    )
    .await?;
    let strings = service
        .pending_search_strings(&experiment.id, request.retry_skipped)
        .await?;

    let coordinator = Coordinator::new(
        clients,
        &pool,
        service,
        &computer,
        SearchSettings::from_config(&config.scopus),
    )?
    .with_events(events);
    Ok(coordinator.run(strings).await)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sesg_core::enums::SearchStringStatus;
    use sesg_db::repos::review::{ReviewImport, StudyImport};
    use sesg_scopus::{Entry, Page};
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    /// Answers from a fixed script and records every request.
    #[derive(Default)]
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<Page, PageFailure>>>,
        calls: Mutex<Vec<(String, u32, String)>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<Page, PageFailure>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<(String, u32, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SearchClient for &ScriptedClient {
        async fn fetch_page(&self, query: &str, page: u32, api_key: &str) -> Result<Page, PageFailure> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), page, api_key.to_string()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(page_of(page, page, &[])))
        }
    }

    fn page_of(number: u32, n_pages: u32, titles: &[&str]) -> Page {
        Page {
            number,
            n_pages,
            total_results: titles.len() as u64,
            entries: titles
                .iter()
                .map(|t| Entry {
                    title: (*t).to_string(),
                    doi: None,
                    eid: None,
                })
                .collect(),
        }
    }

    fn settings(timeout_retries: u32) -> SearchSettings {
        SearchSettings {
            timeout_retries,
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
        }
    }

    fn keys(n: usize) -> CredentialPool {
        CredentialPool::new((0..n).map(|i| format!("key-{i}")).collect()).unwrap()
    }

    struct Fixture {
        service: SesgService,
        computer: PerformanceComputer,
    }

    impl Fixture {
        async fn new() -> Self {
            let service = SesgService::new_local(":memory:").await.unwrap();
            let review = service
                .import_review(&ReviewImport {
                    name: "slr".into(),
                    min_publication_year: None,
                    max_publication_year: None,
                    studies: vec![
                        study("A", "Mutation testing at scale", &["B"]),
                        study("B", "Flaky test detection", &[]),
                    ],
                })
                .await
                .unwrap()
                .review;
            let (experiment, _) = service
                .get_or_create_experiment("exp", &review.id, 1)
                .await
                .unwrap();
            let computer = PerformanceComputer::from_service(&service, &experiment.id, &review.id, 0.85)
                .await
                .unwrap();
            Self { service, computer }
        }

        async fn strings(&self, texts: &[&str]) -> Vec<SearchString> {
            let mut strings = Vec::new();
            for text in texts {
                strings.push(self.service.get_or_create_search_string(text).await.unwrap().0);
            }
            strings
        }
    }

    fn study(key: &str, title: &str, references: &[&str]) -> StudyImport {
        StudyImport {
            key: key.into(),
            title: title.into(),
            abstract_text: String::new(),
            keywords: String::new(),
            references: references.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    #[test]
    fn partitions_are_round_robin() {
        let parts = partition((0..7).collect(), 3);
        assert_eq!(parts, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
        assert_eq!(partition(vec![1], 3)[2], Vec::<i32>::new());
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 200)]
    #[case(3, 400)]
    #[case(10, 1000)]
    fn backoff_doubles_up_to_the_cap(#[case] attempt: u32, #[case] millis: u64) {
        let settings = SearchSettings {
            timeout_retries: 10,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(1),
        };
        assert_eq!(settings.backoff(attempt), Duration::from_millis(millis));
    }

    #[test]
    fn zero_base_never_sleeps() {
        assert_eq!(settings(3).backoff(5), Duration::ZERO);
    }

    #[tokio::test]
    async fn pages_accumulate_until_the_final_one() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![
            Ok(page_of(1, 2, &["Mutation testing at scale", "Unrelated"])),
            Ok(page_of(2, 2, &["Flaky test detection"])),
        ]);
        let pool = keys(1);
        let strings = fx.strings(&["q1"]).await;
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(0)).unwrap();

        let report = coordinator.run(strings.clone()).await;

        assert_eq!(report.termination, Termination::Completed);
        assert_eq!(report.completed, 1);
        let pages: Vec<u32> = client.calls().iter().map(|c| c.1).collect();
        assert_eq!(pages, vec![1, 2]);
        let perf = fx
            .service
            .find_performance_for_string(&strings[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(perf.metrics.n_results, 3);
        assert_eq!(perf.metrics.gs_in_results.len(), 2);
    }

    #[tokio::test]
    async fn eleventh_consecutive_timeout_is_fatal() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![Err(PageFailure::Timeout); 11]);
        let pool = keys(1);
        let strings = fx.strings(&["q1", "q2"]).await;
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(10)).unwrap();

        let report = coordinator.run(strings.clone()).await;

        assert_eq!(
            report.termination,
            Termination::Fatal(FatalReason::RetriesExhausted { client: 0, budget: 10 })
        );
        assert_eq!(report.completed, 0);
        let calls = client.calls();
        assert_eq!(calls.len(), 11);
        assert!(calls.iter().all(|(query, page, _)| query == "q1" && *page == 1));
        for s in &strings {
            assert!(fx.service.find_performance_for_string(&s.id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn timeout_count_resets_on_success() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![
            Err(PageFailure::Timeout),
            Ok(page_of(1, 2, &["x"])),
            Err(PageFailure::Timeout),
            Ok(page_of(2, 2, &["y"])),
        ]);
        let pool = keys(1);
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(1)).unwrap();

        let report = coordinator.run(fx.strings(&["q1"]).await).await;

        assert_eq!(report.termination, Termination::Completed);
        assert_eq!(client.calls().len(), 4);
    }

    #[tokio::test]
    async fn expired_key_rotates_and_reissues_the_page() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![Err(PageFailure::KeyExpired), Ok(page_of(1, 1, &["x"]))]);
        let pool = keys(2);
        let (tx, mut rx) = unbounded_channel();
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(0))
            .unwrap()
            .with_events(EventSink::new(tx));

        let report = coordinator.run(fx.strings(&["q1"]).await).await;
        drop(coordinator);

        assert_eq!(report.completed, 1);
        let keys: Vec<String> = client.calls().into_iter().map(|c| c.2).collect();
        assert_eq!(keys, vec!["key-0".to_string(), "key-1".to_string()]);
        assert_eq!(pool.available(), 1);

        let mut rotated = false;
        while let Ok(event) = rx.try_recv() {
            rotated |= event == SearchEvent::KeyRotated { client: 0, key_index: 1 };
        }
        assert!(rotated);
    }

    #[tokio::test]
    async fn exhausted_pool_is_fatal() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![Err(PageFailure::KeyExpired)]);
        let pool = keys(1);
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(0)).unwrap();

        let report = coordinator.run(fx.strings(&["q1", "q2"]).await).await;

        assert_eq!(report.termination, Termination::Fatal(FatalReason::OutOfApiKeys));
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn rejected_string_is_skipped_and_the_client_continues() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![
            Err(PageFailure::UnprocessableQuery),
            Ok(page_of(1, 1, &["x"])),
        ]);
        let pool = keys(1);
        let strings = fx.strings(&["bad", "good"]).await;
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(0)).unwrap();

        let report = coordinator.run(strings.clone()).await;

        assert_eq!(report.termination, Termination::Completed);
        assert_eq!((report.completed, report.skipped), (1, 1));
        let bad = fx.service.get_search_string(&strings[0].id).await.unwrap();
        assert_eq!(bad.status, SearchStringStatus::Skipped);
        assert_eq!(bad.skip_reason, Some(SkipReason::UnprocessableQuery));
        assert!(fx.service.find_performance_for_string(&bad.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fatal_keeps_committed_performances_and_discards_the_unfinished_string() {
        let fx = Fixture::new().await;
        let mut failing = vec![
            // q1 completes
            Ok(page_of(1, 1, &["Flaky test detection"])),
            // q3 gets one page of three, then times out past the budget
            Ok(page_of(1, 3, &["x"])),
        ];
        failing.extend(std::iter::repeat_n(Err(PageFailure::Timeout), 3));
        let first = ScriptedClient::new(failing);
        let second = ScriptedClient::new(Vec::new());
        let pool = keys(2);
        // odd strings go to the first client, even ones to the second
        let names: Vec<String> = (1..=10).map(|i| format!("q{i}")).collect();
        let texts: Vec<&str> = names.iter().map(String::as_str).collect();
        let strings = fx.strings(&texts).await;
        let coordinator = Coordinator::new(vec![&first, &second], &pool, &fx.service, &fx.computer, settings(2)).unwrap();

        let report = coordinator.run(strings.clone()).await;

        assert_eq!(
            report.termination,
            Termination::Fatal(FatalReason::RetriesExhausted { client: 0, budget: 2 })
        );

        let kept = fx
            .service
            .find_performance_for_string(&strings[0].id)
            .await
            .unwrap()
            .expect("performance committed before the fatal stays");
        assert_eq!(kept.metrics.n_results, 1);
        assert_eq!(kept.metrics.gs_in_results.len(), 1);
        assert_eq!(
            fx.service.get_search_string(&strings[0].id).await.unwrap().status,
            SearchStringStatus::Processed
        );

        let unfinished = &strings[2];
        assert!(fx.service.find_performance_for_string(&unfinished.id).await.unwrap().is_none());
        assert_eq!(
            fx.service.get_search_string(&unfinished.id).await.unwrap().status,
            SearchStringStatus::Pending
        );
        for later in [&strings[4], &strings[6], &strings[8]] {
            assert!(fx.service.find_performance_for_string(&later.id).await.unwrap().is_none());
        }

        // the second client stopped before finishing its five strings
        assert!(second.calls().len() < 5);
        assert_eq!(report.completed, 1 + second.calls().len());
    }

    #[tokio::test]
    async fn timeout_streak_ends_with_a_rejected_string() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![
            Err(PageFailure::Timeout),
            Err(PageFailure::Timeout),
            Err(PageFailure::UnprocessableQuery),
            Err(PageFailure::Timeout),
            Ok(page_of(1, 1, &["x"])),
        ]);
        let pool = keys(1);
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(2)).unwrap();

        let report = coordinator.run(fx.strings(&["q1", "q2"]).await).await;

        assert_eq!(report.termination, Termination::Completed);
        assert_eq!((report.completed, report.skipped), (1, 1));
    }

    #[tokio::test]
    async fn timeout_streak_ends_with_a_key_rotation() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(vec![
            Err(PageFailure::Timeout),
            Err(PageFailure::KeyExpired),
            Err(PageFailure::Timeout),
            Ok(page_of(1, 1, &["x"])),
        ]);
        let pool = keys(2);
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(1)).unwrap();

        let report = coordinator.run(fx.strings(&["q1"]).await).await;

        assert_eq!(report.termination, Termination::Completed);
        assert_eq!(report.completed, 1);
    }

    #[tokio::test]
    async fn a_string_is_recorded_at_most_once() {
        let fx = Fixture::new().await;
        let client = ScriptedClient::new(Vec::new());
        let pool = keys(1);
        let strings = fx.strings(&["q1"]).await;
        let coordinator = Coordinator::new(vec![&client], &pool, &fx.service, &fx.computer, settings(0)).unwrap();

        coordinator.run(strings.clone()).await;
        let first = fx.service.find_performance_for_string(&strings[0].id).await.unwrap().unwrap();
        coordinator.run(strings.clone()).await;
        let second = fx.service.find_performance_for_string(&strings[0].id).await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn empty_client_list_is_rejected() {
        let pool = keys(1);
        let fx = Fixture::new().await;
        let clients: Vec<&ScriptedClient> = Vec::new();
        assert!(matches!(
            Coordinator::new(clients, &pool, &fx.service, &fx.computer, settings(0)),
            Err(SweepError::Config(_))
        ));
    }
}
