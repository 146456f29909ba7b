use std::sync::OnceLock;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sesg_sweep::SearchEvent;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::ui;

pub struct Progress {
    bar: Option<ProgressBar>,
}

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(MultiProgress::new)
}

fn bar_template() -> &'static str {
    match ui::prefs().term_width {
        Some(cols) if cols >= 110 => "{prefix:>9} {bar:40.cyan/blue} {pos}/{len} {msg}",
        Some(cols) if cols >= 80 => "{prefix:>9} {wide_bar:.cyan/blue} {pos}/{len} {msg}",
        _ => "{prefix:>9} {wide_bar:.cyan/blue} {percent}% {msg}",
    }
}

impl Progress {
    #[must_use]
    pub fn spinner(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = multi_progress().add(ProgressBar::new_spinner());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    #[must_use]
    pub fn bar(total: u64, prefix: &str) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = multi_progress().add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(bar_template())
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix(prefix.to_string());
        Self { bar: Some(bar) }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    pub fn set_length(&self, len: u64) {
        if let Some(bar) = &self.bar {
            bar.set_length(len);
        }
    }

    pub fn inc_length(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc_length(delta);
        }
    }

    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    pub fn finish_ok(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    pub fn finish_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn finish_err(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}

/// Counts shown at the end of a run, kept even when bars are hidden.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub assigned: u64,
    pub completed: u64,
    pub skipped: u64,
    pub rotations: u64,
    pub retries: u64,
}

/// One bar per client plus an overall bar, fed from coordinator events.
pub struct SearchProgress {
    overall: Progress,
    clients: Vec<Progress>,
    tally: Tally,
}

impl SearchProgress {
    #[must_use]
    pub fn new(n_clients: usize) -> Self {
        let overall = Progress::bar(0, "overall");
        let clients = (0..n_clients)
            .map(|client| Progress::bar(0, &format!("client {client}")))
            .collect();
        Self {
            overall,
            clients,
            tally: Tally::default(),
        }
    }

    /// Consume events until every sender is dropped.
    pub async fn drive(mut self, mut events: UnboundedReceiver<SearchEvent>) -> Tally {
        while let Some(event) = events.recv().await {
            self.apply(&event);
        }
        self.finish();
        self.tally
    }

    fn client(&self, index: usize) -> Option<&Progress> {
        self.clients.get(index)
    }

    pub fn apply(&mut self, event: &SearchEvent) {
        match event {
            SearchEvent::ClientAssigned {
                client,
                search_string_id,
                position,
                assigned,
            } => {
                if *position == 0 {
                    let assigned = *assigned as u64;
                    self.tally.assigned += assigned;
                    self.overall.inc_length(assigned);
                    if let Some(bar) = self.client(*client) {
                        bar.set_length(assigned);
                    }
                }
                if let Some(bar) = self.client(*client) {
                    bar.set_message(search_string_id);
                }
            }
            SearchEvent::PageReceived {
                client,
                search_string_id,
                page,
                n_pages,
            } => {
                if let Some(bar) = self.client(*client) {
                    bar.set_message(&format!("{search_string_id} page {page}/{n_pages}"));
                }
            }
            SearchEvent::KeyRotated { client, key_index } => {
                self.tally.rotations += 1;
                if let Some(bar) = self.client(*client) {
                    bar.set_message(&format!("switched to API key #{key_index}"));
                }
            }
            SearchEvent::RetryOccurred {
                client,
                attempts_left,
                ..
            } => {
                self.tally.retries += 1;
                if let Some(bar) = self.client(*client) {
                    bar.set_message(&format!("timeout, {attempts_left} retries left"));
                }
            }
            SearchEvent::StringCompleted { client, .. } => {
                self.tally.completed += 1;
                self.advance(*client);
            }
            SearchEvent::StringSkipped { client, reason, .. } => {
                self.tally.skipped += 1;
                self.overall.set_message(&format!("last skip: {reason}"));
                self.advance(*client);
            }
            SearchEvent::CoordinatorFatal { reason, .. } => {
                let message = format!("aborted: {reason}");
                for bar in &self.clients {
                    bar.finish_err(&message);
                }
                self.overall.finish_err(&message);
            }
        }
    }

    fn advance(&self, client: usize) {
        if let Some(bar) = self.client(client) {
            bar.inc(1);
        }
        self.overall.inc(1);
    }

    fn finish(&self) {
        for bar in &self.clients {
            bar.finish_clear();
        }
        self.overall.finish_ok(&format!(
            "{} completed, {} skipped",
            self.tally.completed, self.tally.skipped
        ));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sesg_core::enums::SkipReason;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    #[tokio::test]
    async fn tally_follows_the_event_stream() {
        let (tx, rx) = unbounded_channel();
        let events = [
            SearchEvent::ClientAssigned {
                client: 0,
                search_string_id: "sst-1".into(),
                position: 0,
                assigned: 2,
            },
            SearchEvent::ClientAssigned {
                client: 1,
                search_string_id: "sst-2".into(),
                position: 0,
                assigned: 1,
            },
            SearchEvent::RetryOccurred {
                client: 0,
                search_string_id: "sst-1".into(),
                attempts_left: 9,
            },
            SearchEvent::StringCompleted {
                client: 0,
                search_string_id: "sst-1".into(),
                n_results: 10,
                done: 1,
            },
            SearchEvent::StringSkipped {
                client: 1,
                search_string_id: "sst-2".into(),
                reason: SkipReason::PayloadTooLarge,
                done: 2,
            },
        ];
        for event in events {
            tx.send(event).unwrap();
        }
        drop(tx);

        let tally = SearchProgress::new(2).drive(rx).await;
        assert_eq!(
            tally,
            Tally {
                assigned: 3,
                completed: 1,
                skipped: 1,
                rotations: 0,
                retries: 1,
            }
        );
    }

    #[test]
    fn events_for_unknown_clients_are_ignored() {
        let mut progress = SearchProgress::new(1);
        progress.apply(&SearchEvent::KeyRotated {
            client: 7,
            key_index: 1,
        });
        assert_eq!(progress.tally.rotations, 1);
    }
}
