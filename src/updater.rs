//! Background loop keeping every managed source's cache current.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::fetcher::Fetcher;
use crate::signal::ShutdownToken;

/// What the updater is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    Idle,
    Refreshing(&'static str),
}

/// Outcome of one pass over all sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub refreshed: Vec<&'static str>,
    pub fresh: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl UpdateReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Updater {
    fetchers: Vec<Arc<Fetcher>>,
    interval: Duration,
    state: watch::Sender<UpdaterState>,
}

impl Updater {
    pub fn new(fetchers: Vec<Arc<Fetcher>>, interval: Duration) -> Self {
        let (state, _) = watch::channel(UpdaterState::Idle);
        Self {
            fetchers,
            interval,
            state,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> UpdaterState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<UpdaterState> {
        self.state.subscribe()
    }

    /// One pass in registry order. A failing source never stops the pass.
    pub async fn run_once(&self) -> UpdateReport {
        let mut report = UpdateReport::default();

        for fetcher in &self.fetchers {
            let id = fetcher.id();
            // Missing cache: initial download, reported as refreshed or failed
            if !fetcher.cache_path().exists() {
                info!("Get initial file for {}", id);
                self.refresh(fetcher, &mut report).await;
                continue;
            }
            if !fetcher.needs_update().await {
                debug!("{} is up to date", id);
                report.fresh.push(id);
                continue;
            }
            info!("Updating Blocklister list {}", id);
            self.refresh(fetcher, &mut report).await;
        }

        report
    }

    /// Refetch every source regardless of age.
    pub async fn force_update(&self) -> UpdateReport {
        let mut report = UpdateReport::default();
        for fetcher in &self.fetchers {
            self.refresh(fetcher, &mut report).await;
        }
        report
    }

    async fn refresh(&self, fetcher: &Fetcher, report: &mut UpdateReport) {
        let id = fetcher.id();
        self.state.send_replace(UpdaterState::Refreshing(id));
        match fetcher.fetch().await {
            Ok(_) => report.refreshed.push(id),
            Err(e) => {
                error!("Failed to update {}: {}", id, e);
                report.failed.push((id, e.to_string()));
            }
        }
        self.state.send_replace(UpdaterState::Idle);
    }

    /// Run passes on a fixed tick until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between passes; a running fetch completes.
    pub async fn run(&self, shutdown: ShutdownToken) {
        info!(
            "Start Blocklister-Updater ({} lists, every {:?})",
            self.fetchers.len(),
            self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let report = self.run_once().await;
            if !report.refreshed.is_empty() || !report.failed.is_empty() {
                info!(
                    "Update pass: {} refreshed, {} fresh, {} failed",
                    report.refreshed.len(),
                    report.fresh.len(),
                    report.failed.len()
                );
            }
        }

        info!("Blocklister-Updater stopped");
    }

    /// Run the loop on its own task.
    pub fn spawn(self: Arc<Self>, shutdown: ShutdownToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
