//! Fetch, reconcile and dispatch for one or many tracked shows.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::clients::{CatalogClient, FetchError};
use crate::config::TrackedShowEntry;
use crate::library::ScanError;
use crate::models::Show;

use super::dispatch::{DispatchReport, Dispatcher};
use super::reconcile::{Reconciler, Reconciliation};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("reconcile task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
pub struct ShowReport {
    pub show: Show,
    pub reconciliation: Reconciliation,
    pub dispatch: DispatchReport,
}

#[derive(Debug)]
pub struct ShowOutcome {
    pub title: String,
    pub url: String,
    pub result: Result<ShowReport, UpdateError>,
}

/// Results of `update_all`, sorted by show title.
#[derive(Debug, Default)]
pub struct UpdateSummary {
    pub outcomes: Vec<ShowOutcome>,
}

impl UpdateSummary {
    #[must_use]
    pub fn failed_shows(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.reports().map(|r| r.dispatch.queued().count()).sum()
    }

    #[must_use]
    pub fn failed_dispatches(&self) -> usize {
        self.reports().map(|r| r.dispatch.failed().count()).sum()
    }

    pub fn reports(&self) -> impl Iterator<Item = &ShowReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

/// Reconciles `show` against `base_dir` on the blocking pool.
pub async fn reconcile_show(
    reconciler: &Reconciler,
    mut show: Show,
    base_dir: PathBuf,
    include_all: bool,
) -> Result<(Show, Reconciliation), UpdateError> {
    let reconciler = reconciler.clone();
    let (show, result) = tokio::task::spawn_blocking(move || {
        let result = reconciler.reconcile(&mut show, &base_dir, include_all);
        (show, result)
    })
    .await?;

    Ok((show, result?))
}

#[derive(Clone)]
pub struct ShowUpdater {
    catalog: Arc<dyn CatalogClient>,
    reconciler: Reconciler,
    dispatcher: Dispatcher,
    max_concurrent: usize,
}

impl ShowUpdater {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        reconciler: Reconciler,
        dispatcher: Dispatcher,
        max_concurrent: usize,
    ) -> Self {
        Self {
            catalog,
            reconciler,
            dispatcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub async fn update_show(
        &self,
        show: Show,
        base_dir: &Path,
        include_all: bool,
    ) -> Result<ShowReport, UpdateError> {
        let (show, reconciliation) =
            reconcile_show(&self.reconciler, show, base_dir.to_path_buf(), include_all).await?;

        info!(
            show = %show.title,
            downloaded = reconciliation.downloaded,
            to_acquire = reconciliation.to_acquire.len(),
            "Updating show"
        );

        let dispatch = self
            .dispatcher
            .dispatch(reconciliation.to_acquire.clone(), base_dir)
            .await;

        Ok(ShowReport {
            show,
            reconciliation,
            dispatch,
        })
    }

    async fn update_entry(
        &self,
        entry: &TrackedShowEntry,
        base_dir: &Path,
        include_all: bool,
    ) -> Result<ShowReport, UpdateError> {
        let show = self.catalog.get_show(&entry.url).await?;
        self.update_show(show, base_dir, include_all).await
    }

    /// Updates every entry with bounded concurrency. A failing show is
    /// recorded in the summary and the others continue.
    pub async fn update_all(
        &self,
        entries: Vec<(TrackedShowEntry, PathBuf)>,
        include_all: bool,
    ) -> UpdateSummary {
        info!(
            event = "update_all_started",
            shows = entries.len(),
            concurrency = self.max_concurrent,
            "Updating all tracked shows"
        );

        let mut outcomes: Vec<ShowOutcome> = stream::iter(entries)
            .map(|(entry, base_dir)| async move {
                let result = self.update_entry(&entry, &base_dir, include_all).await;
                if let Err(e) = &result {
                    error!(
                        event = "show_update_failed",
                        show = %entry.title,
                        url = %entry.url,
                        error = %e,
                        "Failed to update show"
                    );
                }
                ShowOutcome {
                    title: entry.title,
                    url: entry.url,
                    result,
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        outcomes.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.url.cmp(&b.url)));
        let summary = UpdateSummary { outcomes };

        info!(
            event = "update_all_finished",
            failed_shows = summary.failed_shows(),
            queued = summary.queued(),
            failed_dispatches = summary.failed_dispatches(),
            "Finished updating tracked shows"
        );
        summary
    }
}
