//! Hands selected episodes to the download client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::clients::{AdapterError, DownloadAdapter, DownloadResult};
use crate::models::Episode;

#[derive(Clone)]
pub enum DispatchMode {
    Live(Arc<dyn DownloadAdapter>),

    /// Logs what would be enqueued without contacting the download client.
    DryRun,
}

impl std::fmt::Debug for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live(_) => f.write_str("Live"),
            Self::DryRun => f.write_str("DryRun"),
        }
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Queued(DownloadResult),
    Failed(AdapterError),
    Skipped,
}

#[derive(Debug)]
pub struct DispatchRecord {
    pub episode: Episode,
    pub target_dir: PathBuf,
    pub outcome: DispatchOutcome,
}

/// Per-episode results of one dispatch run, in the order given.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub records: Vec<DispatchRecord>,
}

impl DispatchReport {
    pub fn queued(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, DispatchOutcome::Queued(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, DispatchOutcome::Failed(_)))
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Directory a release is downloaded into: `<base>/<show>/Sxx`.
#[must_use]
pub fn target_dir(base_dir: &Path, episode: &Episode) -> PathBuf {
    base_dir
        .join(&episode.show_title)
        .join(episode.season_dir())
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    mode: DispatchMode,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(mode: DispatchMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        matches!(self.mode, DispatchMode::DryRun)
    }

    /// Enqueues each episode in turn. A failed enqueue is recorded and the
    /// remaining episodes are still attempted.
    pub async fn dispatch(&self, episodes: Vec<Episode>, base_dir: &Path) -> DispatchReport {
        let mut report = DispatchReport::default();

        for episode in episodes {
            let target_dir = target_dir(base_dir, &episode);
            let outcome = self.dispatch_one(&episode, &target_dir).await;
            report.records.push(DispatchRecord {
                episode,
                target_dir,
                outcome,
            });
        }

        report
    }

    async fn dispatch_one(&self, episode: &Episode, target_dir: &Path) -> DispatchOutcome {
        let adapter = match &self.mode {
            DispatchMode::Live(adapter) => adapter,
            DispatchMode::DryRun => {
                info!(
                    show = %episode.show_title,
                    season = episode.season,
                    episode = episode.episode,
                    target = %target_dir.display(),
                    "Dry run, would add episode"
                );
                return DispatchOutcome::Skipped;
            }
        };

        match adapter.enqueue(episode.locator(), target_dir).await {
            Ok(result) => {
                info!(
                    show = %episode.show_title,
                    season = episode.season,
                    episode = episode.episode,
                    id = result.id,
                    target = %target_dir.display(),
                    "Added episode"
                );
                DispatchOutcome::Queued(result)
            }
            Err(e) => {
                error!(
                    event = "episode_dispatch_failed",
                    show = %episode.show_title,
                    season = episode.season,
                    episode = episode.episode,
                    error = %e,
                    "Failed to add episode"
                );
                DispatchOutcome::Failed(e)
            }
        }
    }
}
