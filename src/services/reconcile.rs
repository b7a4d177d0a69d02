//! Decides which catalog releases of a show still need to be acquired.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::library::{LocalInventory, ScanError, fuzzy_match, scan};
use crate::models::{Episode, Show};
use crate::quality::QualitySelector;

/// Outcome of reconciling one show against local storage.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Greatest `(season, episode)` already on disk, if any.
    pub watermark: Option<(i32, i32)>,

    pub downloaded: usize,

    /// One release per missing slot, ascending by `(season, episode)`.
    pub to_acquire: Vec<Episode>,
}

/// Marks every episode whose slot holds a file with a matching name and
/// returns how many were marked.
pub fn mark_downloaded(show: &mut Show, inventory: &LocalInventory, base_dir: &Path) -> usize {
    let mut marked = 0;

    for episode in &mut show.episodes {
        let Some(found) = inventory.get(episode.season, episode.episode) else {
            continue;
        };

        let expected = episode.expected_path(base_dir);
        let expected_name = expected
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let found_name = found
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if fuzzy_match(&expected_name, &found_name) {
            episode.downloaded = true;
            episode.path = Some(found.to_path_buf());
            marked += 1;
        } else {
            debug!(
                season = episode.season,
                episode = episode.episode,
                expected = %expected_name,
                found = %found_name,
                "Slot holds a different release"
            );
        }
    }

    marked
}

/// Greatest `(season, episode)` among downloaded episodes.
#[must_use]
pub fn watermark(show: &Show) -> Option<(i32, i32)> {
    show.latest_downloaded().map(Episode::slot)
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    selector: QualitySelector,
}

impl Reconciler {
    #[must_use]
    pub const fn new(selector: QualitySelector) -> Self {
        Self { selector }
    }

    #[must_use]
    pub const fn selector(&self) -> &QualitySelector {
        &self.selector
    }

    /// Scans `base_dir` for the show, marks what is already downloaded and
    /// selects the releases to acquire.
    pub fn reconcile(
        &self,
        show: &mut Show,
        base_dir: &Path,
        include_all: bool,
    ) -> Result<Reconciliation, ScanError> {
        let inventory = scan(base_dir, &show.title)?;
        let downloaded = mark_downloaded(show, &inventory, base_dir);

        let reconciliation = Reconciliation {
            watermark: watermark(show),
            downloaded,
            to_acquire: self.select_missing(show, include_all),
        };

        debug!(
            show = %show.title,
            local_files = inventory.len(),
            downloaded,
            watermark = ?reconciliation.watermark,
            to_acquire = reconciliation.to_acquire.len(),
            "Reconciled show"
        );
        Ok(reconciliation)
    }

    /// Selects one release per slot not yet downloaded.
    ///
    /// Unless `include_all` is set, slots before the watermark are skipped so
    /// old seasons are not backfilled. Releases without a season/episode do
    /// not share a slot, so each one is selected on its own.
    #[must_use]
    pub fn select_missing(&self, show: &Show, include_all: bool) -> Vec<Episode> {
        let cutoff = if include_all { None } else { watermark(show) };

        let mut unparsed = Vec::new();
        let mut slots: BTreeMap<(i32, i32), Vec<Episode>> = BTreeMap::new();
        for episode in &show.episodes {
            if episode.downloaded {
                continue;
            }
            if cutoff.is_some_and(|mark| episode.slot() < mark) {
                continue;
            }
            if episode.is_parsed() {
                slots
                    .entry(episode.slot())
                    .or_default()
                    .push(episode.clone());
            } else {
                unparsed.push(episode.clone());
            }
        }

        unparsed.extend(
            slots
                .values()
                .filter_map(|candidates| self.selector.select(candidates).cloned()),
        );
        unparsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ep(season: i32, episode: i32, title: &str) -> Episode {
        Episode {
            show_title: "Show".to_string(),
            season,
            episode,
            title: title.to_string(),
            torrent_url: format!("https://host/{}.mkv.torrent", title.replace(' ', ".")),
            ..Default::default()
        }
    }

    fn show(episodes: Vec<Episode>) -> Show {
        Show {
            title: "Show".to_string(),
            episodes,
            ..Default::default()
        }
    }

    fn slots(episodes: &[Episode]) -> Vec<(i32, i32)> {
        episodes.iter().map(Episode::slot).collect()
    }

    #[test]
    fn test_newest_only_skips_before_watermark() {
        let mut s = show(vec![
            ep(1, 1, "Show S01E01"),
            ep(1, 2, "Show S01E02"),
            ep(2, 1, "Show S02E01"),
        ]);
        s.episodes[0].downloaded = true;
        s.episodes[1].downloaded = true;

        let selected = Reconciler::default().select_missing(&s, false);
        assert_eq!(slots(&selected), vec![(2, 1)]);
    }

    #[test]
    fn test_include_all_backfills() {
        let mut s = show(vec![
            ep(1, 1, "Show S01E01"),
            ep(1, 2, "Show S01E02"),
            ep(2, 1, "Show S02E01"),
        ]);
        s.episodes[0].downloaded = true;

        let selected = Reconciler::default().select_missing(&s, true);
        assert_eq!(slots(&selected), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn test_gap_before_watermark_is_not_backfilled() {
        let mut s = show(vec![
            ep(1, 1, "Show S01E01"),
            ep(1, 2, "Show S01E02"),
            ep(1, 3, "Show S01E03"),
            ep(1, 4, "Show S01E04"),
        ]);
        s.episodes[2].downloaded = true;

        let selected = Reconciler::default().select_missing(&s, false);
        assert_eq!(slots(&selected), vec![(1, 4)]);
    }

    #[test]
    fn test_nothing_downloaded_selects_everything_including_unparsed() {
        let s = show(vec![
            ep(-1, -1, "Show Special"),
            ep(1, 1, "Show S01E01"),
            ep(1, 2, "Show S01E02"),
        ]);

        let selected = Reconciler::default().select_missing(&s, false);
        assert_eq!(slots(&selected), vec![(-1, -1), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_unparsed_sorts_before_any_watermark() {
        let mut s = show(vec![ep(-1, -1, "Show Special"), ep(0, 1, "Show S00E01")]);
        s.episodes[1].downloaded = true;

        assert_eq!(watermark(&s), Some((0, 1)));
        assert!(Reconciler::default().select_missing(&s, false).is_empty());
        assert_eq!(
            slots(&Reconciler::default().select_missing(&s, true)),
            vec![(-1, -1)]
        );
    }

    #[test]
    fn test_unparsed_releases_are_never_grouped() {
        let s = show(vec![
            ep(-1, -1, "Show Christmas Special"),
            ep(-1, -1, "Show Reunion Special"),
            ep(1, 1, "Show S01E01"),
        ]);

        let selected = Reconciler::default().select_missing(&s, false);
        let titles: Vec<&str> = selected.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Show Christmas Special", "Show Reunion Special", "Show S01E01"]
        );

        let dirs: Vec<PathBuf> = selected
            .iter()
            .map(|e| crate::services::dispatch::target_dir(Path::new("/tv"), e))
            .collect();
        assert_eq!(dirs[0], PathBuf::from("/tv/Show/incoming"));
        assert_eq!(dirs[1], PathBuf::from("/tv/Show/incoming"));
        assert_eq!(dirs[2], PathBuf::from("/tv/Show/S01"));
    }

    #[test]
    fn test_competing_releases_yield_one_per_slot() {
        let s = show(vec![
            ep(3, 1, "Show S03E01 HDTV x264"),
            ep(3, 1, "Show S03E01 720p"),
            ep(3, 1, "Show S03E01 1080p"),
            ep(3, 2, "Show S03E02 480p"),
        ]);

        let selected = Reconciler::new(QualitySelector::new(["1080p", "720p"]))
            .select_missing(&s, false);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].title, "Show S03E01 1080p");
        assert_eq!(selected[1].title, "Show S03E02 480p");
    }

    #[test]
    fn test_mark_downloaded_uses_fuzzy_names() {
        let mut s = show(vec![
            ep(1, 1, "Show S01E01 720p"),
            ep(1, 2, "Show S01E02 720p"),
            ep(1, 3, "Show S01E03 720p"),
        ]);
        let mut inventory = LocalInventory::default();
        inventory.insert(1, 1, PathBuf::from("/tv/Show/S01/show.s01e01.720p[eztv].mkv"));
        inventory.insert(1, 2, PathBuf::from("/tv/Show/S01/Show.S01E02.1080p.mkv"));

        let marked = mark_downloaded(&mut s, &inventory, Path::new("/tv"));
        assert_eq!(marked, 1);
        assert!(s.episodes[0].downloaded);
        assert_eq!(
            s.episodes[0].path.as_deref(),
            Some(Path::new("/tv/Show/S01/show.s01e01.720p[eztv].mkv"))
        );
        assert!(!s.episodes[1].downloaded);
        assert!(!s.episodes[2].downloaded);
    }

    #[test]
    fn test_reconcile_against_disk() {
        let base = std::env::temp_dir().join(format!("eztrack-reconcile-{}", std::process::id()));
        let season_dir = base.join("Show").join("S01");
        std::fs::create_dir_all(&season_dir).unwrap();
        std::fs::write(season_dir.join("Show.S01E01.720p.mkv"), b"").unwrap();

        let mut s = show(vec![
            ep(1, 1, "Show S01E01 720p"),
            ep(1, 2, "Show S01E02 720p"),
        ]);
        let result = Reconciler::default().reconcile(&mut s, &base, false).unwrap();
        let _ = std::fs::remove_dir_all(&base);

        assert_eq!(result.downloaded, 1);
        assert_eq!(result.watermark, Some((1, 1)));
        assert_eq!(slots(&result.to_acquire), vec![(1, 2)]);
    }
}
