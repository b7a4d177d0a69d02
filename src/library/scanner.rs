use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::parser::parse_release_file;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("too many directories matching show title {title:?} ({})", .candidates.len())]
    Ambiguous {
        title: String,
        candidates: Vec<String>,
    },

    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Files found on disk, keyed by season then episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    episodes: BTreeMap<i32, BTreeMap<i32, PathBuf>>,
}

impl LocalInventory {
    #[must_use]
    pub fn get(&self, season: i32, episode: i32) -> Option<&Path> {
        self.episodes
            .get(&season)
            .and_then(|eps| eps.get(&episode))
            .map(PathBuf::as_path)
    }

    /// Records a file for a slot, replacing any earlier one.
    pub fn insert(&mut self, season: i32, episode: i32, path: PathBuf) -> Option<PathBuf> {
        self.episodes
            .entry(season)
            .or_default()
            .insert(episode, path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots in ascending `(season, episode)` order.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), &Path)> {
        self.episodes.iter().flat_map(|(season, eps)| {
            eps.iter()
                .map(move |(episode, path)| ((*season, *episode), path.as_path()))
        })
    }
}

/// Loose directory-name pattern for a show: words of the title joined by any
/// single character.
fn show_dir_regex(title: &str) -> Option<Regex> {
    let pattern = title
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".");
    Regex::new(&pattern).ok()
}

fn find_show_dir(base_dir: &Path, title: &str) -> Result<Option<PathBuf>, ScanError> {
    let entries = match std::fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %base_dir.display(), "Base directory missing, nothing downloaded yet");
            return Ok(None);
        }
        Err(source) => {
            return Err(ScanError::Io {
                path: base_dir.to_path_buf(),
                source,
            });
        }
    };

    let Some(re) = show_dir_regex(title) else {
        return Ok(None);
    };

    let mut candidates: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(String::from))
        .filter(|name| re.is_match(name))
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(Some(base_dir.join(&candidates[0]))),
        _ => Err(ScanError::Ambiguous {
            title: title.to_string(),
            candidates,
        }),
    }
}

/// Lists the episode files already present for `show_title` under `base_dir`.
///
/// A missing base directory or show directory yields an empty inventory.
/// Unreadable entries below the show directory are skipped.
pub fn scan(base_dir: &Path, show_title: &str) -> Result<LocalInventory, ScanError> {
    let mut inventory = LocalInventory::default();

    let Some(show_dir) = find_show_dir(base_dir, show_title)? else {
        return Ok(inventory);
    };

    let walker = WalkDir::new(&show_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                None
            }
        });

    for entry in walker {
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        if let Some((season, episode)) = parse_release_file(name)
            && let Some(previous) = inventory.insert(season, episode, entry.path().to_path_buf())
        {
            warn!(
                season,
                episode,
                replaced = %previous.display(),
                kept = %entry.path().display(),
                "Several files for the same episode, keeping the last one"
            );
        }
    }

    debug!(
        show = %show_title,
        path = %show_dir.display(),
        files = inventory.len(),
        "Scanned local episodes"
    );
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct ScratchDir(PathBuf);

    impl ScratchDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "eztrack-scan-{name}-{}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn touch(&self, rel: &str) {
            let path = self.0.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_missing_base_dir_is_empty() {
        let inventory = scan(Path::new("/nonexistent/eztrack/base"), "Fargo").unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_no_matching_show_dir_is_empty() {
        let scratch = ScratchDir::new("nomatch");
        scratch.touch("Other Show/S01/Other.Show.S01E01.mkv");
        let inventory = scan(&scratch.0, "Fargo").unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_scan_records_video_files() {
        let scratch = ScratchDir::new("records");
        scratch.touch("Mr Robot/S01/Mr.Robot.S01E01.720p.mkv");
        scratch.touch("Mr Robot/S01/Mr.Robot.S01E02.720p[eztv].mp4");
        scratch.touch("Mr Robot/S01/Mr.Robot.S01E02.720p.srt");
        scratch.touch("Mr Robot/S02/nested/mr.robot.2x03.avi");
        scratch.touch("Mr Robot/notes.txt");

        let inventory = scan(&scratch.0, "Mr Robot").unwrap();
        assert_eq!(inventory.len(), 3);
        assert!(inventory.get(1, 1).is_some());
        assert!(
            inventory
                .get(1, 2)
                .unwrap()
                .to_string_lossy()
                .ends_with(".mp4")
        );
        assert!(inventory.get(2, 3).is_some());

        let slots: Vec<_> = inventory.iter().map(|(slot, _)| slot).collect();
        assert_eq!(slots, vec![(1, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_title_separator_is_loose() {
        let scratch = ScratchDir::new("loose");
        scratch.touch("Mr.Robot/Mr.Robot.S01E01.mkv");
        let inventory = scan(&scratch.0, "Mr Robot").unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_duplicate_slot_keeps_last_in_name_order() {
        let scratch = ScratchDir::new("dupes");
        scratch.touch("Fargo/S05/Fargo.S05E01.1080p.mkv");
        scratch.touch("Fargo/S05/Fargo.S05E01.720p.mkv");

        let inventory = scan(&scratch.0, "Fargo").unwrap();
        assert!(
            inventory
                .get(5, 1)
                .unwrap()
                .to_string_lossy()
                .ends_with("720p.mkv")
        );
    }

    #[test]
    fn test_ambiguous_show_dirs() {
        let scratch = ScratchDir::new("ambiguous");
        fs::create_dir_all(scratch.0.join("Fargo")).unwrap();
        fs::create_dir_all(scratch.0.join("Fargo (2014)")).unwrap();

        let err = scan(&scratch.0, "Fargo").unwrap_err();
        match err {
            ScanError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec!["Fargo", "Fargo (2014)"]);
            }
            ScanError::Io { .. } => panic!("expected ambiguity"),
        }
    }

    #[test]
    fn test_title_metacharacters_are_literal() {
        let scratch = ScratchDir::new("meta");
        scratch.touch("Marvel's Agents (US)/S01/Agents.S01E01.mkv");
        let inventory = scan(&scratch.0, "Marvel's Agents (US)").unwrap();
        assert_eq!(inventory.len(), 1);
    }
}
