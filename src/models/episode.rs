use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::UNSORTED_DIR;

/// One release of one episode as listed by the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub show_title: String,

    /// `-1` when the release title could not be parsed.
    pub season: i32,

    /// `-1` when the release title could not be parsed.
    pub episode: i32,

    pub title: String,

    pub size: String,

    pub release: String,

    pub torrent_url: String,

    pub magnet_url: String,

    pub episode_url: String,

    #[serde(skip)]
    pub downloaded: bool,

    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Episode {
    #[must_use]
    pub const fn slot(&self) -> (i32, i32) {
        (self.season, self.episode)
    }

    #[must_use]
    pub const fn is_parsed(&self) -> bool {
        self.season >= 0 && self.episode >= 0
    }

    /// Release file name: the torrent locator's base name without its final
    /// extension.
    #[must_use]
    pub fn filename(&self) -> String {
        let base = self
            .torrent_url
            .rsplit('/')
            .next()
            .unwrap_or(&self.torrent_url);
        base.rsplit_once('.')
            .map_or(base, |(stem, _)| stem)
            .to_string()
    }

    #[must_use]
    pub fn season_dir(&self) -> String {
        if self.is_parsed() {
            format!("S{:02}", self.season)
        } else {
            UNSORTED_DIR.to_string()
        }
    }

    /// Where this release lands under `base_dir` once downloaded.
    #[must_use]
    pub fn expected_path(&self, base_dir: &Path) -> PathBuf {
        base_dir
            .join(&self.show_title)
            .join(self.season_dir())
            .join(self.filename())
    }

    /// Locator handed to the download client; magnet first.
    #[must_use]
    pub fn locator(&self) -> &str {
        if self.magnet_url.is_empty() {
            &self.torrent_url
        } else {
            &self.magnet_url
        }
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S{:02} E{:02} - {} - ({}) ({})",
            self.season, self.episode, self.title, self.size, self.release
        )
    }
}
