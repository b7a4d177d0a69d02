use serde::{Deserialize, Serialize};
use std::fmt;

use super::episode::Episode;

/// A show as listed in the catalog index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSummary {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Show {
    pub title: String,

    pub url: String,

    pub rating: String,

    pub episodes: Vec<Episode>,
}

impl Show {
    #[must_use]
    pub fn summary(&self) -> ShowSummary {
        ShowSummary {
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }

    /// Sorts by season then episode, keeping listing order among equal slots.
    pub fn sort_episodes(&mut self) {
        self.episodes.sort_by_key(Episode::slot);
    }

    /// The downloaded episode with the greatest `(season, episode)`.
    #[must_use]
    pub fn latest_downloaded(&self) -> Option<&Episode> {
        self.episodes
            .iter()
            .filter(|e| e.downloaded)
            .max_by_key(|e| e.slot())
    }

    #[must_use]
    pub fn downloaded_count(&self) -> usize {
        self.episodes.iter().filter(|e| e.downloaded).count()
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Title:  {}", self.title)?;
        writeln!(f, "URL:    {}", self.url)?;
        write!(f, "Rating: {}", self.rating)
    }
}
