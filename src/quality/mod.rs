//! Choice between competing releases of the same episode slot.

use crate::constants::DEFAULT_QUALITY_PREFERENCES;
use crate::models::Episode;

/// Ordered quality tags matched case-insensitively against a release's title
/// and locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualitySelector {
    preferences: Vec<String>,
}

impl Default for QualitySelector {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_PREFERENCES.iter().copied())
    }
}

impl QualitySelector {
    pub fn new<I, S>(preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            preferences: preferences
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn preferences(&self) -> &[String] {
        &self.preferences
    }

    fn matches(episode: &Episode, pattern: &str) -> bool {
        [&episode.title, &episode.torrent_url, &episode.magnet_url]
            .iter()
            .any(|field| field.to_lowercase().contains(pattern))
    }

    /// Picks one release out of `candidates`.
    ///
    /// The first candidate is the fallback; every later candidate matching any
    /// preference replaces the current pick, so the last matching candidate
    /// wins regardless of which preference it matched.
    // TODO: revisit once we decide whether the highest-ranked preference should win instead.
    #[must_use]
    pub fn select<'a>(&self, candidates: &'a [Episode]) -> Option<&'a Episode> {
        let (first, rest) = candidates.split_first()?;
        let mut best = first;

        for candidate in rest {
            for pattern in &self.preferences {
                if Self::matches(candidate, pattern) {
                    best = candidate;
                }
            }
        }

        Some(best)
    }
}
