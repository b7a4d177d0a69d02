//! Resolves a user-supplied show pattern to a single catalog show.

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

use crate::clients::{CatalogClient, FetchError};
use crate::config::Config;
use crate::models::{Show, ShowSummary};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no show matches {0:?}")]
    NotFound(String),

    #[error("{} shows match {pattern:?}: {}", .matches.len(), .matches.join(", "))]
    Ambiguous {
        pattern: String,
        matches: Vec<String>,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone)]
pub struct ResolvedShow {
    pub show: Show,

    /// Whether the show was found among the tracked entries.
    pub tracked: bool,
}

/// Case-insensitive title pattern. A pattern that is not a valid regex is
/// matched literally.
fn title_pattern(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
        })
        .ok()
}

fn pick<'a>(pattern: &str, matches: &[&'a ShowSummary]) -> Result<&'a ShowSummary, LookupError> {
    match matches {
        [] => Err(LookupError::NotFound(pattern.to_string())),
        [only] => Ok(*only),
        many => Err(LookupError::Ambiguous {
            pattern: pattern.to_string(),
            matches: many.iter().map(|s| s.title.clone()).collect(),
        }),
    }
}

/// Remote shows whose title or URL equals `pattern`, or whose title matches it.
#[must_use]
pub fn matching_shows<'a>(pattern: &str, shows: &'a [ShowSummary]) -> Vec<&'a ShowSummary> {
    let re = title_pattern(pattern);
    shows
        .iter()
        .filter(|s| {
            s.title == pattern
                || s.url == pattern
                || re.as_ref().is_some_and(|re| re.is_match(&s.title))
        })
        .collect()
}

/// Finds the show `pattern` names and fetches it. Tracked shows are tried
/// first by exact title or URL, then the remote show list.
pub async fn resolve(
    pattern: &str,
    config: &Config,
    catalog: &dyn CatalogClient,
) -> Result<ResolvedShow, LookupError> {
    let tracked: Vec<ShowSummary> = config
        .shows
        .iter()
        .filter(|s| s.title == pattern || s.url == pattern)
        .map(|s| ShowSummary {
            title: s.title.clone(),
            url: s.url.clone(),
        })
        .collect();

    if !tracked.is_empty() {
        let refs: Vec<&ShowSummary> = tracked.iter().collect();
        let chosen = pick(pattern, &refs)?;
        debug!(pattern, url = %chosen.url, "Resolved tracked show");
        let show = catalog.get_show(&chosen.url).await?;
        return Ok(ResolvedShow {
            show,
            tracked: true,
        });
    }

    let shows = catalog.list_shows().await?;
    let chosen = pick(pattern, &matching_shows(pattern, &shows))?;
    debug!(pattern, title = %chosen.title, url = %chosen.url, "Resolved remote show");

    let show = catalog.get_show(&chosen.url).await?;
    Ok(ResolvedShow {
        show,
        tracked: false,
    })
}
