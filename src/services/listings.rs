//! Searches the latest-releases feed.

use regex::Regex;
use tracing::{debug, warn};

use crate::clients::{CatalogClient, FetchError};
use crate::constants::catalog::{MAX_PAGE_SIZE, MAX_SEARCH_PAGES};
use crate::models::Listing;

#[derive(Debug, Clone)]
pub struct ListingFilter {
    pub title: Regex,
    pub season: Option<i32>,
    pub episode: Option<i32>,
}

impl ListingFilter {
    #[must_use]
    pub fn accepts(&self, listing: &Listing) -> bool {
        self.title.is_match(&listing.title)
            && self.season.is_none_or(|s| s == listing.season)
            && self.episode.is_none_or(|e| e == listing.episode)
    }
}

/// The `n` most recent listings accepted by `filter`, looking at most
/// `MAX_SEARCH_PAGES` pages deep. Returns fewer when the feed runs out.
pub async fn last_matching(
    catalog: &dyn CatalogClient,
    n: usize,
    filter: &ListingFilter,
) -> Result<Vec<Listing>, FetchError> {
    let mut found = Vec::with_capacity(n);

    for page in 1..=MAX_SEARCH_PAGES {
        if found.len() >= n {
            break;
        }

        let batch = catalog.listings_page(MAX_PAGE_SIZE, page).await?;
        let exhausted = batch.len() < MAX_PAGE_SIZE;
        debug!(page, listings = batch.len(), "Searching listings page");

        found.extend(batch.into_iter().filter(|l| filter.accepts(l)));
        if exhausted {
            break;
        }
    }

    found.truncate(n);
    if found.len() < n {
        warn!(
            wanted = n,
            found = found.len(),
            "Fewer matching listings than requested"
        );
    }
    Ok(found)
}
