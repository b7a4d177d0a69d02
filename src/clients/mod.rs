//! Collaborators: the remote catalog and the download client.

pub mod eztv;
pub mod transmission;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::constants::catalog::MAX_PAGE_SIZE;
use crate::models::{Listing, Show, ShowSummary};

pub use eztv::EztvClient;
pub use transmission::TransmissionClient;

/// Remote catalog unreachable or unparseable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} replied {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unable to parse response from {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// Failures reported by the download client for a single enqueue.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("download client request failed: {0}")]
    Transport(String),

    #[error("duplicated torrent with id {existing_id}")]
    Duplicate { existing_id: i64 },

    #[error("download client rejected the torrent: {0}")]
    Rejected(String),

    #[error("unable to create {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// What the download client reports for an accepted torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct DownloadResult {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "hashString")]
    pub hash: String,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Every show the catalog knows, in listing order.
    async fn list_shows(&self) -> Result<Vec<ShowSummary>, FetchError>;

    /// The show page at `url` with all of its episode releases.
    async fn get_show(&self, url: &str) -> Result<Show, FetchError>;

    /// One page (1-based) of the latest-releases feed.
    async fn listings_page(&self, limit: usize, page: usize) -> Result<Vec<Listing>, FetchError>;

    /// The `n` most recent listings, fetched page by page.
    async fn latest_listings(&self, n: usize) -> Result<Vec<Listing>, FetchError> {
        let page_size = MAX_PAGE_SIZE.min(n);
        let mut listings = Vec::with_capacity(n);
        let mut page = 1;

        while listings.len() < n {
            let wanted = n - listings.len();
            let batch = self.listings_page(page_size, page).await?;
            let exhausted = batch.len() < page_size;
            listings.extend(batch.into_iter().take(wanted));
            if exhausted {
                break;
            }
            page += 1;
        }

        Ok(listings)
    }
}

#[async_trait]
pub trait DownloadAdapter: Send + Sync {
    /// Queues `locator` for download into `target_dir`, creating the directory.
    async fn enqueue(&self, locator: &str, target_dir: &Path)
    -> Result<DownloadResult, AdapterError>;
}
