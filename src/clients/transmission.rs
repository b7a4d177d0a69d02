use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{AdapterError, DownloadAdapter, DownloadResult};
use crate::constants::USER_AGENT;
use crate::constants::transmission::{RPC_PATH, SESSION_HEADER};

#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub base_url: String,

    pub username: String,

    pub password: String,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, A> {
    method: &'a str,
    arguments: A,
}

#[derive(Debug, Serialize)]
struct TorrentAddArguments<'a> {
    filename: &'a str,
    #[serde(rename = "download-dir")]
    download_dir: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct TorrentAddResult {
    #[serde(rename = "torrent-added")]
    added: Option<DownloadResult>,

    #[serde(rename = "torrent-duplicate")]
    duplicate: Option<DownloadResult>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<A> {
    #[serde(default)]
    result: String,

    arguments: Option<A>,
}

/// Maps a `torrent-add` reply onto the adapter's outcome.
fn interpret_add_response(
    response: RpcResponse<TorrentAddResult>,
) -> Result<DownloadResult, AdapterError> {
    if response.result != "success" {
        return Err(AdapterError::Rejected(response.result));
    }

    let arguments = response.arguments.unwrap_or_default();
    if let Some(duplicate) = arguments.duplicate
        && !duplicate.hash.is_empty()
    {
        return Err(AdapterError::Duplicate {
            existing_id: duplicate.id,
        });
    }

    arguments
        .added
        .ok_or_else(|| AdapterError::Rejected("no torrent in reply".to_string()))
}

/// Client for the Transmission RPC endpoint.
#[derive(Debug)]
pub struct TransmissionClient {
    client: Client,
    config: RpcConfig,
    session_id: RwLock<String>,
}

impl TransmissionClient {
    fn rpc_url(&self) -> String {
        format!("{}{RPC_PATH}", self.config.base_url.trim_end_matches('/'))
    }

    /// Connects to Transmission and obtains a session id.
    pub async fn connect(config: RpcConfig) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AdapterError::Transport(format!("Failed to build HTTP client: {e}")))?;

        let this = Self {
            client,
            config,
            session_id: RwLock::new(String::new()),
        };

        let response = this
            .client
            .get(this.rpc_url())
            .basic_auth(&this.config.username, Some(&this.config.password))
            .send()
            .await?;

        let status = response.status();
        let Some(session_id) = session_header(response.headers()) else {
            return Err(AdapterError::Transport(format!(
                "unable to initialize Transmission client, server replied {status}"
            )));
        };

        *this.session_id.write().await = session_id;
        info!(url = %this.config.base_url, "Connected to Transmission");
        Ok(this)
    }

    async fn post<T: Serialize + Sync>(&self, body: &T) -> Result<reqwest::Response, AdapterError> {
        let send = |session_id: String| {
            self.client
                .post(self.rpc_url())
                .basic_auth(&self.config.username, Some(&self.config.password))
                .header(SESSION_HEADER, session_id)
                .json(body)
                .send()
        };

        let session_id = self.session_id.read().await.clone();
        let response = send(session_id).await?;

        if response.status() == StatusCode::CONFLICT
            && let Some(fresh) = session_header(response.headers())
        {
            debug!(reason = "session_expired", "Refreshing Transmission session id");
            *self.session_id.write().await = fresh.clone();
            return send(fresh).await.map_err(AdapterError::from);
        }

        Ok(response)
    }

    pub async fn add_torrent(
        &self,
        locator: &str,
        download_dir: &str,
    ) -> Result<DownloadResult, AdapterError> {
        let request = RpcRequest {
            method: "torrent-add",
            arguments: TorrentAddArguments {
                filename: locator,
                download_dir,
            },
        };

        let response = self.post(&request).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AdapterError::Transport(format!(
                "got error {status} while adding torrent"
            )));
        }

        let reply: RpcResponse<TorrentAddResult> = response.json().await?;
        interpret_add_response(reply)
    }
}

fn session_header(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[async_trait]
impl DownloadAdapter for TransmissionClient {
    async fn enqueue(
        &self,
        locator: &str,
        target_dir: &Path,
    ) -> Result<DownloadResult, AdapterError> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|source| AdapterError::Io {
                path: target_dir.to_path_buf(),
                source,
            })?;

        let result = self
            .add_torrent(locator, &target_dir.to_string_lossy())
            .await?;
        debug!(id = result.id, hash = %result.hash, "Torrent added");
        Ok(result)
    }
}
