use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{CatalogClient, FetchError};
use crate::constants::USER_AGENT;
use crate::models::{Episode, Listing, Show, ShowSummary};
use crate::parser::parse_title;

/// Regexes for scraping catalog pages, compiled once.
struct PageRegex {
    row: Regex,
    cell: Regex,
    anchor: Regex,
    attr: Regex,
    tag: Regex,
    show_cell: Regex,
    show_title: Regex,
    rating: Regex,
}

impl PageRegex {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<PageRegex>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    row: Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").ok()?,
                    cell: Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").ok()?,
                    anchor: Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>").ok()?,
                    attr: Regex::new(r#"(?i)\b([a-z_-]+)\s*=\s*"([^"]*)""#).ok()?,
                    tag: Regex::new(r"(?s)<[^>]*>").ok()?,
                    show_cell: Regex::new(
                        r#"(?is)<td\b[^>]*class="[^"]*\bforum_thread_post\b[^"]*"[^>]*>(.*?)</td>"#,
                    )
                    .ok()?,
                    show_title: Regex::new(r"(?is)<h1\b[^>]*>\s*<b>\s*<span\b[^>]*>(.*?)</span>")
                        .ok()?,
                    rating: Regex::new(
                        r#"(?is)<span\b[^>]*itemprop="ratingValue"[^>]*>(.*?)</span>"#,
                    )
                    .ok()?,
                })
            })
            .as_ref()
    }
}

#[derive(Debug, Default)]
struct Anchor {
    href: String,
    classes: Vec<String>,
    text: String,
}

impl Anchor {
    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

fn text_of(re: &PageRegex, html: &str) -> String {
    let stripped = re.tag.replace_all(html, "");
    html_escape::decode_html_entities(stripped.trim()).to_string()
}

fn anchors(re: &PageRegex, html: &str) -> Vec<Anchor> {
    re.anchor
        .captures_iter(html)
        .map(|caps| {
            let mut anchor = Anchor {
                text: caps.get(2).map_or_else(String::new, |m| text_of(re, m.as_str())),
                ..Default::default()
            };
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            for attr in re.attr.captures_iter(attrs) {
                let value = html_escape::decode_html_entities(&attr[2]).to_string();
                match attr[1].to_ascii_lowercase().as_str() {
                    "href" => anchor.href = value,
                    "class" => {
                        anchor.classes = value.split_whitespace().map(String::from).collect();
                    }
                    _ => {}
                }
            }
            anchor
        })
        .collect()
}

fn resolve(base: &Url, href: &str) -> String {
    base.join(href)
        .map_or_else(|_| href.to_string(), |u| u.to_string())
}

fn parse_error(url: &str, reason: impl Into<String>) -> FetchError {
    FetchError::Parse {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Parses the catalog's show index page.
pub fn parse_show_list(page_url: &str, html: &str) -> Result<Vec<ShowSummary>, FetchError> {
    let re = PageRegex::get().ok_or_else(|| parse_error(page_url, "scraper unavailable"))?;
    let base = Url::parse(page_url).map_err(|e| parse_error(page_url, e.to_string()))?;

    let shows = re
        .show_cell
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .flat_map(|cell| anchors(re, cell.as_str()))
        .filter(|a| !a.href.is_empty() && !a.text.is_empty())
        .map(|a| ShowSummary {
            title: a.text,
            url: resolve(&base, &a.href),
        })
        .collect();

    Ok(shows)
}

/// Parses a show page into a [`Show`] with episodes sorted by season then episode.
pub fn parse_show_page(page_url: &str, html: &str) -> Result<Show, FetchError> {
    let re = PageRegex::get().ok_or_else(|| parse_error(page_url, "scraper unavailable"))?;
    let base = Url::parse(page_url).map_err(|e| parse_error(page_url, e.to_string()))?;

    let title = re
        .show_title
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| text_of(re, m.as_str()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| parse_error(page_url, "missing show title"))?;

    let rating = re
        .rating
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| text_of(re, m.as_str()))
        .unwrap_or_default();

    let mut show = Show {
        title,
        url: page_url.to_string(),
        rating,
        episodes: Vec::new(),
    };

    for row in re.row.captures_iter(html).filter_map(|c| c.get(1)) {
        let cells: Vec<&str> = re
            .cell
            .captures_iter(row.as_str())
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        if cells.len() != 6 {
            continue;
        }

        let links = anchors(re, row.as_str());
        let Some(info) = links.iter().find(|a| a.has_class("epinfo")) else {
            continue;
        };
        let href_with = |class: &str| {
            links
                .iter()
                .find(|a| a.has_class(class))
                .map(|a| a.href.clone())
                .unwrap_or_default()
        };

        let parsed = parse_title(&info.text);
        show.episodes.push(Episode {
            show_title: show.title.clone(),
            season: parsed.season,
            episode: parsed.episode,
            title: info.text.clone(),
            size: text_of(re, cells[3]),
            release: text_of(re, cells[4]),
            torrent_url: href_with("download_1"),
            magnet_url: href_with("magnet"),
            episode_url: resolve(&base, &info.href),
            downloaded: false,
            path: None,
        });
    }

    show.sort_episodes();
    Ok(show)
}

#[derive(Debug, Deserialize)]
struct ListingsResponse {
    #[serde(default)]
    torrents: Vec<Listing>,
}

/// HTTP client for the EZTV catalog.
#[derive(Clone)]
pub struct EztvClient {
    client: Client,
    base_url: String,
}

impl EztvClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self::with_shared_client(client, base_url))
    }

    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!(url = %url, "Fetching catalog page");
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(transport)
    }
}

#[async_trait]
impl CatalogClient for EztvClient {
    async fn list_shows(&self) -> Result<Vec<ShowSummary>, FetchError> {
        let url = format!("{}/showlist/", self.base_url);
        let html = self.fetch_text(&url).await?;
        parse_show_list(&url, &html)
    }

    async fn get_show(&self, url: &str) -> Result<Show, FetchError> {
        let html = self.fetch_text(url).await?;
        parse_show_page(url, &html)
    }

    async fn listings_page(&self, limit: usize, page: usize) -> Result<Vec<Listing>, FetchError> {
        let mut url = Url::parse(&format!("{}/api/get-torrents", self.base_url))
            .map_err(|e| parse_error(&self.base_url, e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("page", &page.to_string());

        let body = self.fetch_text(url.as_str()).await?;
        let response: ListingsResponse =
            serde_json::from_str(&body).map_err(|e| parse_error(url.as_str(), e.to_string()))?;
        Ok(response.torrents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_LIST: &str = r#"
        <table class="forum_header_border">
          <tr name="hover">
            <td class="forum_thread_post"><a href="/shows/1/mr-robot/" class="thread_link">Mr Robot</a></td>
            <td class="forum_thread_post_end"><font class="airing">Airing</font></td>
          </tr>
          <tr name="hover">
            <td class="forum_thread_post"><a href="/shows/2/law-and-order/" class="thread_link">Law &amp; Order</a></td>
            <td class="forum_thread_post_end"><font class="ended">Ended</font></td>
          </tr>
        </table>
    "#;

    const SHOW_PAGE: &str = r#"
        <table>
          <tr><td class="section_post_header"><h1><b><span itemprop="name">Mr Robot</span></b></h1></td></tr>
          <tr><td><b><span itemprop="ratingValue">8.6</span></b></td></tr>
        </table>
        <table class="forum_header_noborder">
          <tr name="hover" class="forum_header_border">
            <td class="forum_thread_post"><a href="/shows/1/mr-robot/"><img src="x.png"></a></td>
            <td class="forum_thread_post"><a href="/ep/20/mr-robot-s03e04-1080p/" title="t" class="epinfo">Mr Robot S03E04 1080p WEB x264-STRiFE</a></td>
            <td class="forum_thread_post"><a href="magnet:?xt=urn:btih:bbb&amp;dn=x" class="magnet" title="Magnet"></a><a href="https://zoink.ch/torrent/Mr.Robot.S03E04.1080p.WEB.x264-STRiFE[eztv].mkv.torrent" class="download_1" title="Download"></a></td>
            <td class="forum_thread_post">1.8 GB</td>
            <td class="forum_thread_post">1 week</td>
            <td class="forum_thread_post_end"><font color="green">120</font></td>
          </tr>
          <tr name="hover" class="forum_header_border">
            <td class="forum_thread_post"><a href="/shows/1/mr-robot/"><img src="x.png"></a></td>
            <td class="forum_thread_post"><a class="epinfo" href="/ep/10/mr-robot-s03e01-720p/">Mr Robot S03E01 720p HDTV</a></td>
            <td class="forum_thread_post"><a href="magnet:?xt=urn:btih:aaa" class="magnet"></a><a href="https://zoink.ch/torrent/Mr.Robot.S03E01.720p.HDTV.mkv.torrent" class="download_1"></a></td>
            <td class="forum_thread_post">700 MB</td>
            <td class="forum_thread_post">3 weeks</td>
            <td class="forum_thread_post_end">12</td>
          </tr>
          <tr><td colspan="6">Season 3</td></tr>
        </table>
    "#;

    #[test]
    fn test_parse_show_list() {
        let shows = parse_show_list("https://eztv.re/showlist/", SHOW_LIST).unwrap();
        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].title, "Mr Robot");
        assert_eq!(shows[0].url, "https://eztv.re/shows/1/mr-robot/");
        assert_eq!(shows[1].title, "Law & Order");
    }

    #[test]
    fn test_parse_show_page() {
        let show = parse_show_page("https://eztv.re/shows/1/mr-robot/", SHOW_PAGE).unwrap();
        assert_eq!(show.title, "Mr Robot");
        assert_eq!(show.rating, "8.6");
        assert_eq!(show.episodes.len(), 2);

        let first = &show.episodes[0];
        assert_eq!(first.slot(), (3, 1));
        assert_eq!(first.show_title, "Mr Robot");
        assert_eq!(first.size, "700 MB");
        assert_eq!(first.release, "3 weeks");
        assert_eq!(first.magnet_url, "magnet:?xt=urn:btih:aaa");
        assert_eq!(
            first.episode_url,
            "https://eztv.re/ep/10/mr-robot-s03e01-720p/"
        );

        let second = &show.episodes[1];
        assert_eq!(second.slot(), (3, 4));
        assert_eq!(second.magnet_url, "magnet:?xt=urn:btih:bbb&dn=x");
        assert_eq!(
            second.filename(),
            "Mr.Robot.S03E04.1080p.WEB.x264-STRiFE[eztv].mkv"
        );
    }

    #[test]
    fn test_parse_show_page_without_title() {
        let err = parse_show_page("https://eztv.re/shows/9/", "<html></html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[test]
    fn test_listings_response() {
        let body = r#"{"torrents_count": 2, "torrents": [
            {"id": 1, "title": "Fargo S05E03 720p", "season": "5", "episode": "3"},
            {"id": 2, "title": "Other", "season": "1", "episode": "10"}
        ]}"#;
        let response: ListingsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.torrents.len(), 2);
        assert_eq!(response.torrents[1].episode, 10);
    }
}
