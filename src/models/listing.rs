use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// An entry of the catalog's "latest releases" feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub imdb_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, deserialize_with = "number_from_string")]
    pub season: i32,

    #[serde(default, deserialize_with = "number_from_string")]
    pub episode: i32,

    #[serde(default)]
    pub hash: String,

    #[serde(default)]
    pub filename: String,

    #[serde(default)]
    pub episode_url: String,

    #[serde(default)]
    pub torrent_url: String,

    #[serde(default)]
    pub magnet_url: String,

    #[serde(default)]
    pub seeds: u32,

    #[serde(default)]
    pub peers: u32,

    #[serde(default, rename = "size_bytes", deserialize_with = "number_from_string")]
    pub size_bytes: i64,

    #[serde(
        default,
        rename = "date_released_unix",
        deserialize_with = "timestamp_from_unix"
    )]
    pub released: Option<DateTime<Utc>>,
}

impl Listing {
    #[must_use]
    pub fn released_display(&self) -> String {
        self.released
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
    }

    /// Multi-line block used by long listings.
    #[must_use]
    pub fn long_display(&self) -> String {
        format!(
            "Title:     {}\nSeason:    {}\nEpisode:   {}\nReleased:  {}\nURL:       {}\nFilename:  {}",
            self.title,
            self.season,
            self.episode,
            self.released_display(),
            self.episode_url,
            self.filename
        )
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {}",
            self.released_display(),
            self.title,
            self.episode_url
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

fn number_from_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    let raw = Option::<NumberOrString>::deserialize(deserializer)?;
    let value = match raw {
        Some(NumberOrString::Number(n)) => n,
        Some(NumberOrString::Text(s)) => s.trim().parse().unwrap_or_default(),
        None => 0,
    };
    Ok(T::try_from(value).unwrap_or_default())
}

fn timestamp_from_unix<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumberOrString>::deserialize(deserializer)?;
    let seconds = match raw {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        None => None,
    };
    Ok(seconds.and_then(|s| DateTime::from_timestamp(s, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_numbers() {
        let json = r#"{
            "id": 42,
            "title": "Fargo S05E03 720p",
            "season": "5",
            "episode": "03",
            "size_bytes": "123456",
            "date_released_unix": 1700000000
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.season, 5);
        assert_eq!(listing.episode, 3);
        assert_eq!(listing.size_bytes, 123_456);
        assert_eq!(
            listing.released.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_invalid_timestamp_is_unset() {
        let json = r#"{"title": "x", "season": "bad", "date_released_unix": "null"}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.season, 0);
        assert!(listing.released.is_none());
        assert!(listing.to_string().starts_with("- x"));
    }
}
