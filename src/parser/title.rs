use regex::Regex;
use std::sync::OnceLock;

use crate::constants::VIDEO_EXTENSIONS;

/// Season/episode parsed from a free-text release title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub title: String,
    pub season: i32,
    pub episode: i32,
}

impl ParsedTitle {
    #[must_use]
    pub const fn is_parsed(&self) -> bool {
        self.season >= 0 && self.episode >= 0
    }
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"(?i)^(?P<title>.*?)\s*S?(?P<season>[0-9]+)[Ex](?P<episode>[0-9]+).*$")
}

fn release_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?i)^(?P<title>.*?)\s*S?(?P<season>[0-9]+)[Ex](?P<episode>[0-9]+).*\.(?:{})$",
            VIDEO_EXTENSIONS.join("|")
        );
        Regex::new(&pattern).expect("Invalid regex pattern defined in code")
    })
}

fn parse_number(s: &str) -> Option<i32> {
    s.parse::<i32>().ok()
}

/// Parses `(title, season, episode)` out of a release title.
///
/// Unparseable titles come back unchanged with season and episode set to `-1`.
#[must_use]
pub fn parse_title(raw: &str) -> ParsedTitle {
    let unparsed = || ParsedTitle {
        title: raw.to_string(),
        season: -1,
        episode: -1,
    };

    let Some(caps) = title_regex().captures(raw) else {
        return unparsed();
    };

    let (Some(season), Some(episode)) = (
        caps.name("season").and_then(|m| parse_number(m.as_str())),
        caps.name("episode").and_then(|m| parse_number(m.as_str())),
    ) else {
        return unparsed();
    };

    ParsedTitle {
        title: caps
            .name("title")
            .map_or("", |m| m.as_str())
            .trim_end()
            .to_string(),
        season,
        episode,
    }
}

/// Parses `(season, episode)` out of an on-disk file name, accepting only
/// known video container extensions.
#[must_use]
pub fn parse_release_file(filename: &str) -> Option<(i32, i32)> {
    let caps = release_file_regex().captures(filename)?;
    let season = parse_number(caps.name("season")?.as_str())?;
    let episode = parse_number(caps.name("episode")?.as_str())?;
    Some((season, episode))
}
