pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "avi", "mp4", "asf", "mov", "flv", "swf", "qt", "vob", "ogg", "ogv", "yuv", "mpg",
    "mpg2", "mpeg", "mpv", "m4v",
];

/// Scene-tag suffix some trackers append to release names.
pub const SCENE_TAG_SUFFIX: &str = "[eztv]";

pub const DEFAULT_QUALITY_PREFERENCES: &[&str] = &["1080p", "720p", "HDTV"];

/// Folder under a show for releases without a season/episode.
pub const UNSORTED_DIR: &str = "incoming";

pub const USER_AGENT: &str = "eztrack/0.1";

pub mod catalog {

    pub const DEFAULT_BASE_URL: &str = "https://eztv.re";

    pub const MAX_PAGE_SIZE: usize = 100;

    pub const MAX_SEARCH_PAGES: usize = 50;
}

pub mod transmission {

    pub const DEFAULT_URL: &str = "http://localhost:9091";

    pub const RPC_PATH: &str = "/transmission/rpc";

    pub const SESSION_HEADER: &str = "X-Transmission-Session-Id";

    pub const PASSWORD_ENV: &str = "TRANSMISSION_PASSWORD";
}
