use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants;
use crate::quality::QualitySelector;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub transmission: TransmissionConfig,

    pub catalog: CatalogConfig,

    pub data: DataConfig,

    pub quality: QualityConfig,

    #[serde(default)]
    pub shows: Vec<TrackedShowEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Shows reconciled at the same time by `update-all`
    pub max_concurrent_updates: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
            max_concurrent_updates: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    pub url: String,

    pub user: String,

    /// Falls back to `TRANSMISSION_PASSWORD` when empty.
    pub password: String,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            url: constants::transmission::DEFAULT_URL.to_string(),
            user: "admin".to_string(),
            password: String::new(),
        }
    }
}

impl TransmissionConfig {
    #[must_use]
    pub fn effective_password(&self) -> String {
        if self.password.is_empty() {
            std::env::var(constants::transmission::PASSWORD_ENV).unwrap_or_default()
        } else {
            self.password.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: constants::catalog::DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub default_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            default_path: "~/eztv".to_string(),
        }
    }
}

impl DataConfig {
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        expand_user(&self.default_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Ordered quality tags used to pick between competing releases.
    pub preferences: Vec<String>,
}

impl QualityConfig {
    /// Selector for the configured tags; an empty list means the defaults.
    #[must_use]
    pub fn selector(&self) -> QualitySelector {
        if self.preferences.iter().all(|p| p.trim().is_empty()) {
            QualitySelector::default()
        } else {
            QualitySelector::new(&self.preferences)
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            preferences: constants::DEFAULT_QUALITY_PREFERENCES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedShowEntry {
    pub title: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl TrackedShowEntry {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            path: None,
        }
    }

    /// Base directory holding this show's folder.
    #[must_use]
    pub fn base_dir(&self, data: &DataConfig) -> PathBuf {
        self.path
            .as_deref()
            .map_or_else(|| data.base_dir(), expand_user)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            transmission: TransmissionConfig::default(),
            catalog: CatalogConfig::default(),
            data: DataConfig::default(),
            quality: QualityConfig::default(),
            shows: Vec::new(),
        }
    }
}

impl Config {
    /// Resolves the config file to use: the explicit path when given, else the
    /// first existing candidate, else the default location.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return expand_user(&path.to_string_lossy());
        }

        Self::config_paths()
            .into_iter()
            .find(|p| p.exists())
            .unwrap_or_else(Self::default_config_path)
    }

    /// Loads `path`, or the defaults when it does not exist. Runs before
    /// logging is set up, so the outcome is reported by [`Self::source_message`].
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from_path(path);
        }
        Ok(Self::default())
    }

    #[must_use]
    pub fn source_message(path: &Path) -> String {
        if path.exists() {
            format!("Loaded config from: {}", path.display())
        } else {
            format!("No config file at {}, using defaults", path.display())
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Writes the config after deduplicating tracked shows by URL and sorting
    /// them by title.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.shows = dedup_shows(&self.shows);

        let content = toml::to_string_pretty(&normalized)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Saves the config unless this is a dry run. Returns whether it wrote.
    pub fn persist(&self, path: &Path, dry_run: bool) -> Result<bool> {
        if dry_run {
            info!("Dry run, not saving config to: {}", path.display());
            return Ok(false);
        }
        self.save_to_path(path)?;
        Ok(true)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("eztrack.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("eztrack").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".eztrack.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("eztrack.toml"),
            |dir| dir.join("eztrack").join("config.toml"),
        )
    }

    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.transmission.url.is_empty() {
            anyhow::bail!("Transmission URL cannot be empty");
        }

        if self.general.max_concurrent_updates == 0 {
            anyhow::bail!("max_concurrent_updates must be > 0");
        }

        Ok(())
    }

    #[must_use]
    pub fn find_show(&self, url: &str) -> Option<&TrackedShowEntry> {
        self.shows.iter().find(|s| s.url == url)
    }

    /// Appends a tracked show unless its URL is already tracked.
    pub fn track_show(&mut self, entry: TrackedShowEntry) -> bool {
        if self.find_show(&entry.url).is_some() {
            return false;
        }
        self.shows.push(entry);
        true
    }

    /// Base directory for a show, honouring a tracked path override.
    #[must_use]
    pub fn base_dir_for(&self, url: &str) -> PathBuf {
        self.find_show(url)
            .map_or_else(|| self.data.base_dir(), |entry| entry.base_dir(&self.data))
    }
}

fn dedup_shows(shows: &[TrackedShowEntry]) -> Vec<TrackedShowEntry> {
    let mut by_url: HashMap<&str, &TrackedShowEntry> = HashMap::new();

    for show in shows {
        if by_url.insert(show.url.as_str(), show).is_some() {
            warn!(url = %show.url, "Duplicate tracked show entry, keeping the later one");
        }
    }

    let mut deduped: Vec<TrackedShowEntry> = by_url.into_values().cloned().collect();
    deduped.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.url.cmp(&b.url)));
    deduped
}

#[must_use]
pub fn expand_user(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transmission.url, "http://localhost:9091");
        assert_eq!(config.transmission.user, "admin");
        assert_eq!(config.quality.preferences, vec!["1080p", "720p", "HDTV"]);
        assert_eq!(config.general.max_concurrent_updates, 3);
        assert!(config.shows.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [transmission]
            url = "http://nas:9091"

            [data]
            default_path = "/srv/tv"

            [[shows]]
            title = "Mr Robot"
            url = "https://eztv.re/shows/1/mr-robot/"

            [[shows]]
            title = "Fargo"
            url = "https://eztv.re/shows/2/fargo/"
            path = "/srv/other"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.transmission.url, "http://nas:9091");
        assert_eq!(config.transmission.user, "admin");
        assert_eq!(config.data.base_dir(), PathBuf::from("/srv/tv"));
        assert_eq!(config.shows.len(), 2);
        assert_eq!(
            config.base_dir_for("https://eztv.re/shows/2/fargo/"),
            PathBuf::from("/srv/other")
        );
        assert_eq!(
            config.base_dir_for("https://eztv.re/shows/1/mr-robot/"),
            PathBuf::from("/srv/tv")
        );
    }

    #[test]
    fn test_dedup_later_entry_wins_and_sorts_by_title() {
        let mut late = TrackedShowEntry::new("Zeta", "u1");
        late.path = Some("/late".to_string());
        let shows = vec![
            TrackedShowEntry::new("Zeta", "u1"),
            TrackedShowEntry::new("Alpha", "u2"),
            late.clone(),
        ];

        let deduped = dedup_shows(&shows);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "Alpha");
        assert_eq!(deduped[1], late);
    }

    #[test]
    fn test_track_show_ignores_known_url() {
        let mut config = Config::default();
        assert!(config.track_show(TrackedShowEntry::new("A", "u")));
        assert!(!config.track_show(TrackedShowEntry::new("A again", "u")));
        assert_eq!(config.shows.len(), 1);
    }

    #[test]
    fn test_save_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("eztrack-config-{}", std::process::id()))
            .join("config.toml");
        let mut config = Config::default();
        config.shows = vec![
            TrackedShowEntry::new("B", "u1"),
            TrackedShowEntry::new("B", "u1"),
        ];

        config.save_to_path(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.shows, vec![TrackedShowEntry::new("B", "u1")]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    fn scratch_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("eztrack-{name}-{}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_persist_dry_run_leaves_file_untouched() {
        let path = scratch_config_path("persist-dry");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let original = "# hand written\n[[shows]]\ntitle = \"Zeta\"\nurl = \"u1\"\n";
        std::fs::write(&path, original).unwrap();

        let mut config = Config::load(&path).unwrap();
        config.track_show(TrackedShowEntry::new("Alpha", "u2"));

        assert!(!config.persist(&path, true).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_persist_live_writes_deduped_sorted_shows() {
        let path = scratch_config_path("persist-live");
        let mut config = Config::default();
        config.shows = vec![
            TrackedShowEntry::new("Zeta", "u1"),
            TrackedShowEntry::new("Alpha", "u2"),
            TrackedShowEntry::new("Zeta", "u1"),
        ];

        assert!(config.persist(&path, false).unwrap());
        let loaded = Config::load(&path).unwrap();
        assert_eq!(
            loaded.shows,
            vec![
                TrackedShowEntry::new("Alpha", "u2"),
                TrackedShowEntry::new("Zeta", "u1"),
            ]
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_source_message() {
        let path = scratch_config_path("source");
        assert!(Config::source_message(&path).starts_with("No config file at"));

        Config::default().save_to_path(&path).unwrap();
        assert_eq!(
            Config::source_message(&path),
            format!("Loaded config from: {}", path.display())
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_empty_preferences_fall_back_to_defaults() {
        let config: Config = toml::from_str("[quality]\npreferences = []\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.quality.selector(), QualitySelector::default());

        let custom: Config = toml::from_str("[quality]\npreferences = [\"480p\"]\n").unwrap();
        assert_eq!(custom.quality.selector().preferences(), &["480p"]);
    }
}
