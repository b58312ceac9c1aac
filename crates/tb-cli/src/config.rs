//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tb_store::EventStore;

/// Directory name used under the platform config and data directories.
const APP_DIR: &str = "timeblocks";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one JSON file per date. All writes go here.
    pub data_dir: PathBuf,
    /// Older data directory, consulted only when a date is missing from
    /// `data_dir`.
    pub legacy_data_dir: Option<PathBuf>,
    /// Categories offered by `tb tags`.
    pub tags: Vec<String>,
    /// Additional categories, offered only when `extra_tags_enabled` is set.
    pub extra_tags: Vec<String>,
    pub extra_tags_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from(APP_DIR));
        Self {
            data_dir,
            legacy_data_dir: Some(PathBuf::from("data")),
            tags: ["Rest", "Sleep", "Sport", "Study", "Work"]
                .into_iter()
                .map(String::from)
                .collect(),
            extra_tags: Vec::new(),
            extra_tags_enabled: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TB_*)
        figment = figment.merge(Env::prefixed("TB_"));

        figment.extract()
    }

    /// Builds the event store described by this configuration.
    #[must_use]
    pub fn store(&self) -> EventStore {
        EventStore::new(&self.data_dir, self.legacy_data_dir.clone())
    }

    /// Categories to offer, sorted and without blanks or duplicates.
    #[must_use]
    pub fn available_tags(&self) -> Vec<String> {
        let extra = if self.extra_tags_enabled {
            self.extra_tags.as_slice()
        } else {
            &[]
        };
        let mut tags: Vec<String> = self
            .tags
            .iter()
            .chain(extra)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        // Exact duplicates must be adjacent for dedup.
        tags.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        tags.dedup();
        tags
    }
}

/// Returns the platform-specific config directory for timeblocks.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Returns the platform-specific data directory for timeblocks.
///
/// On Linux: `~/.local/share/timeblocks`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(APP_DIR))
}
