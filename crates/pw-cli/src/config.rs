//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pw_core::OverlapMode;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Context checked for overlaps when `--context` is not given.
    pub default_context: String,

    /// Overlap detection strategy.
    pub overlap_mode: OverlapMode,

    /// Length of the trailing metrics window in days.
    pub window_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_context: "personal".to_string(),
            overlap_mode: OverlapMode::Adjacent,
            window_days: 7,
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

        // Load from environment variables (PW_*)
        figment = figment.merge(Env::prefixed("PW_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for pw.
///
/// On Linux: `~/.config/pw`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pw"))
}
