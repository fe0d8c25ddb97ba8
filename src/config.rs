use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The default CameraHub server, used for the `prod` profile.
pub const DEFAULT_SERVER: &str = "https://camerahub.info/api";

/// Named connection profiles for reaching a CameraHub server.
///
/// Stored as `camerahub.json` in the user's home directory. Each profile
/// carries the server base URL and the basic-auth credentials for it, so a
/// single config can hold `prod`, `staging`, a local dev instance, and so on.
///
/// # Loading
///
/// ```rust,no_run
/// use camerahub_tagger::config::Config;
///
/// // From an explicit path
/// let config = Config::load(Some("camerahub.json".as_ref())).unwrap();
///
/// // Or the default location, falling back to defaults if absent
/// let config = Config::load(None).unwrap();
/// let profile = config.profile("prod").unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection profiles, keyed by profile name.
    pub profiles: BTreeMap<String, Profile>,
}

/// A single connection profile: server base URL plus credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub server: String,
    pub username: String,
    pub password: String,
}

/// Per-run options, constructed once from the CLI and immutable thereafter.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Search for scans recursively.
    pub recursive: bool,
    /// Don't prompt to identify scans, only guess based on filename.
    pub auto: bool,
    /// Accept all changes without per-file write confirmation.
    pub assume_yes: bool,
    /// Don't write any tags.
    pub dry_run: bool,
    /// A single image file to be tagged, instead of a directory sweep.
    pub file: Option<PathBuf>,
    /// Connection profile name.
    pub profile: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            auto: false,
            assume_yes: false,
            dry_run: false,
            file: None,
            profile: "prod".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "prod".to_string(),
            Profile {
                server: DEFAULT_SERVER.to_string(),
                username: String::new(),
                password: String::new(),
            },
        );
        Self { profiles }
    }
}

impl Config {
    /// Resolve the config file path — `camerahub.json` in the home directory.
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .context("Failed to resolve home directory")?;
        Ok(PathBuf::from(home).join("camerahub.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Look up a connection profile. Unknown profiles abort the run.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles.get(name).with_context(|| {
            format!(
                "No profile '{name}' in config (available: {})",
                self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })
    }
}

impl Profile {
    /// Server base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.server.trim_end_matches('/')
    }
}
