//! Configuration management for offsite

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Default site origin served by the gateway
pub const DEFAULT_SITE_URL: &str = "https://www.meridianstudio.dev";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the site (same-origin requests are cacheable)
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Quote mail-relay endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,

    /// Opaque token the relay expects in the X-Relay-Token header.
    /// Issued server-side; this client only forwards it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_token: Option<String>,

    /// Scheduling provider URL for the quote wizard's Schedule action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_url: Option<String>,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,
}

fn default_site_url() -> String {
    DEFAULT_SITE_URL.to_string()
}

/// User preferences
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Preferences {
    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".offsite").join("config.yaml"))
    }

    /// Resolve the config path from an optional override
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration, honoring a path override
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration, honoring a path override
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        let path = Self::resolve_path(path)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// The relay URL, or an error directing the user to `offsite init`
    pub fn require_relay_url(&self) -> Result<&str> {
        self.relay_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRelayUrl.into())
    }

    /// The scheduling URL, or an error directing the user to `offsite init`
    pub fn require_scheduling_url(&self) -> Result<&str> {
        self.scheduling_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSchedulingUrl.into())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            relay_url: None,
            relay_token: None,
            scheduling_url: None,
            preferences: Preferences::default(),
        }
    }
}
