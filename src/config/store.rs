use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::Config;

const CONFIG_ENV: &str = "AUDIOGRAB_CONFIG";
const CONFIG_FILE_NAME: &str = ".audiograb_config.json";

/// Reads and writes the per-user settings file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    /// Set when the file exists but could not be read as a JSON object.
    /// Plain saves then leave it alone; only `reset` replaces it.
    unreadable: bool,
}
impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            unreadable: false,
        }
    }

    /// `$AUDIOGRAB_CONFIG`, or the settings file in the home directory.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored settings. A missing or broken file yields defaults;
    /// a readable object keeps every value that still makes sense.
    #[tracing::instrument(skip(self), fields(path = ?self.path))]
    pub async fn load(&mut self) -> Config {
        self.unreadable = false;

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored config, using defaults");
                return Config::default();
            }
            Err(e) => {
                warn!(?e, "Could not read config, using defaults");
                self.unreadable = true;
                return Config::default();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(stored)) => {
                let config = Config::from_stored(stored);
                trace!(?config, "Loaded config");
                config
            }
            Ok(_) => {
                warn!("Config file is not a JSON object, using defaults");
                self.unreadable = true;
                Config::default()
            }
            Err(e) => {
                warn!(%e, "Invalid config file, using defaults");
                self.unreadable = true;
                Config::default()
            }
        }
    }

    #[tracing::instrument(skip_all, fields(path = ?self.path))]
    pub async fn save(&self, config: &Config) -> anyhow::Result<()> {
        if self.unreadable {
            bail!(
                "{} could not be parsed, leaving it untouched (use --reset to replace it)",
                self.path.display()
            );
        }
        self.write(config).await
    }

    async fn write(&self, config: &Config) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(config)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!("Config saved");

        Ok(())
    }

    /// Overwrite the stored settings with defaults and return them.
    pub async fn reset(&mut self) -> anyhow::Result<Config> {
        let config = Config::default();
        self.write(&config).await?;
        self.unreadable = false;
        Ok(config)
    }
}
