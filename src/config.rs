use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::serializers::{DEFAULT_SERVICE_USERS_ROLE, SerializerOptions};

/// Overrides the config file location when `--config` is not given
pub const CONFIG_ENV_VAR: &str = "DOCFLOW_TRANSFER_CONFIG";

/// A named target repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Snapshot file backing the repository session
    pub repository: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub current_environment: Option<String>,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(skip)]
    path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_pretty_output")]
    pub pretty_output: bool,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_service_users_role")]
    pub service_users_role: String,
}

fn default_pretty_output() -> bool {
    true
}

fn default_log_file() -> PathBuf {
    PathBuf::from("docflow-transfer.log")
}

fn default_service_users_role() -> String {
    DEFAULT_SERVICE_USERS_ROLE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pretty_output: default_pretty_output(),
            log_file: default_log_file(),
            service_users_role: default_service_users_role(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("docflow-transfer")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".docflow-transfer")
        };
        Ok(config_dir.join("config.toml"))
    }

    /// Explicit path, then the environment override, then the platform default
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Self::get_config_path(),
        }
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(Self::resolve_path(explicit)?)
    }

    pub fn load_from(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using default config");
            return Ok(Self {
                path: config_path,
                ..Self::default()
            });
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        config.path = config_path;

        debug!(
            "Loaded config with {} environments",
            config.environments.len()
        );
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        debug!("Saving config to: {:?}", self.path);

        if let Some(config_dir) = self.path.parent() {
            if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
                fs::create_dir_all(config_dir)
                    .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
                info!("Created config directory: {:?}", config_dir);
            }
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&self.path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", self.path))?;

        info!("Config saved successfully");
        Ok(())
    }

    pub fn add_environment(&mut self, name: String, environment: EnvironmentConfig) -> Result<()> {
        info!("Adding environment: {}", name);
        self.environments.insert(name.clone(), environment);

        // First environment becomes the current one
        if self.current_environment.is_none() {
            self.current_environment = Some(name.clone());
            info!("Set {} as current environment", name);
        }

        self.save()
    }

    pub fn set_current_environment(&mut self, name: String) -> Result<()> {
        if !self.environments.contains_key(&name) {
            anyhow::bail!("Environment '{}' not found", name);
        }

        info!("Setting current environment to: {}", name);
        self.current_environment = Some(name);
        self.save()
    }

    pub fn list_environments(&self) -> Vec<&String> {
        self.environments.keys().collect()
    }

    pub fn remove_environment(&mut self, name: &str) -> Result<()> {
        if self.environments.remove(name).is_none() {
            anyhow::bail!("Environment '{}' not found", name);
        }
        info!("Removing environment: {}", name);

        if self.current_environment.as_deref() == Some(name) {
            warn!("Removed current environment, clearing current selection");
            self.current_environment = None;
        }

        self.save()
    }

    /// The named environment, or the current one when no name is given
    pub fn resolve_environment<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a EnvironmentConfig)> {
        let name = match name {
            Some(name) => name,
            None => self.current_environment.as_deref().context(
                "No environment selected. Add one with 'docflow-transfer env add' or pass --env",
            )?,
        };
        let environment = self
            .environments
            .get(name)
            .with_context(|| format!("Environment '{}' not found", name))?;
        Ok((name, environment))
    }

    pub fn serializer_options(&self) -> SerializerOptions {
        SerializerOptions {
            service_users_role: self.settings.service_users_role.clone(),
        }
    }
}
