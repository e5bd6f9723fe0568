//! Configuration management with file persistence
//!
//! Settings resolve in layers: built-in defaults, then `config.toml` in the
//! config directory, then `WAREHOUSE_MANAGEMENT_*` environment variables.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::storage::{DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS};

/// Prefix of every environment variable read by [`Settings::load`]
pub const ENV_PREFIX: &str = "WAREHOUSE_MANAGEMENT_";

/// Dotenv file read in the local environment
pub const LOCAL_ENV_FILE: &str = ".env.local";

const CONFIG_DIR_VAR: &str = "WAREHOUSE_MANAGEMENT_CONFIG_DIR";

const KEYS: [&str; 3] = ["env", "database.url", "database.max_connections"];

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    Local,
    Development,
    Production,
}

impl Env {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Environment selected by `WAREHOUSE_MANAGEMENT_ENV`, local when unset
    pub fn selected() -> anyhow::Result<Self> {
        match env::var(format!("{}ENV", ENV_PREFIX)) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }
}

impl FromStr for Env {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(anyhow!(
                "Invalid environment: {}. Valid options: local, development, production",
                other
            )),
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Warehouse settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub env: Env,
    pub database: DatabaseSettings,
}

impl Settings {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_VAR) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("warehouse")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load settings from the config file and the process environment
    pub fn load() -> anyhow::Result<Self> {
        let mut settings = Self::load_file(&Self::config_path()?)?;
        settings.apply_env(|key| env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings stored in `path`, or the defaults if it doesn't exist
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay `WAREHOUSE_MANAGEMENT_*` variables resolved through `lookup`
    ///
    /// `WAREHOUSE_MANAGEMENT_URL` is accepted as an alias of
    /// `WAREHOUSE_MANAGEMENT_DATABASE_URL`, which wins when both are set.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("ENV") {
            self.set("env", &value)?;
        }
        if let Some(value) = var("DATABASE_URL").or_else(|| var("URL")) {
            self.set("database.url", &value)?;
        }
        if let Some(value) = var("DATABASE_MAX_CONNECTIONS") {
            self.set("database.max_connections", &value)?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_url(&self.database.url)?;
        validate_max_connections(self.database.max_connections)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "env" => Ok(self.env.to_string()),
            "database.url" => Ok(self.database.url.clone()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "env" => {
                self.env = value.parse()?;
            }
            "database.url" => {
                let url = value.trim();
                validate_url(url)?;
                self.database.url = url.to_string();
            }
            "database.max_connections" => {
                let max: u32 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                validate_max_connections(max)?;
                self.database.max_connections = max;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.into_iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn validate_url(url: &str) -> anyhow::Result<()> {
    if url.is_empty() {
        return Err(anyhow!("Database URL cannot be empty"));
    }
    if !url.starts_with("sqlite:") {
        return Err(anyhow!(
            "Unsupported database URL: {}. Only sqlite: URLs are supported",
            url
        ));
    }
    Ok(())
}

fn validate_max_connections(max: u32) -> anyhow::Result<()> {
    if max == 0 {
        return Err(anyhow!("database.max_connections must be at least 1"));
    }
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `warehouse config list` to see available keys.",
        key
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.env, Env::Local);
        assert_eq!(settings.database.url, "sqlite://warehouse.db");
        assert_eq!(settings.database.max_connections, 5);
        settings.validate().unwrap();
    }

    #[test]
    fn test_load_file_missing_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_file_partial_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "env = \"production\"\n\n[database]\nurl = \"sqlite:///var/lib/warehouse.db\"\n",
        )
        .unwrap();

        let settings = Settings::load_file(&path).unwrap();

        assert_eq!(settings.env, Env::Production);
        assert_eq!(settings.database.url, "sqlite:///var/lib/warehouse.db");
        assert_eq!(settings.database.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_load_file_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        for contents in [
            "[database]\nurl = \"postgres://localhost/warehouse\"\n",
            "[database]\nmax_connections = 0\n",
            "env = \"staging\"\n",
            "not toml at all [",
        ] {
            fs::write(&path, contents).unwrap();
            assert!(Settings::load_file(&path).is_err(), "accepted {:?}", contents);
        }
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env(lookup(&[
                ("WAREHOUSE_MANAGEMENT_ENV", "development"),
                ("WAREHOUSE_MANAGEMENT_DATABASE_URL", "sqlite::memory:"),
                ("WAREHOUSE_MANAGEMENT_DATABASE_MAX_CONNECTIONS", "2"),
            ]))
            .unwrap();

        assert_eq!(settings.env, Env::Development);
        assert_eq!(settings.database.url, "sqlite::memory:");
        assert_eq!(settings.database.max_connections, 2);
    }

    #[test]
    fn test_env_url_alias() {
        let mut settings = Settings::default();
        settings
            .apply_env(lookup(&[("WAREHOUSE_MANAGEMENT_URL", "sqlite://alias.db")]))
            .unwrap();
        assert_eq!(settings.database.url, "sqlite://alias.db");

        settings
            .apply_env(lookup(&[
                ("WAREHOUSE_MANAGEMENT_URL", "sqlite://alias.db"),
                ("WAREHOUSE_MANAGEMENT_DATABASE_URL", "sqlite://primary.db"),
            ]))
            .unwrap();
        assert_eq!(settings.database.url, "sqlite://primary.db");
    }

    #[test]
    fn test_env_invalid_value_rejected() {
        let mut settings = Settings::default();
        let result =
            settings.apply_env(lookup(&[("WAREHOUSE_MANAGEMENT_DATABASE_MAX_CONNECTIONS", "many")]));
        assert!(result.is_err());
        assert_eq!(settings.database.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_get_set_list() {
        let mut settings = Settings::default();

        settings.set("database.url", "sqlite://other.db").unwrap();
        settings.set("env", "Production").unwrap();

        assert_eq!(settings.get("database.url").unwrap(), "sqlite://other.db");
        assert_eq!(settings.get("env").unwrap(), "production");
        assert!(settings.get("llm.model").is_err());
        assert!(settings.set("database.max_connections", "0").is_err());
        assert!(settings.set("database.url", "").is_err());

        let keys: Vec<String> = settings.list().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["env", "database.url", "database.max_connections"]);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut settings = Settings::default();
        settings.set("database.max_connections", "8").unwrap();

        fs::write(&path, toml::to_string_pretty(&settings).unwrap()).unwrap();

        assert_eq!(Settings::load_file(&path).unwrap(), settings);
    }
}
