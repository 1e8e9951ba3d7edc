//! Shared configuration for netsig tools.
//!
//! A TOML file layered over built-in defaults and `NETSIG_` environment
//! variables, translated to `netsig_core::SignalConfig` for the engine.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netsig_core::SignalConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Indicator policy knobs handed to the engine.
    #[serde(default)]
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

const OUTPUT_FORMATS: [&str; 5] = ["table", "json", "json-compact", "yaml", "plain"];
const COLOR_MODES: [&str; 3] = ["auto", "always", "never"];

impl Config {
    /// Check every field and build the engine config.
    pub fn to_signal_config(&self) -> Result<SignalConfig, ConfigError> {
        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "'{}' is not one of {}",
                    self.defaults.output,
                    OUTPUT_FORMATS.join(", ")
                ),
            });
        }
        if !COLOR_MODES.contains(&self.defaults.color.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.color".into(),
                reason: format!(
                    "'{}' is not one of {}",
                    self.defaults.color,
                    COLOR_MODES.join(", ")
                ),
            });
        }
        self.signal
            .validate()
            .map_err(|e| ConfigError::Validation {
                field: "signal".into(),
                reason: e.to_string(),
            })?;
        Ok(self.signal.clone())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "netsig", "netsig").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netsig");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETSIG_").split("__"))
}

/// Load the full Config from the canonical file + environment. A missing
/// file is not an error.
pub fn load_config() -> Result<Config, ConfigError> {
    let config: Config = figment_for(&config_path()).extract()?;
    Ok(config)
}

/// Load from an explicit path, which must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let config: Config = figment_for(path).extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write a default config file. Refuses to overwrite unless `force`.
pub fn init_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    save_config_to(&Config::default(), path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "netsig.toml",
                r#"
                [defaults]
                output = "json"

                [signal]
                max_wifi_level = 6
                no_internet_label = "Offline"
                "#,
            )?;
            let cfg = load_config_from(Path::new("netsig.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(cfg.defaults.color, "auto");
            assert_eq!(cfg.signal.max_wifi_level, 6);
            assert_eq!(cfg.signal.no_internet_label, "Offline");
            assert!(cfg.signal.has_mobile_data);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("netsig.toml", "[signal]\nhas_mobile_data = true\n")?;
            jail.set_env("NETSIG_SIGNAL__HAS_MOBILE_DATA", "false");
            jail.set_env("NETSIG_SIGNAL__HISTORY_SIZE", "8");
            let cfg = load_config_from(Path::new("netsig.toml")).map_err(|e| e.to_string())?;
            assert!(!cfg.signal.has_mobile_data);
            assert_eq!(cfg.signal.history_size, 8);
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config_from(Path::new("/nonexistent/netsig.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = Config::default();
        assert_eq!(cfg.to_signal_config().unwrap(), SignalConfig::default());

        cfg.signal.max_wifi_level = 12;
        let err = cfg.to_signal_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "signal"));

        let cfg = Config {
            defaults: Defaults {
                output: "xml".into(),
                ..Defaults::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            cfg.to_signal_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "defaults.output"
        ));
    }

    #[test]
    fn init_writes_loadable_defaults_once() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested").join("config.toml");
            init_config(&path, false).map_err(|e| e.to_string())?;
            assert!(matches!(
                init_config(&path, false),
                Err(ConfigError::AlreadyExists { .. })
            ));
            init_config(&path, true).map_err(|e| e.to_string())?;

            let cfg = load_config_from(&path).map_err(|e| e.to_string())?;
            assert_eq!(cfg, Config::default());
            Ok(())
        });
    }
}
