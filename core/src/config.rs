//! Layered configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. a TOML file: `--config` / `SEQEDSL_CONFIG_PATH`, else `seqedsl.toml` in
//!    the working directory if present
//! 3. `SEQEDSL__SECTION__KEY` environment variables
//! 4. explicit builder overrides
//!
//! A `.env` file is read before any of this happens.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::dictionary::{CommandDictionary, DictionaryError, EmptyDictionary, StaticDictionary};
use crate::translator::{ShadowPrecedence, TranslateOptions};

const CONFIG_PATH_ENV: &str = "SEQEDSL_CONFIG_PATH";
const ENV_PREFIX: &str = "SEQEDSL";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_CONFIG_NAME: &str = "seqedsl";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TranslationConfig {
    /// Which declaration wins when a name is both a local and a parameter
    #[serde(default)]
    pub shadowing: ShadowPrecedence,
    /// JSON or TOML command dictionary
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from the default sources with no overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    pub fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            shadowing: self.translation.shadowing,
        }
    }

    /// The configured command dictionary, or an empty one when none is set.
    pub fn dictionary(&self) -> Result<Arc<dyn CommandDictionary>, DictionaryError> {
        match &self.translation.dictionary_path {
            Some(path) => Ok(Arc::new(StaticDictionary::load(path)?)),
            None => Ok(Arc::new(EmptyDictionary)),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    dictionary_path: Option<PathBuf>,
    shadowing: Option<ShadowPrecedence>,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn dictionary_path(mut self, path: Option<PathBuf>) -> Self {
        self.dictionary_path = path;
        self
    }

    pub fn shadowing(mut self, shadowing: Option<ShadowPrecedence>) -> Self {
        self.shadowing = shadowing;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        dotenvy::dotenv().ok();

        let explicit_path = self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut builder = config::Config::builder()
            .set_default("translation.shadowing", "locals-first")?
            .set_default("logging.level", default_log_level())?;

        builder = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                tracing::debug!(path = %path.display(), "Loading config file");
                builder.add_source(config::File::from(path).required(true))
            }
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR),
        );

        let mut config: Config = builder.build()?.try_deserialize()?;

        if let Some(path) = self.dictionary_path {
            config.translation.dictionary_path = Some(path);
        }
        if let Some(shadowing) = self.shadowing {
            config.translation.shadowing = shadowing;
        }

        Ok(config)
    }
}
