//! Command dictionary capability
//!
//! The translator never decides what a command's parameters are called. When a
//! dictionary knows a stem it supplies the parameter names used to label
//! positional arguments; when it does not, labels fall back to `argN`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Definition of one command stem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub stem: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentDefinition>,
}

/// One parameter slot of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    pub name: String,
    /// Field names of a repeat group, in column order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Vec<String>>,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repeat: None,
        }
    }

    pub fn repeat(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            repeat: Some(fields),
        }
    }
}

/// Lookup capability injected into the translator.
pub trait CommandDictionary: Send + Sync {
    fn lookup(&self, stem: &str) -> Option<&CommandDefinition>;

    /// Ordered parameter names for `stem`, or `None` when the stem is unknown.
    fn parameter_names(&self, stem: &str) -> Option<Vec<&str>> {
        self.lookup(stem)
            .map(|def| def.arguments.iter().map(|arg| arg.name.as_str()).collect())
    }
}

/// Dictionary that knows no commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDictionary;

impl CommandDictionary for EmptyDictionary {
    fn lookup(&self, _stem: &str) -> Option<&CommandDefinition> {
        None
    }
}

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON dictionary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML dictionary: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("duplicate command stem '{0}'")]
    DuplicateStem(String),
}

/// On-disk dictionary layout: `{ "commands": [ ... ] }`.
#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    commands: Vec<CommandDefinition>,
}

/// In-memory dictionary keyed by stem.
#[derive(Debug, Clone, Default)]
pub struct StaticDictionary {
    commands: HashMap<String, CommandDefinition>,
}

impl StaticDictionary {
    pub fn new(definitions: Vec<CommandDefinition>) -> Result<Self, DictionaryError> {
        let mut commands = HashMap::with_capacity(definitions.len());
        for def in definitions {
            if commands.contains_key(&def.stem) {
                return Err(DictionaryError::DuplicateStem(def.stem));
            }
            commands.insert(def.stem.clone(), def);
        }
        Ok(Self { commands })
    }

    pub fn from_json(source: &str) -> Result<Self, DictionaryError> {
        let file: DictionaryFile = serde_json::from_str(source)?;
        Self::new(file.commands)
    }

    pub fn from_toml(source: &str) -> Result<Self, DictionaryError> {
        let file: DictionaryFile = toml::from_str(source)?;
        Self::new(file.commands)
    }

    /// Load a dictionary file; `.toml` files are read as TOML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let source = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let dictionary = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&source)?,
            _ => Self::from_json(&source)?,
        };
        tracing::debug!(
            path = %path.display(),
            commands = dictionary.len(),
            "Loaded command dictionary"
        );
        Ok(dictionary)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandDictionary for StaticDictionary {
    fn lookup(&self, stem: &str) -> Option<&CommandDefinition> {
        self.commands.get(stem)
    }
}
