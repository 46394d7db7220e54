pub mod connection;

pub use connection::{ConnectionConfig, ConnectionError, ConnectionMode, NetworkConfig, NetworkInput, resolve};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct SqlChatConfig {
    pub ai: AIConfig,
    pub database: DatabaseConfig,
    pub agent: AgentConfig,
    pub log: LogConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AIConfig {
    pub model: String,
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix.
    pub url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: Option<f32>,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            model: "meta-llama/llama-4-maverick-17b-128e-instruct".to_string(),
            url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{0} not found. Add it to your environment or a .env file.")]
pub struct MissingApiKey(pub String);

impl AIConfig {
    pub fn api_key(&self) -> Result<String, MissingApiKey> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    /// Looks the key up through `lookup`; an empty value counts as missing.
    pub fn api_key_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, MissingApiKey> {
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(MissingApiKey(self.api_key_env.clone())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file used in local mode. Relative paths resolve against the working directory.
    pub local_file: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            local_file: PathBuf::from("student.db"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Upper bound on model turns spent answering one question.
    pub max_iterations: usize,
    /// Row limit the model is asked to respect unless the question says otherwise.
    pub top_k: usize,
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            top_k: 10,
            verbose: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn file_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("sqlchat.log"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl SqlChatConfig {
    pub fn path() -> Option<PathBuf> {
        let home_dir = std::env::var("HOME").ok()?;
        Some(PathBuf::from(format!("{home_dir}/.config/sqlchat/config.toml")))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let config_file = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&config_file).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get_or_default() -> Self {
        let Some(path) = Self::path() else {
            return SqlChatConfig::default();
        };

        if !path.exists() {
            return SqlChatConfig::default();
        }

        Self::load_from(&path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default configuration");
            SqlChatConfig::default()
        })
    }
}
