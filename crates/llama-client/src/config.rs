//! Chat configuration file (`config.json`).
//!
//! Keys are camelCase. Missing keys take their defaults; unknown keys are
//! ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_INITIALIZER: &str = "You are ConsoleGPT. You are an AI that can talk to people \
through a terminal. You are talking to a user through a terminal.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Model directory passed to the server.
    pub model_path: String,
    /// Input token budget; the server caps it at the model's limit.
    pub max_input_length: usize,
    /// Tokens generated per reply.
    pub max_output_length: usize,
    pub temperature: f32,
    /// First line of every prompt.
    pub initializer: String,
    pub model_process_port: u16,
    pub user_name: String,
    pub model_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            max_input_length: 1024,
            max_output_length: 1024,
            temperature: 0.7,
            initializer: DEFAULT_INITIALIZER.to_string(),
            model_process_port: 5000,
            user_name: "User: ".to_string(),
            model_name: "ConsoleGPT: ".to_string(),
        }
    }
}

/// Result of [`ChatConfig::load_or_create`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigFile {
    Loaded(ChatConfig),
    /// No file existed; defaults were written and need filling in.
    Created(ChatConfig),
}

impl ChatConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or write the defaults there if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<ConfigFile, ConfigError> {
        if path.exists() {
            return Self::load(path).map(ConfigFile::Loaded);
        }
        let config = Self::default();
        config.save(path)?;
        tracing::info!(path = %path.display(), "wrote default config");
        Ok(ConfigFile::Created(config))
    }

    /// Write as JSON indented by four spaces.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        std::fs::write(path, out).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Positional arguments of `llama-server`, in order.
    pub fn server_args(&self) -> Vec<String> {
        vec![
            self.model_path.clone(),
            self.model_process_port.to_string(),
            self.max_input_length.to_string(),
            self.max_output_length.to_string(),
            self.temperature.to_string(),
        ]
    }

    pub fn endpoint(&self) -> String {
        format!("tcp://localhost:{}", self.model_process_port)
    }
}
