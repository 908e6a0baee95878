//! Server configuration and runtime state.

use std::path::PathBuf;

use llama_engine::{GenerationParams, LanguageModel, ModelSpec};

use crate::error::CommandError;

/// Startup parameters. Read-only once the server runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Model directory handed to the loader on LOAD.
    pub model_path: PathBuf,
    pub port: u16,
    /// Operator token budget for TOKENIZE; capped by the model's position limit.
    pub max_input_tokens: usize,
    pub max_new_tokens: usize,
    pub temperature: f32,
}

impl ServerConfig {
    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec::new(&self.model_path)
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
        }
    }
}

/// Whether a model is resident.
///
/// A loaded model and its effective input limit are set together and only
/// replaced as a pair.
#[derive(Default)]
pub enum ModelState {
    #[default]
    Unloaded,
    Loaded {
        model: Box<dyn LanguageModel>,
        /// `min(max_input_tokens, model.max_position_embeddings())`
        effective_max_input_length: usize,
    },
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded { .. })
    }

    pub fn effective_max_input_length(&self) -> Option<usize> {
        match self {
            ModelState::Loaded {
                effective_max_input_length,
                ..
            } => Some(*effective_max_input_length),
            ModelState::Unloaded => None,
        }
    }

    /// The model and its effective input limit, or `NotLoaded`.
    pub fn loaded(&self) -> Result<(&dyn LanguageModel, usize), CommandError> {
        match self {
            ModelState::Loaded {
                model,
                effective_max_input_length,
            } => Ok((model.as_ref(), *effective_max_input_length)),
            ModelState::Unloaded => Err(CommandError::NotLoaded),
        }
    }

    pub fn loaded_mut(&mut self) -> Result<&mut dyn LanguageModel, CommandError> {
        match self {
            ModelState::Loaded { model, .. } => Ok(model.as_mut()),
            ModelState::Unloaded => Err(CommandError::NotLoaded),
        }
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelState::Unloaded => write!(f, "Unloaded"),
            ModelState::Loaded {
                effective_max_input_length,
                ..
            } => f
                .debug_struct("Loaded")
                .field("effective_max_input_length", effective_max_input_length)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything a command handler may read or change.
#[derive(Debug)]
pub struct ServerState {
    pub config: ServerConfig,
    pub model: ModelState,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            model: ModelState::Unloaded,
        }
    }
}
