//! # llama-engine
//!
//! The "narrow waist" of the llama command server. Defines the traits the
//! server talks to when it loads a model, counts tokens and generates text.
//! Backends (candle, the deterministic mock) implement them; the server never
//! sees a tensor.
//!
//! ## Design Notes
//!
//! ### Two-phase lifecycle
//! Loading and using a model are separate traits. A [`ModelLoader`] turns a
//! [`ModelSpec`] into a boxed [`LanguageModel`]. Holding a `LanguageModel` is
//! the proof that loading succeeded, so there is no way to tokenize against a
//! model that was never loaded.
//!
//! ### Mutability
//! `generate` takes `&mut self` because the sampler RNG advances on every
//! call. Tokenization is read-only. The server owns exactly one model and
//! serves one request at a time, so no interior locking is required.
//!
//! ### Token Type
//! `TokenId` is `u32`, matching `tokenizers` and candle's index tensors.

use std::path::PathBuf;

pub mod mock;

pub use mock::{MockLoader, MockModel};

pub type Result<T> = std::result::Result<T, LlamaError>;

/// Token ID type.
pub type TokenId = u32;

/// Top-level error type for all engine operations.
#[derive(Debug, thiserror::Error)]
pub enum LlamaError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),
    #[error("Tokenization failed: {0}")]
    Tokenization(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Specification for loading a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Model directory (config.json, tokenizer.json, *.safetensors).
    pub path: PathBuf,
}

impl ModelSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Upper bound on newly sampled tokens.
    pub max_new_tokens: usize,
    /// Softmax temperature; must be > 0 (sampling is never greedy).
    pub temperature: f32,
}

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Prompt tokens followed by the sampled tokens.
    pub tokens: Vec<TokenId>,
    /// Number of leading entries in `tokens` that came from the prompt.
    pub prompt_len: usize,
}

impl Generation {
    /// Only the sampled tokens.
    pub fn new_tokens(&self) -> &[TokenId] {
        &self.tokens[self.prompt_len..]
    }
}

/// Loads a model and its tokenizer from a [`ModelSpec`].
///
/// Loading may take seconds to minutes and allocates device memory.
pub trait ModelLoader: Send + Sync {
    fn load(&self, spec: &ModelSpec) -> Result<Box<dyn LanguageModel>>;
}

/// A loaded causal language model together with its tokenizer.
pub trait LanguageModel: Send {
    /// Encode text, including the special tokens the tokenizer adds by default.
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Decode token IDs to text with special tokens stripped.
    fn detokenize(&self, tokens: &[TokenId]) -> Result<String>;

    /// Sample a continuation of `prompt` autoregressively.
    fn generate(&mut self, prompt: &[TokenId], params: &GenerationParams) -> Result<Generation>;

    /// The architectural position limit of the model.
    fn max_position_embeddings(&self) -> usize;
}
