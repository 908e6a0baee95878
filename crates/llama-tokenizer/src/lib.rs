//! # llama-tokenizer
//!
//! Tokenization for the llama command server.
//!
//! This crate provides:
//! - A `Tokenizer` trait for pluggable tokenization backends
//! - [`HfTokenizer`], which loads a HuggingFace `tokenizer.json`
//! - A reference whitespace tokenizer with `<s>`/`</s>` specials for testing

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

mod hf;

pub use hf::HfTokenizer;

/// Error type for tokenization operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizerError {
    #[error("Failed to load tokenizer: {0}")]
    Load(String),
    #[error("Invalid token ID: {0}")]
    InvalidToken(u32),
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("Decoding error: {0}")]
    DecodingError(String),
}

pub type TokenizerResult<T> = std::result::Result<T, TokenizerError>;

/// Core tokenizer trait. Implementations can be swapped without changing app code.
pub trait Tokenizer: Send + Sync {
    /// Encode text into token IDs, optionally adding the tokenizer's special tokens (BOS etc.).
    fn encode(&self, text: &str, add_special_tokens: bool) -> TokenizerResult<Vec<u32>>;

    /// Decode token IDs into text, optionally dropping special tokens.
    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> TokenizerResult<String>;

    /// Get vocabulary size (including added tokens).
    fn vocab_size(&self) -> usize;
}

/// Beginning-of-sequence marker of [`WhitespaceTokenizer`].
pub const BOS: &str = "<s>";
/// End-of-sequence marker of [`WhitespaceTokenizer`].
pub const EOS: &str = "</s>";
pub const BOS_ID: u32 = 0;
pub const EOS_ID: u32 = 1;

/// Reference whitespace tokenizer.
///
/// - Splits on whitespace, vocab grows on first sight of a word
/// - `<s>` (0) and `</s>` (1) are pre-registered special tokens
/// - Deterministic; used by the mock engine and protocol tests
pub struct WhitespaceTokenizer {
    state: RwLock<VocabState>,
}

#[derive(Debug)]
struct VocabState {
    vocab: HashMap<u32, String>,
    reverse_vocab: HashMap<String, u32>,
    special: HashSet<u32>,
    next_id: u32,
}

impl VocabState {
    fn intern(&mut self, word: &str) -> u32 {
        if let Some(id) = self.reverse_vocab.get(word) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.reverse_vocab.insert(word.to_string(), id);
        self.vocab.insert(id, word.to_string());
        id
    }
}

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        let mut state = VocabState {
            vocab: HashMap::new(),
            reverse_vocab: HashMap::new(),
            special: HashSet::new(),
            next_id: 0,
        };
        for special in [BOS, EOS] {
            let id = state.intern(special);
            state.special.insert(id);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Whether `token` is one of the special markers.
    pub fn is_special(&self, token: u32) -> bool {
        self.state
            .read()
            .map(|s| s.special.contains(&token))
            .unwrap_or(false)
    }
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> TokenizerResult<Vec<u32>> {
        let mut state = self
            .state
            .write()
            .map_err(|_| TokenizerError::EncodingError("tokenizer lock poisoned".to_string()))?;

        let mut ids = Vec::new();
        if add_special_tokens {
            ids.push(BOS_ID);
        }
        ids.extend(text.split_whitespace().map(|word| state.intern(word)));
        Ok(ids)
    }

    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> TokenizerResult<String> {
        let state = self
            .state
            .read()
            .map_err(|_| TokenizerError::DecodingError("tokenizer lock poisoned".to_string()))?;

        let mut words = Vec::with_capacity(tokens.len());
        for &id in tokens {
            if skip_special_tokens && state.special.contains(&id) {
                continue;
            }
            let word = state.vocab.get(&id).ok_or(TokenizerError::InvalidToken(id))?;
            words.push(word.as_str());
        }
        Ok(words.join(" "))
    }

    fn vocab_size(&self) -> usize {
        self.state.read().map(|s| s.vocab.len()).unwrap_or(0)
    }
}
