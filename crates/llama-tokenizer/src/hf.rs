//! HuggingFace `tokenizer.json` backend.

use std::path::Path;

use crate::{Tokenizer, TokenizerError, TokenizerResult};

/// Wraps a `tokenizers::Tokenizer` loaded from a model directory.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HfTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: &Path) -> TokenizerResult<Self> {
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TokenizerError::Load(format!("{}: {e}", path.display())))?;
        Ok(Self { inner })
    }

    /// Look up the ID of a token string (e.g. `</s>`).
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> TokenizerResult<Vec<u32>> {
        self.inner
            .encode(text, add_special_tokens)
            .map(|encoding| encoding.get_ids().to_vec())
            .map_err(|e| TokenizerError::EncodingError(e.to_string()))
    }

    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> TokenizerResult<String> {
        self.inner
            .decode(tokens, skip_special_tokens)
            .map_err(|e| TokenizerError::DecodingError(e.to_string()))
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}
