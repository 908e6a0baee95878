//! Deterministic in-process engine.
//!
//! Wires the whitespace tokenizer and the sampler together behind the engine
//! traits so the command server can be exercised without model weights.
//! Logits are a hash of the running token sequence (not a real model), and
//! special tokens are masked, so every call samples exactly
//! `min(max_new_tokens, max_positions - prompt_len)` tokens.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use llama_sampling::Sampler;
use llama_tokenizer::{Tokenizer, WhitespaceTokenizer};

use crate::{
    Generation, GenerationParams, LanguageModel, LlamaError, ModelLoader, ModelSpec, Result,
    TokenId,
};

/// Loader for [`MockModel`]s.
#[derive(Debug, Clone)]
pub struct MockLoader {
    max_positions: usize,
    seed: u64,
    loads: Arc<AtomicUsize>,
}

impl MockLoader {
    /// A loader whose models report `max_positions` as their native limit.
    pub fn new(max_positions: usize) -> Self {
        Self {
            max_positions,
            seed: 42,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of successful `load` calls so far (shared across clones).
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for MockLoader {
    fn load(&self, spec: &ModelSpec) -> Result<Box<dyn LanguageModel>> {
        if spec.path.as_os_str().is_empty() {
            return Err(LlamaError::ModelLoad("empty model path".to_string()));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockModel {
            tokenizer: WhitespaceTokenizer::new(),
            sampler: Sampler::new().with_seed(self.seed),
            max_positions: self.max_positions,
        }))
    }
}

/// A model that "generates" by sampling words it has already seen.
pub struct MockModel {
    tokenizer: WhitespaceTokenizer,
    sampler: Sampler,
    max_positions: usize,
}

impl MockModel {
    fn mock_logits(&self, context: &[TokenId]) -> Vec<f32> {
        let vocab_size = self.tokenizer.vocab_size();
        (0..vocab_size)
            .map(|i| {
                if self.tokenizer.is_special(i as TokenId) {
                    return f32::NEG_INFINITY;
                }
                context
                    .iter()
                    .map(|&tid| ((tid as f32 + 1.0) * (i as f32 + 1.0)).sin())
                    .sum()
            })
            .collect()
    }
}

impl LanguageModel for MockModel {
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| LlamaError::Tokenization(e.to_string()))
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(|e| LlamaError::Tokenization(e.to_string()))
    }

    fn generate(&mut self, prompt: &[TokenId], params: &GenerationParams) -> Result<Generation> {
        self.sampler.temperature = params.temperature;
        let mut tokens = prompt.to_vec();

        // Nothing but specials in the vocab: there is no word to sample.
        let has_words = (0..self.tokenizer.vocab_size())
            .any(|id| !self.tokenizer.is_special(id as TokenId));

        if has_words {
            for _ in 0..params.max_new_tokens {
                if tokens.len() >= self.max_positions {
                    break;
                }
                let logits = self.mock_logits(&tokens);
                let next = self
                    .sampler
                    .sample(&logits)
                    .map_err(|e| LlamaError::Inference(e.to_string()))?;
                tokens.push(next as TokenId);
            }
        }

        Ok(Generation {
            tokens,
            prompt_len: prompt.len(),
        })
    }

    fn max_position_embeddings(&self) -> usize {
        self.max_positions
    }
}
