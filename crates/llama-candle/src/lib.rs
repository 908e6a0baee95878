//! # llama-candle
//!
//! Llama-family causal language models on [candle], behind the
//! `llama-engine` traits.
//!
//! Loading reads a local HuggingFace checkpoint directory (see [`ModelFiles`]),
//! places the weights on the best available device at that device's
//! precision (half precision on accelerators, f32 on CPU) and keeps the
//! tokenizer next to the model. Generation is plain autoregressive sampling
//! with a fresh KV cache per call.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use llama_engine::{
    Generation, GenerationParams, LanguageModel, LlamaError, ModelLoader, ModelSpec, Result,
    TokenId,
};
use llama_runtime::{Backend, BackendSelector, InferenceTimer, Precision, TracingTelemetry};
use llama_sampling::Sampler;
use llama_tokenizer::{HfTokenizer, Tokenizer};

mod files;

pub use files::ModelFiles;

/// End-of-sequence spellings tried when config.json carries no `eos_token_id`.
const EOS_FALLBACKS: &[&str] = &["</s>", "<|end_of_text|>", "<|eot_id|>", "<|endoftext|>"];

/// Loader options that are not part of the wire protocol.
#[derive(Debug, Clone, Default)]
pub struct CandleOptions {
    /// Fixed sampler seed; entropy-seeded when `None`.
    pub seed: Option<u64>,
    pub top_k: Option<usize>,
    pub top_p: Option<f32>,
    /// Skip accelerator probing.
    pub force_cpu: bool,
}

/// Loads checkpoints with candle.
#[derive(Debug, Clone, Default)]
pub struct CandleLoader {
    options: CandleOptions,
}

impl CandleLoader {
    pub fn new(options: CandleOptions) -> Self {
        Self { options }
    }

    fn sampler(&self) -> Sampler {
        let mut sampler = match self.options.seed {
            Some(seed) => Sampler::new().with_seed(seed),
            None => Sampler::from_entropy(),
        };
        if let Some(k) = self.options.top_k {
            sampler = sampler.with_top_k(k);
        }
        if let Some(p) = self.options.top_p {
            sampler = sampler.with_top_p(p);
        }
        sampler
    }
}

fn load_err(context: &str) -> impl Fn(candle_core::Error) -> LlamaError + '_ {
    move |e| LlamaError::ModelLoad(format!("{context}: {e}"))
}

fn inference_err(e: candle_core::Error) -> LlamaError {
    LlamaError::Inference(e.to_string())
}

fn open_device(backend: Backend) -> std::result::Result<Device, String> {
    match backend {
        Backend::Cpu => Ok(Device::Cpu),
        #[cfg(feature = "cuda")]
        Backend::Cuda => Device::new_cuda(0).map_err(|e| e.to_string()),
        #[cfg(feature = "metal")]
        Backend::Metal => Device::new_metal(0).map_err(|e| e.to_string()),
    }
}

fn dtype_for(precision: Precision) -> DType {
    match precision {
        Precision::F32 => DType::F32,
        Precision::F16 => DType::F16,
    }
}

fn eos_tokens(config: &Config, tokenizer: &HfTokenizer) -> Vec<TokenId> {
    match &config.eos_token_id {
        Some(LlamaEosToks::Single(id)) => vec![*id],
        Some(LlamaEosToks::Multiple(ids)) => ids.clone(),
        None => EOS_FALLBACKS
            .iter()
            .filter_map(|t| tokenizer.token_to_id(t))
            .collect(),
    }
}

impl ModelLoader for CandleLoader {
    fn load(&self, spec: &ModelSpec) -> Result<Box<dyn LanguageModel>> {
        let files = ModelFiles::discover(&spec.path)?;

        let raw = std::fs::read(&files.config)
            .map_err(|e| LlamaError::ModelLoad(format!("{}: {e}", files.config.display())))?;
        let llama_config: LlamaConfig = serde_json::from_slice(&raw)
            .map_err(|e| LlamaError::ModelLoad(format!("{}: {e}", files.config.display())))?;
        let config = llama_config.into_config(false);

        let tokenizer = HfTokenizer::from_file(&files.tokenizer)
            .map_err(|e| LlamaError::ModelLoad(e.to_string()))?;

        let selector = if self.options.force_cpu {
            BackendSelector::cpu_only()
        } else {
            BackendSelector::auto()
        };
        let (backend, device) = selector
            .select(open_device)
            .map_err(|e| LlamaError::ModelLoad(e.to_string()))?;
        let dtype = dtype_for(backend.precision());

        // SAFETY: the mmapped files are not modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files.weights, dtype, &device) }
            .map_err(load_err("mapping weights"))?;
        let model = Llama::load(vb, &config).map_err(load_err("building model"))?;

        let eos = eos_tokens(&config, &tokenizer);
        tracing::info!(
            path = %spec.path.display(),
            %backend,
            ?dtype,
            shards = files.weights.len(),
            layers = config.num_hidden_layers,
            max_position_embeddings = config.max_position_embeddings,
            "model loaded"
        );

        Ok(Box::new(CandleModel {
            model,
            config,
            tokenizer,
            device,
            backend,
            dtype,
            eos,
            sampler: self.sampler(),
        }))
    }
}

/// A loaded candle Llama model.
pub struct CandleModel {
    model: Llama,
    config: Config,
    tokenizer: HfTokenizer,
    device: Device,
    backend: Backend,
    dtype: DType,
    eos: Vec<TokenId>,
    sampler: Sampler,
}

fn next_logits(
    model: &Llama,
    device: &Device,
    context: &[TokenId],
    index_pos: usize,
    cache: &mut Cache,
) -> Result<Vec<f32>> {
    let input = Tensor::new(context, device)
        .and_then(|t| t.unsqueeze(0))
        .map_err(inference_err)?;
    model
        .forward(&input, index_pos, cache)
        .and_then(|logits| logits.squeeze(0))
        .and_then(|logits| logits.to_dtype(DType::F32))
        .and_then(|logits| logits.to_vec1::<f32>())
        .map_err(inference_err)
}

/// Autoregressive sampling over `next_logits(context, index_pos)`.
///
/// The first call sees the whole prompt at position 0; every later call sees
/// only the newest token at its position. Stops after `max_new_tokens`, after
/// sampling an EOS id (which is kept), or when the sequence reaches
/// `max_positions`.
fn decode_loop<F>(
    prompt: &[TokenId],
    params: &GenerationParams,
    max_positions: usize,
    eos: &[TokenId],
    sampler: &mut Sampler,
    mut timer: InferenceTimer,
    mut next_logits: F,
) -> Result<Vec<TokenId>>
where
    F: FnMut(&[TokenId], usize) -> Result<Vec<f32>>,
{
    if prompt.is_empty() {
        return Err(LlamaError::Inference("empty prompt".to_string()));
    }
    sampler.temperature = params.temperature;

    let mut tokens = prompt.to_vec();
    let mut index_pos = 0;
    for step in 0..params.max_new_tokens {
        if tokens.len() >= max_positions {
            break;
        }
        let start = if step == 0 { 0 } else { tokens.len() - 1 };
        let logits = next_logits(&tokens[start..], index_pos)?;
        index_pos = tokens.len();
        if step == 0 {
            timer.mark_prefill_complete();
        }

        let next = sampler
            .sample(&logits)
            .map_err(|e| LlamaError::Inference(e.to_string()))? as TokenId;
        tokens.push(next);
        timer.mark_token();

        if eos.contains(&next) {
            break;
        }
    }

    timer.finish();
    Ok(tokens)
}

impl LanguageModel for CandleModel {
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
        let mut cache =
            Cache::new(true, self.dtype, &self.config, &self.device).map_err(inference_err)?;
        let timer = InferenceTimer::new(self.backend, prompt.len(), Box::new(TracingTelemetry));

        let Self {
            model,
            config,
            device,
            eos,
            sampler,
            ..
        } = self;
        let tokens = decode_loop(
            prompt,
            params,
            config.max_position_embeddings,
            eos,
            sampler,
            timer,
            |context, index_pos| next_logits(model, device, context, index_pos, &mut cache),
        )?;
        Ok(Generation {
            tokens,
            prompt_len: prompt.len(),
        })
    }

    fn max_position_embeddings(&self) -> usize {
        self.config.max_position_embeddings
    }
}
