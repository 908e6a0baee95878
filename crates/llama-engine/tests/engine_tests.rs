//! Integration tests for llama-engine core traits and types.
//!
//! Validates:
//! - The loader/model traits can be implemented by other backends
//! - Trait objects work for dynamic dispatch (the "narrow waist" pattern)
//! - The mock backend behaves like a loaded model: tokenize → generate → detokenize
//! - Error types display correctly and carry context

use llama_engine::*;

// ---------------------------------------------------------------------------
// A second backend, to show the traits are not tied to the mock
// ---------------------------------------------------------------------------

/// Echoes the prompt back with a fixed suffix token.
struct EchoLoader;

struct EchoModel;

impl ModelLoader for EchoLoader {
    fn load(&self, spec: &ModelSpec) -> Result<Box<dyn LanguageModel>> {
        if !spec.path.ends_with("echo") {
            return Err(LlamaError::ModelLoad(format!(
                "unknown model: {}",
                spec.path.display()
            )));
        }
        Ok(Box::new(EchoModel))
    }
}

impl LanguageModel for EchoModel {
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(text.bytes().map(TokenId::from).collect())
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String> {
        let bytes: Vec<u8> = tokens
            .iter()
            .map(|&t| u8::try_from(t).map_err(|_| LlamaError::Tokenization(format!("bad id {t}"))))
            .collect::<Result<_>>()?;
        String::from_utf8(bytes).map_err(|e| LlamaError::Tokenization(e.to_string()))
    }

    fn generate(&mut self, prompt: &[TokenId], params: &GenerationParams) -> Result<Generation> {
        let mut tokens = prompt.to_vec();
        tokens.extend(std::iter::repeat(TokenId::from(b'!')).take(params.max_new_tokens));
        Ok(Generation {
            tokens,
            prompt_len: prompt.len(),
        })
    }

    fn max_position_embeddings(&self) -> usize {
        2048
    }
}

fn params(max_new_tokens: usize) -> GenerationParams {
    GenerationParams {
        max_new_tokens,
        temperature: 0.7,
    }
}

// ---------------------------------------------------------------------------
// Dynamic dispatch
// ---------------------------------------------------------------------------

#[test]
fn loaders_are_interchangeable_trait_objects() {
    let loaders: Vec<(Box<dyn ModelLoader>, ModelSpec)> = vec![
        (Box::new(EchoLoader), ModelSpec::new("/models/echo")),
        (Box::new(MockLoader::new(128)), ModelSpec::new("/models/mock")),
    ];

    for (loader, spec) in &loaders {
        let mut model = loader.load(spec).unwrap();
        let prompt = model.tokenize("hi there").unwrap();
        let gen = model.generate(&prompt, &params(2)).unwrap();
        assert_eq!(gen.new_tokens().len(), 2);
        let text = model.detokenize(&gen.tokens).unwrap();
        assert!(text.starts_with("hi there"));
    }
}

#[test]
fn echo_loader_rejects_other_models() {
    let err = EchoLoader.load(&ModelSpec::new("/models/other")).err().unwrap();
    assert!(err.to_string().contains("/models/other"));
}

#[test]
fn model_is_send() {
    fn assert_send<T: Send + ?Sized>() {}
    assert_send::<dyn LanguageModel>();
    assert_send::<Box<dyn LanguageModel>>();
}

#[test]
fn loader_is_send_sync() {
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}
    assert_send_sync::<dyn ModelLoader>();
    assert_send_sync::<MockLoader>();
}

// ---------------------------------------------------------------------------
// Mock pipeline
// ---------------------------------------------------------------------------

#[test]
fn mock_load_count_is_shared_between_clones() {
    let loader = MockLoader::new(64);
    let clone = loader.clone();
    clone.load(&ModelSpec::new("a")).unwrap();
    loader.load(&ModelSpec::new("b")).unwrap();
    assert_eq!(loader.load_count(), 2);
}

#[test]
fn mock_same_seed_same_output() {
    let run = || {
        let mut model = MockLoader::new(64)
            .with_seed(7)
            .load(&ModelSpec::new("m"))
            .unwrap();
        let prompt = model.tokenize("alpha beta gamma").unwrap();
        let gen = model.generate(&prompt, &params(6)).unwrap();
        model.detokenize(&gen.tokens).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn mock_reports_native_position_limit() {
    let model = MockLoader::new(512).load(&ModelSpec::new("m")).unwrap();
    assert_eq!(model.max_position_embeddings(), 512);
}

#[test]
fn mock_token_count_includes_bos() {
    let model = MockLoader::new(64).load(&ModelSpec::new("m")).unwrap();
    assert_eq!(model.tokenize("one two").unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn error_variants_display() {
    assert_eq!(
        LlamaError::Tokenization("x".into()).to_string(),
        "Tokenization failed: x"
    );
    assert_eq!(
        LlamaError::Inference("oom".into()).to_string(),
        "Inference failed: oom"
    );
}
