//! LOAD handler.

use std::time::Instant;

use llama_engine::ModelLoader;

use crate::error::CommandError;
use crate::protocol::Reply;
use crate::state::{ModelState, ServerState};

/// Load the configured model and fix the effective input limit.
///
/// A repeated LOAD replaces the resident model. On failure the previous state
/// is kept.
pub fn handle_load(
    state: &mut ServerState,
    loader: &dyn ModelLoader,
) -> Result<Reply, CommandError> {
    let started = Instant::now();
    let model = loader.load(&state.config.model_spec())?;

    let native = model.max_position_embeddings();
    let effective = state.config.max_input_tokens.min(native);
    state.model = ModelState::Loaded {
        model,
        effective_max_input_length: effective,
    };

    tracing::info!(
        path = %state.config.model_path.display(),
        configured = state.config.max_input_tokens,
        native,
        effective,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "model ready"
    );
    Ok(Reply::loaded())
}
