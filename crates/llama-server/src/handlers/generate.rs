//! GENERATE handler.

use crate::error::CommandError;
use crate::protocol::Reply;
use crate::state::ServerState;

/// Sample a continuation and reply with the decoded sequence.
///
/// The reply text is the prompt followed by the continuation, decoded
/// together with special tokens stripped.
pub fn handle_generate(state: &mut ServerState, prompt: &str) -> Result<Reply, CommandError> {
    let params = state.config.generation_params();
    let model = state.model.loaded_mut()?;

    let prompt_tokens = model.tokenize(prompt)?;
    let generation = model.generate(&prompt_tokens, &params)?;
    let message = model.detokenize(&generation.tokens)?;

    tracing::debug!(
        prompt_tokens = generation.prompt_len,
        new_tokens = generation.new_tokens().len(),
        "generated"
    );
    Ok(Reply::Generate { message })
}
