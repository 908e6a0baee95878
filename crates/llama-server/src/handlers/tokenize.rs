//! TOKENIZE handler.

use crate::error::CommandError;
use crate::protocol::Reply;
use crate::state::ServerState;

/// Report whether `text` exceeds the effective input limit.
///
/// The count includes whatever special tokens the tokenizer adds.
pub fn handle_tokenize(state: &ServerState, text: &str) -> Result<Reply, CommandError> {
    let (model, limit) = state.model.loaded()?;
    let count = model.tokenize(text)?.len();
    tracing::debug!(count, limit, "tokenized");
    Ok(Reply::Tokenize {
        max_length_exceeded: count > limit,
    })
}
