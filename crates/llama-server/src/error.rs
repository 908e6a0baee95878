//! Error handling and reply mapping.
//!
//! Two layers: [`CommandError`] is a failed command and becomes an `error`
//! reply, the loop keeps serving. [`ServerError`] ends the loop.

use llama_engine::LlamaError;

use crate::protocol::Reply;

/// A command that could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Llama(#[from] LlamaError),

    #[error("Model not loaded: send LOAD first")]
    NotLoaded,

    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error {
            message: err.to_string(),
        }
    }
}

/// Fatal server failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("transport error: {0}")]
    Transport(#[from] zeromq::ZmqError),

    #[error("transport closed")]
    Closed,

    #[error("failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_loaded_reply() {
        let reply: Reply = CommandError::NotLoaded.into();
        assert_eq!(
            reply,
            Reply::Error {
                message: "Model not loaded: send LOAD first".into()
            }
        );
    }

    #[test]
    fn llama_errors_keep_their_message() {
        let err = CommandError::from(LlamaError::ModelLoad("missing config.json".into()));
        let reply: Reply = err.into();
        assert_eq!(
            reply,
            Reply::Error {
                message: "Model loading failed: missing config.json".into()
            }
        );
    }
}
