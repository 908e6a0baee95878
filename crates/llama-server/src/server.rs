//! The request loop.
//!
//! [`Dispatcher`] turns one raw request into an outcome and owns the server
//! state. [`CommandServer`] pairs it with a [`Transport`] and runs until
//! `exit` or a transport failure.

use std::sync::Arc;

use llama_engine::ModelLoader;

use crate::error::{CommandError, ServerError};
use crate::handlers;
use crate::protocol::{Command, Reply, Request};
use crate::state::{ServerConfig, ServerState};
use crate::transport::Transport;

/// What the loop does after a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Reply(Reply),
    /// Send nothing and wait for the next request.
    Silent,
    /// Stop serving without a reply.
    Exit,
}

/// Maps requests onto handlers.
pub struct Dispatcher {
    loader: Arc<dyn ModelLoader>,
    state: ServerState,
}

impl Dispatcher {
    pub fn new(loader: Arc<dyn ModelLoader>, config: ServerConfig) -> Self {
        Self {
            loader,
            state: ServerState::new(config),
        }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn into_state(self) -> ServerState {
        self.state
    }

    /// Handle one received message. Requests are a single frame.
    pub fn dispatch_frames(&mut self, frames: &[Vec<u8>]) -> Outcome {
        match frames {
            [] => Outcome::Silent,
            [raw] => self.dispatch(raw),
            _ => {
                tracing::warn!(frames = frames.len(), "multipart request rejected");
                Outcome::Reply(
                    CommandError::Malformed("expected a single-frame request".to_string()).into(),
                )
            }
        }
    }

    /// Handle one raw request frame.
    pub fn dispatch(&mut self, raw: &[u8]) -> Outcome {
        let Ok(text) = std::str::from_utf8(raw) else {
            tracing::warn!(len = raw.len(), "request is not valid UTF-8");
            return Outcome::Reply(
                CommandError::Malformed("request is not valid UTF-8".to_string()).into(),
            );
        };

        let request = match Request::parse(text) {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("empty request dropped");
                return Outcome::Silent;
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected request");
                return Outcome::Reply(err.into());
            }
        };
        tracing::debug!(command = %request.command, payload_len = request.payload.len(), "request");

        let result = match request.command {
            Command::Exit => return Outcome::Exit,
            Command::Load => handlers::handle_load(&mut self.state, self.loader.as_ref()),
            Command::Tokenize => handlers::handle_tokenize(&self.state, request.payload),
            Command::Generate => handlers::handle_generate(&mut self.state, request.payload),
            Command::Unknown(name) => Ok(Reply::unknown_command(&name)),
        };

        Outcome::Reply(result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "command failed");
            err.into()
        }))
    }
}

/// Serves one request at a time until `exit`.
pub struct CommandServer<T> {
    transport: T,
    dispatcher: Dispatcher,
}

impl<T: Transport> CommandServer<T> {
    pub fn new(transport: T, loader: Arc<dyn ModelLoader>, config: ServerConfig) -> Self {
        Self {
            transport,
            dispatcher: Dispatcher::new(loader, config),
        }
    }

    /// Run the loop. Returns the final state after `exit`.
    pub async fn run(mut self) -> Result<ServerState, ServerError> {
        loop {
            let frames = self.transport.recv().await?;
            match self.dispatcher.dispatch_frames(&frames) {
                Outcome::Reply(reply) => self.transport.send(reply.to_json()?).await?,
                Outcome::Silent => {}
                Outcome::Exit => {
                    tracing::info!("exit requested, shutting down");
                    return Ok(self.dispatcher.into_state());
                }
            }
        }
    }
}
