//! REQ-socket client for the command server.

use std::time::Duration;

use llama_server::Reply;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::error::{ClientError, Result};

/// A connected client. Requests are strictly sequential.
pub struct ModelClient {
    socket: ReqSocket,
    endpoint: String,
}

impl ModelClient {
    /// Connect to e.g. `tcp://localhost:5000`.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let mut socket = ReqSocket::new();
        socket.connect(endpoint).await?;
        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
        })
    }

    /// Connect, waiting up to `timeout` for the server to come up.
    pub async fn connect_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        tokio::time::timeout(timeout, Self::connect(endpoint))
            .await
            .map_err(|_| ClientError::ConnectTimeout {
                endpoint: endpoint.to_string(),
                timeout,
            })?
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and decode its reply. `error` replies become
    /// [`ClientError::Remote`].
    pub async fn call(&mut self, command: &str, payload: &str) -> Result<Reply> {
        self.socket
            .send(ZmqMessage::from(format!("{command},{payload}")))
            .await?;
        let message = self.socket.recv().await?;
        let frame = message.get(0).ok_or(ClientError::EmptyReply)?;
        let reply: Reply = serde_json::from_slice(frame)?;
        match reply {
            Reply::Error { message } => Err(ClientError::Remote(message)),
            reply => Ok(reply),
        }
    }

    /// LOAD the server's configured model. May take minutes.
    pub async fn load(&mut self) -> Result<()> {
        match self.call("LOAD", "").await? {
            Reply::Status { message } if message == "loaded" => Ok(()),
            other => Err(unexpected("status", other)),
        }
    }

    /// Whether `text` exceeds the server's effective input limit.
    pub async fn tokenize(&mut self, text: &str) -> Result<bool> {
        match self.call("TOKENIZE", text).await? {
            Reply::Tokenize {
                max_length_exceeded,
            } => Ok(max_length_exceeded),
            other => Err(unexpected("tokenize", other)),
        }
    }

    /// Prompt plus continuation, as decoded by the server.
    pub async fn generate(&mut self, prompt: &str) -> Result<String> {
        match self.call("GENERATE", prompt).await? {
            Reply::Generate { message } => Ok(message),
            other => Err(unexpected("generate", other)),
        }
    }

    /// Stop the server. No reply is expected, so the socket is consumed.
    pub async fn exit(mut self) -> Result<()> {
        self.socket.send(ZmqMessage::from("exit,".to_string())).await?;
        Ok(())
    }
}

fn unexpected(expected: &'static str, got: Reply) -> ClientError {
    ClientError::UnexpectedReply {
        expected,
        got: got.to_json().unwrap_or_else(|_| format!("{got:?}")),
    }
}

