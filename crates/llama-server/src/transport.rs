//! Request/reply channel the server loop runs on.

use async_trait::async_trait;
use zeromq::{Endpoint, RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::error::ServerError;

/// A strict request/reply channel: every `recv` is followed by at most one
/// `send` before the next `recv`.
#[async_trait]
pub trait Transport: Send {
    /// Wait for the next request, one entry per message frame.
    async fn recv(&mut self) -> Result<Vec<Vec<u8>>, ServerError>;

    /// Reply to the request returned by the last `recv`.
    async fn send(&mut self, reply: String) -> Result<(), ServerError>;
}

/// ZeroMQ REP socket.
pub struct ZmqTransport {
    socket: RepSocket,
    endpoint: Endpoint,
}

impl ZmqTransport {
    /// Bind `tcp://<host>:<port>`.
    pub async fn bind(host: &str, port: u16) -> Result<Self, ServerError> {
        let mut socket = RepSocket::new();
        let endpoint = socket.bind(&format!("tcp://{host}:{port}")).await?;
        Ok(Self { socket, endpoint })
    }

    /// The bound endpoint, with any ephemeral port resolved.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn port(&self) -> Option<u16> {
        match &self.endpoint {
            Endpoint::Tcp(_, port) => Some(*port),
            _ => None,
        }
    }
}

#[async_trait]
impl Transport for ZmqTransport {
    async fn recv(&mut self) -> Result<Vec<Vec<u8>>, ServerError> {
        let message = self.socket.recv().await?;
        Ok(message
            .into_vec()
            .into_iter()
            .map(|frame| frame.to_vec())
            .collect())
    }

    async fn send(&mut self, reply: String) -> Result<(), ServerError> {
        self.socket.send(ZmqMessage::from(reply)).await?;
        Ok(())
    }
}
