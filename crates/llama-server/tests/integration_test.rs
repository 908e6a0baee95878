//! End-to-end tests for the command server loop.
//!
//! Validates:
//! - Request ordering over an in-memory transport with the mock loader
//! - Empty requests get no reply and the server stays available
//! - Multipart requests are rejected rather than joined
//! - `exit` stops the loop without a reply
//! - Handler failures are replied as `error` records
//! - The same protocol over a real ZeroMQ REQ/REP pair

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llama_engine::MockLoader;
use llama_server::{CommandServer, ServerConfig, ServerError, ServerState, Transport, ZmqTransport};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

const TIMEOUT: Duration = Duration::from_secs(5);

// ===========================================================================
// In-memory transport
// ===========================================================================

struct ChannelTransport {
    requests: mpsc::UnboundedReceiver<Vec<Vec<u8>>>,
    replies: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn recv(&mut self) -> Result<Vec<Vec<u8>>, ServerError> {
        self.requests.recv().await.ok_or(ServerError::Closed)
    }

    async fn send(&mut self, reply: String) -> Result<(), ServerError> {
        self.replies.send(reply).map_err(|_| ServerError::Closed)
    }
}

struct Harness {
    requests: mpsc::UnboundedSender<Vec<Vec<u8>>>,
    replies: mpsc::UnboundedReceiver<String>,
    server: JoinHandle<Result<ServerState, ServerError>>,
}

impl Harness {
    fn start(loader: MockLoader, config: ServerConfig) -> Self {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (rep_tx, rep_rx) = mpsc::unbounded_channel();
        let transport = ChannelTransport {
            requests: req_rx,
            replies: rep_tx,
        };
        let server = tokio::spawn(CommandServer::new(transport, Arc::new(loader), config).run());
        Self {
            requests: req_tx,
            replies: rep_rx,
            server,
        }
    }

    fn send(&self, request: &str) {
        self.send_frames(&[request]);
    }

    fn send_frames(&self, frames: &[&str]) {
        let frames = frames.iter().map(|f| f.as_bytes().to_vec()).collect();
        self.requests.send(frames).unwrap();
    }

    async fn reply(&mut self) -> Value {
        let raw = tokio::time::timeout(TIMEOUT, self.replies.recv())
            .await
            .expect("reply timed out")
            .expect("server closed");
        serde_json::from_str(&raw).unwrap()
    }

    async fn call(&mut self, request: &str) -> Value {
        self.send(request);
        self.reply().await
    }
}

fn config(max_input_tokens: usize, max_new_tokens: usize) -> ServerConfig {
    ServerConfig {
        model_path: "/models/mock".into(),
        port: 0,
        max_input_tokens,
        max_new_tokens,
        temperature: 0.7,
    }
}

// ===========================================================================
// Protocol over the in-memory transport
// ===========================================================================

#[tokio::test]
async fn load_tokenize_generate_session() {
    let mut h = Harness::start(MockLoader::new(2048), config(6, 3));

    assert_eq!(
        h.call("LOAD,").await,
        json!({"type": "status", "message": "loaded"})
    );
    // BOS + 5 words = 6 tokens: at the limit, not over it.
    assert_eq!(
        h.call("TOKENIZE,one two three four five").await,
        json!({"type": "tokenize", "maxLengthExceeded": false})
    );
    assert_eq!(
        h.call("TOKENIZE,one two three four five six").await,
        json!({"type": "tokenize", "maxLengthExceeded": true})
    );

    let reply = h.call("GENERATE,one two").await;
    assert_eq!(reply["type"], "generate");
    let message = reply["message"].as_str().unwrap();
    assert!(message.starts_with("one two"), "{message}");
    assert_eq!(message.split_whitespace().count(), 2 + 3);
}

#[tokio::test]
async fn native_limit_caps_the_budget() {
    let mut h = Harness::start(MockLoader::new(3), config(1024, 1));
    h.call("LOAD,").await;
    assert_eq!(
        h.call("TOKENIZE,a b c").await,
        json!({"type": "tokenize", "maxLengthExceeded": true})
    );

    let state = {
        h.send("exit,");
        h.server.await.unwrap().unwrap()
    };
    assert_eq!(state.model.effective_max_input_length(), Some(3));
}

#[tokio::test]
async fn unknown_command_names_the_command() {
    let mut h = Harness::start(MockLoader::new(64), config(8, 1));
    assert_eq!(
        h.call("PING,payload, with commas").await,
        json!({"type": "error", "message": "Unknown command: PING"})
    );
    assert_eq!(
        h.call("load,").await,
        json!({"type": "error", "message": "Unknown command: load"})
    );
}

#[tokio::test]
async fn empty_request_gets_no_reply() {
    let mut h = Harness::start(MockLoader::new(64), config(8, 1));
    h.send("");
    // The next reply belongs to the next request.
    assert_eq!(
        h.call("NOPE,").await,
        json!({"type": "error", "message": "Unknown command: NOPE"})
    );
    assert!(h.replies.try_recv().is_err());
}

#[tokio::test]
async fn malformed_request_is_replied() {
    let mut h = Harness::start(MockLoader::new(64), config(8, 1));
    assert_eq!(
        h.call("LOAD").await,
        json!({
            "type": "error",
            "message": "Malformed request: expected <COMMAND>,<payload>"
        })
    );
}

#[tokio::test]
async fn multipart_request_is_rejected_not_joined() {
    let loader = MockLoader::new(64);
    let mut h = Harness::start(loader.clone(), config(8, 1));
    h.send_frames(&["LOAD", ",x"]);
    assert_eq!(
        h.reply().await,
        json!({
            "type": "error",
            "message": "Malformed request: expected a single-frame request"
        })
    );
    assert_eq!(loader.load_count(), 0);
    assert_eq!(h.call("LOAD,").await["type"], "status");
}

#[tokio::test]
async fn commands_before_load_are_errors() {
    let loader = MockLoader::new(64);
    let mut h = Harness::start(loader.clone(), config(8, 1));

    for request in ["TOKENIZE,hello", "GENERATE,hello"] {
        assert_eq!(
            h.call(request).await,
            json!({"type": "error", "message": "Model not loaded: send LOAD first"})
        );
    }
    assert_eq!(h.call("LOAD,").await["type"], "status");
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn load_failure_is_replied_and_server_continues() {
    let mut cfg = config(8, 1);
    cfg.model_path = "".into();
    let mut h = Harness::start(MockLoader::new(64), cfg);

    let reply = h.call("LOAD,").await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().starts_with("Model loading failed"));
    assert_eq!(h.call("X,").await["type"], "error");
}

#[tokio::test]
async fn repeated_load_is_idempotent() {
    let loader = MockLoader::new(512);
    let mut h = Harness::start(loader.clone(), config(100, 1));
    let first = h.call("LOAD,").await;
    let second = h.call("LOAD,").await;
    assert_eq!(first, second);
    assert_eq!(loader.load_count(), 2);

    h.send("exit,");
    let state = h.server.await.unwrap().unwrap();
    assert_eq!(state.model.effective_max_input_length(), Some(100));
}

#[tokio::test]
async fn exit_stops_without_reply() {
    let mut h = Harness::start(MockLoader::new(64), config(8, 1));
    h.send("exit,goodbye");
    let state = tokio::time::timeout(TIMEOUT, &mut h.server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(!state.model.is_loaded());
    // The transport was dropped with the server: no reply was ever sent.
    assert_eq!(h.replies.recv().await, None);
}

#[tokio::test]
async fn closed_transport_is_fatal() {
    let h = Harness::start(MockLoader::new(64), config(8, 1));
    drop(h.requests);
    let result = h.server.await.unwrap();
    assert!(matches!(result, Err(ServerError::Closed)));
}

// ===========================================================================
// Real ZeroMQ socket
// ===========================================================================

async fn zmq_call(socket: &mut ReqSocket, request: &str) -> Value {
    socket.send(ZmqMessage::from(request.to_string())).await.unwrap();
    let reply = tokio::time::timeout(TIMEOUT, socket.recv())
        .await
        .expect("reply timed out")
        .unwrap();
    serde_json::from_slice(reply.get(0).unwrap()).unwrap()
}

#[tokio::test]
async fn zmq_round_trip() {
    let transport = ZmqTransport::bind("127.0.0.1", 0).await.unwrap();
    let port = transport.port().unwrap();
    assert_ne!(port, 0);

    let server = tokio::spawn(
        CommandServer::new(transport, Arc::new(MockLoader::new(128)), config(16, 2)).run(),
    );

    let mut client = ReqSocket::new();
    client
        .connect(&format!("tcp://127.0.0.1:{port}"))
        .await
        .unwrap();

    assert_eq!(
        zmq_call(&mut client, "LOAD,").await,
        json!({"type": "status", "message": "loaded"})
    );
    assert_eq!(
        zmq_call(&mut client, "TOKENIZE,hello world").await,
        json!({"type": "tokenize", "maxLengthExceeded": false})
    );
    let generated = zmq_call(&mut client, "GENERATE,hello world").await;
    assert_eq!(generated["type"], "generate");
    assert!(!generated["message"].as_str().unwrap().is_empty());

    client
        .send(ZmqMessage::from("exit,".to_string()))
        .await
        .unwrap();
    let state = tokio::time::timeout(TIMEOUT, server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(state.model.is_loaded());
}
