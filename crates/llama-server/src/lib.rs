//! # llama-server
//!
//! A ZeroMQ request/reply server exposing one causal language model.
//!
//! Clients send `<COMMAND>,<payload>` text frames:
//!
//! | request | reply |
//! |---|---|
//! | `LOAD,` | `{"type":"status","message":"loaded"}` |
//! | `TOKENIZE,<text>` | `{"type":"tokenize","maxLengthExceeded":<bool>}` |
//! | `GENERATE,<prompt>` | `{"type":"generate","message":<text>}` |
//! | `exit,` | none; the server stops |
//! | anything else | `{"type":"error","message":"Unknown command: <name>"}` |
//!
//! Failed commands are replied with an `error` record and the server keeps
//! running. An empty request gets no reply at all.

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod state;
pub mod transport;

pub use error::{CommandError, ServerError};
pub use protocol::{Command, Reply, Request};
pub use server::{CommandServer, Dispatcher, Outcome};
pub use state::{ModelState, ServerConfig, ServerState};
pub use transport::{Transport, ZmqTransport};
