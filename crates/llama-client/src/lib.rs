//! # llama-client
//!
//! Talks to `llama-server` over a ZeroMQ REQ socket and keeps chat history
//! within the server's input limit.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;

pub use chat::{fit_context, Chat, LengthCheck, Message};
pub use client::ModelClient;
pub use config::{ChatConfig, ConfigFile};
pub use error::{ClientError, ConfigError, Result};
