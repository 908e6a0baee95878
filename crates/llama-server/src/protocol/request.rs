use std::fmt;

use crate::error::CommandError;

/// Command verb of a request. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Load,
    Tokenize,
    Generate,
    Unknown(String),
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        match name {
            "exit" => Command::Exit,
            "LOAD" => Command::Load,
            "TOKENIZE" => Command::Tokenize,
            "GENERATE" => Command::Generate,
            other => Command::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Exit => write!(f, "exit"),
            Command::Load => write!(f, "LOAD"),
            Command::Tokenize => write!(f, "TOKENIZE"),
            Command::Generate => write!(f, "GENERATE"),
            Command::Unknown(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed request. The payload borrows from the received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub command: Command,
    pub payload: &'a str,
}

impl<'a> Request<'a> {
    /// Split on the first comma. Empty input parses to `None` (it gets no reply).
    pub fn parse(raw: &'a str) -> Result<Option<Self>, CommandError> {
        if raw.is_empty() {
            return Ok(None);
        }
        let (name, payload) = raw
            .split_once(',')
            .ok_or_else(|| CommandError::Malformed("expected <COMMAND>,<payload>".to_string()))?;
        Ok(Some(Self {
            command: Command::from(name),
            payload,
        }))
    }
}
