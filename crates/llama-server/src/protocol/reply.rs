use serde::{Deserialize, Serialize};

/// A reply record, serialized as `{"type": ..., <field>: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Reply {
    Status {
        message: String,
    },
    Tokenize {
        #[serde(rename = "maxLengthExceeded")]
        max_length_exceeded: bool,
    },
    Generate {
        message: String,
    },
    Error {
        message: String,
    },
}

impl Reply {
    pub fn loaded() -> Self {
        Reply::Status {
            message: "loaded".to_string(),
        }
    }

    pub fn unknown_command(name: &str) -> Self {
        Reply::Error {
            message: format!("Unknown command: {name}"),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
