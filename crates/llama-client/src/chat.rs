//! Chat history and context fitting.
//!
//! A prompt is the initializer line, then as many of the most recent messages
//! as fit, then the reply author's tag as the cue for the model. Each line is
//! `author + content`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::ModelClient;
use crate::error::Result;

/// Author tag of the initializer line.
pub const INITIALIZER_AUTHOR: &str = "Initial Prompt: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Tag including its separator, e.g. `"User: "`.
    pub author: String,
    pub content: String,
}

impl Message {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }

    fn line(&self) -> String {
        format!("{}{}", self.author, self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub initializer: Message,
    pub messages: Vec<Message>,
}

impl Chat {
    pub fn new(initializer: impl Into<String>) -> Self {
        Self {
            initializer: Message::new(INITIALIZER_AUTHOR, initializer),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, author: impl Into<String>, content: impl Into<String>) {
        self.messages.push(Message::new(author, content));
    }

    /// Prompt built from `messages[start..]`, ending with `cue`.
    pub fn render(&self, start: usize, cue: &str) -> String {
        let mut lines = vec![self.initializer.line()];
        lines.extend(self.messages[start.min(self.messages.len())..].iter().map(Message::line));
        lines.push(cue.to_string());
        lines.join("\n")
    }
}

/// Asks whether a prompt is over the model's input limit.
#[async_trait]
pub trait LengthCheck: Send {
    async fn exceeds_limit(&mut self, prompt: &str) -> Result<bool>;
}

#[async_trait]
impl LengthCheck for ModelClient {
    async fn exceeds_limit(&mut self, prompt: &str) -> Result<bool> {
        self.tokenize(prompt).await
    }
}

/// The longest prompt whose messages are a suffix of the history.
///
/// Messages are added newest to oldest until the next one would overflow.
/// `None` when the history is empty or the newest message alone is too long.
pub async fn fit_context<C: LengthCheck + ?Sized>(
    chat: &Chat,
    cue: &str,
    checker: &mut C,
) -> Result<Option<String>> {
    let mut fitted = None;
    for start in (0..chat.messages.len()).rev() {
        let prompt = chat.render(start, cue);
        if checker.exceeds_limit(&prompt).await? {
            break;
        }
        fitted = Some(prompt);
    }
    tracing::debug!(
        messages = chat.messages.len(),
        fits = fitted.is_some(),
        "context fitted"
    );
    Ok(fitted)
}
