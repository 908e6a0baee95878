//! # llama-cli
//!
//! Console chat on top of [`llama_client`]: keeps the conversation, fits it to
//! the server's input limit and strips the echoed prompt from replies.

use llama_client::{fit_context, Chat, ChatConfig, ModelClient, Result};

/// Outcome of one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Reply(String),
    /// The message does not fit even without history; it was discarded.
    TooLong,
}

/// A running conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    chat: Chat,
    user_name: String,
    model_name: String,
}

impl ChatSession {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            chat: Chat::new(config.initializer.clone()),
            user_name: config.user_name.clone(),
            model_name: config.model_name.clone(),
        }
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Add the user's message, generate, and record the model's answer.
    pub async fn turn(&mut self, client: &mut ModelClient, input: &str) -> Result<Turn> {
        self.chat.push(self.user_name.clone(), input);

        let Some(prompt) = fit_context(&self.chat, &self.model_name, client).await? else {
            self.chat.messages.pop();
            return Ok(Turn::TooLong);
        };

        let generated = client.generate(&prompt).await?;
        let answer = continuation(&prompt, &generated).to_string();
        self.chat.push(self.model_name.clone(), answer.clone());
        Ok(Turn::Reply(answer))
    }
}

/// The server echoes the prompt before the continuation; drop it when the
/// decoded prompt matches what was sent.
pub fn continuation<'a>(prompt: &str, generated: &'a str) -> &'a str {
    generated.strip_prefix(prompt).unwrap_or(generated).trim()
}
