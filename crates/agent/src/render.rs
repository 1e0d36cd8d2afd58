use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub role: Role,
    pub text: String,
}

/// The only observable outputs of a chat turn.
pub trait ChatRenderer: Send {
    fn append(&mut self, role: Role, text: &str);
    fn show_typing(&mut self);
    fn hide_typing(&mut self);
}

/// Buffers a turn's output, for HTTP responses and tests.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<RenderedMessage>,
    typing: bool,
    typing_shown: u32,
}

impl Transcript {
    pub fn messages(&self) -> &[RenderedMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<RenderedMessage> {
        self.messages
    }

    pub fn assistant_texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .map(|message| message.text.as_str())
            .collect()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn typing_shown(&self) -> u32 {
        self.typing_shown
    }
}

impl ChatRenderer for Transcript {
    fn append(&mut self, role: Role, text: &str) {
        self.messages.push(RenderedMessage { role, text: text.to_string() });
    }

    fn show_typing(&mut self) {
        self.typing = true;
        self.typing_shown += 1;
    }

    fn hide_typing(&mut self) {
        self.typing = false;
    }
}
