//! Assistant chat transcript.

use super::{ensure_len, pick, ShapeError, Translatable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub text: String,
}

/// Messages in display order. Ids are unique and increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        debug_assert!(
            self.messages.last().map_or(true, |last| last.id < message.id),
            "chat ids must increase"
        );
        self.messages.push(message);
    }

    /// True while the transcript holds nothing but the assistant's opening line.
    pub fn is_greeting_only(&self) -> bool {
        matches!(self.messages.as_slice(), [only] if only.role == ChatRole::Assistant)
    }

    pub(crate) fn replace_first_text(&mut self, text: String) {
        if let Some(first) = self.messages.first_mut() {
            first.text = text;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatPayload {
    pub messages: Vec<ChatMessage>,
}

/// Only the text comes back from the translator; ids and roles are kept locally.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTranslation {
    pub messages: Vec<TranslatedText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatedText {
    pub text: String,
}

impl Translatable for ChatTranscript {
    type Payload = ChatPayload;
    type Translation = ChatTranslation;

    const PRODUCT: &'static str = "chat_transcript";

    fn to_payload(&self) -> ChatPayload {
        ChatPayload {
            messages: self.messages.clone(),
        }
    }

    fn overlay(&self, translated: ChatTranslation) -> Result<Self, ShapeError> {
        ensure_len("messages", self.messages.len(), translated.messages.len())?;
        let messages = self
            .messages
            .iter()
            .zip(translated.messages)
            .map(|(c, t)| ChatMessage {
                id: c.id,
                role: c.role,
                text: pick(t.text, &c.text),
            })
            .collect();
        Ok(Self { messages })
    }
}
