use serde::{Deserialize, Serialize};

use super::message::ConversationMessage;
use crate::error::{ChatError, Result};

/// Ordered, append-only conversation history.
///
/// Entries are never edited in place. The whole history is replaced on
/// reset or import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ConversationMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ConversationMessage>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    /// Replaces the whole history.
    pub fn replace(&mut self, other: Transcript) {
        self.messages = other.messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    /// Compact JSON used for the persisted copy.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON offered as an export artifact.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses exported JSON.
    ///
    /// The document must be a top-level array of messages; anything else is
    /// reported as [`ChatError::ImportFormat`].
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ChatError::import_format(format!("invalid JSON: {e}")))?;

        if !value.is_array() {
            return Err(ChatError::import_format(
                "expected a list of message objects",
            ));
        }

        let messages: Vec<ConversationMessage> = serde_json::from_value(value)
            .map_err(|e| ChatError::import_format(format!("invalid message entry: {e}")))?;

        Ok(Self { messages })
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ConversationMessage;
    type IntoIter = std::slice::Iter<'a, ConversationMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
