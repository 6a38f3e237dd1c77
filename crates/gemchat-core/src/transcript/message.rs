//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, content parts and attachments.

use serde::{Deserialize, Serialize};

use super::attachment::Attachment;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the model.
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One part of a structured message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageRef { name: String },
    FileRef { name: String },
}

/// Message body: a bare string for plain text, or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenates the text parts of the body.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Names referenced by image or file parts.
    pub fn referenced_names(&self) -> Vec<&str> {
        match self {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ImageRef { name } | ContentPart::FileRef { name } => {
                        Some(name.as_str())
                    }
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// A single entry of the transcript.
///
/// Messages are created once and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ConversationMessage {
    /// Builds a user message.
    ///
    /// Without attachments the body is a bare string; otherwise it is a part
    /// list with one reference per attachment after the text.
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        let text = text.into();
        let content = if attachments.is_empty() {
            MessageContent::Text(text)
        } else {
            let mut parts = Vec::with_capacity(attachments.len() + 1);
            if !text.trim().is_empty() {
                parts.push(ContentPart::Text { text });
            }
            parts.extend(attachments.iter().map(|attachment| {
                let name = attachment.name.clone();
                if attachment.is_image() {
                    ContentPart::ImageRef { name }
                } else {
                    ContentPart::FileRef { name }
                }
            }));
            MessageContent::Parts(parts)
        };

        Self {
            role: MessageRole::User,
            content,
            attachments,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(text.into()),
            attachments: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.content.as_text()
    }
}
