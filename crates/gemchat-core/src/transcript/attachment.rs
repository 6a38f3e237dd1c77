//! Attachment types and the pending attachment set.

use serde::{Deserialize, Serialize};

/// A file attached to a user message.
///
/// The payload is owned by the message that references it. An attachment
/// without a payload is metadata-only and is never sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display filename (not guaranteed unique).
    pub name: String,
    /// Raw bytes, stored as base64 under `data` when serialized.
    #[serde(
        rename = "data",
        default,
        with = "base64_payload",
        skip_serializing_if = "Option::is_none"
    )]
    pub payload: Option<Vec<u8>>,
    /// MIME-like tag used to pick an encoding/rendering strategy.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Byte length of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// The `(name, size)` pair used to detect duplicate selections.
///
/// Two distinct files with the same name and length collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub name: String,
    pub size: Option<u64>,
}

impl Attachment {
    /// Creates an attachment that carries its bytes.
    pub fn with_payload(
        name: impl Into<String>,
        payload: Vec<u8>,
        media_type: Option<String>,
    ) -> Self {
        let size = payload.len() as u64;
        Self {
            name: name.into(),
            payload: Some(payload),
            media_type,
            size: Some(size),
        }
    }

    /// Creates a metadata-only attachment.
    pub fn metadata_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
            media_type: None,
            size: None,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            name: self.name.clone(),
            size: self.size,
        }
    }

    /// Whether this attachment may go through the inline-content channel.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn is_image(&self) -> bool {
        self.media_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
    }
}

/// Attachments selected but not yet attached to a submitted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAttachmentSet {
    items: Vec<Attachment>,
}

impl PendingAttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attachment unless one with the same fingerprint is already pending.
    ///
    /// Returns `true` if the attachment was added.
    pub fn add(&mut self, attachment: Attachment) -> bool {
        let fingerprint = attachment.fingerprint();
        if self.items.iter().any(|item| item.fingerprint() == fingerprint) {
            return false;
        }
        self.items.push(attachment);
        true
    }

    /// Removes and returns every pending attachment, leaving the set empty.
    pub fn take(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.items)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name.as_str()).collect()
    }
}

mod base64_payload {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(payload: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match payload {
            Some(bytes) => serializer.serialize_some(&BASE64_STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|text| {
                BASE64_STANDARD
                    .decode(text)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
