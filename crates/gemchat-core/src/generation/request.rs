use crate::transcript::Attachment;

/// One part of a generation request.
///
/// Bindings decide how `InlineData` travels: base64 for JSON transports,
/// raw bytes for binary ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),
    InlineData { media_type: String, data: Vec<u8> },
}

/// What the reconciler hands to a [`GenerationCapability`](super::GenerationCapability).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    parts: Vec<RequestPart>,
}

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

impl GenerationRequest {
    /// Builds a request from user text and attachments.
    ///
    /// Payloads are only included when `send_payloads` is set, and
    /// metadata-only attachments are always left out.
    pub fn build(text: &str, attachments: &[Attachment], send_payloads: bool) -> Self {
        let mut parts = Vec::new();
        if !text.trim().is_empty() {
            parts.push(RequestPart::Text(text.to_string()));
        }

        if send_payloads {
            for attachment in attachments {
                let Some(data) = attachment.payload.as_ref() else {
                    continue;
                };
                parts.push(RequestPart::InlineData {
                    media_type: attachment
                        .media_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
                    data: data.clone(),
                });
            }
        }

        Self { parts }
    }

    pub fn parts(&self) -> &[RequestPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn inline_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, RequestPart::InlineData { .. }))
            .count()
    }
}
