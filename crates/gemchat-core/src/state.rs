//! Session state shared between the reconciler and the presentation layer.

use crate::transcript::{PendingAttachmentSet, Transcript};

/// Mutable state of one chat session.
///
/// The reconciler mutates it through `&mut`; the presentation layer only
/// reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    pub transcript: Transcript,
    pub pending: PendingAttachmentSet,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears both the transcript and the pending attachments.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.pending.clear();
    }
}
