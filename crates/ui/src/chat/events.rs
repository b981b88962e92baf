use crate::chat::message::ChatId;

/// Emitted when sidebar selection changes the active chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatSelected {
    pub chat_id: ChatId,
}

/// Emitted when the user submits a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Emitted when the user interrupts the typing animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stop;

/// Emitted when the user asks to attach a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachPdf;
