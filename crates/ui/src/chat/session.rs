use std::fmt::Display;
use std::path::Path;

use paperbot_client::{ChatRequest, UploadError, ensure_pdf};

use crate::chat::message::{ChatId, Message, MessageId};
use crate::chat::store::ChatStore;
use crate::chat::typewriter::{Finalized, TickOutcome, TypingTarget, Typewriter};

/// Shown in place of an empty PDF reply.
pub const PDF_FALLBACK_REPLY: &str = "PDF processed successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Message,
    Pdf,
}

/// Outstanding backend call, bound to the chat that was active when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub chat_id: ChatId,
    pub kind: ReplyKind,
}

/// Send/upload/typing flow of one chat pane, kept free of GPUI so it can be
/// driven directly from tests. The view owns the timers and the HTTP tasks
/// and forwards their results here.
#[derive(Debug)]
pub struct ChatSession {
    is_loading: bool,
    pending: Option<PendingReply>,
    typewriter: Typewriter,
    next_message_id: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            is_loading: false,
            pending: None,
            typewriter: Typewriter::new(),
            next_message_id: 1,
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_typing(&self) -> bool {
        self.typewriter.is_active()
    }

    /// Chat waiting for a reply that has not arrived yet.
    pub fn pending_chat(&self) -> Option<&ChatId> {
        self.pending.as_ref().map(|pending| &pending.chat_id)
    }

    pub fn typewriter(&self) -> &Typewriter {
        &self.typewriter
    }

    pub fn displayed_content<'a>(&'a self, chat_id: &ChatId, message: &'a Message) -> &'a str {
        self.typewriter.displayed_content(chat_id, message)
    }

    fn allocate_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id += 1;
        id
    }

    /// Appends the user message and enters the loading state.
    ///
    /// Returns `None` without touching anything while a reply is outstanding,
    /// when the trimmed input is empty, or when no chat is active.
    pub fn begin_send(
        &mut self,
        store: &mut ChatStore,
        content: &str,
    ) -> Option<(PendingReply, ChatRequest)> {
        if self.is_loading {
            return None;
        }

        if content.trim().is_empty() {
            return None;
        }

        let chat_id = store.active_chat_id()?.clone();
        let message_id = self.allocate_message_id();
        if !store.append_message(&chat_id, Message::user(message_id, content)) {
            return None;
        }

        let pending = PendingReply {
            chat_id: chat_id.clone(),
            kind: ReplyKind::Message,
        };
        self.is_loading = true;
        self.pending = Some(pending.clone());

        Some((pending, ChatRequest::new(content, chat_id.as_str())))
    }

    /// Validates the picked file and enters the loading state.
    ///
    /// No user message is appended for uploads. A file that does not declare
    /// itself as PDF is rejected before any IO.
    pub fn begin_pdf_upload(
        &mut self,
        store: &ChatStore,
        path: &Path,
    ) -> Result<Option<PendingReply>, UploadError> {
        if self.is_loading {
            return Ok(None);
        }

        let Some(chat_id) = store.active_chat_id().cloned() else {
            return Ok(None);
        };

        ensure_pdf(path)?;

        let pending = PendingReply {
            chat_id,
            kind: ReplyKind::Pdf,
        };
        self.is_loading = true;
        self.pending = Some(pending.clone());
        Ok(Some(pending))
    }

    /// Appends the assistant placeholder and starts typing the reply into it.
    pub fn finish_reply(
        &mut self,
        store: &mut ChatStore,
        pending: PendingReply,
        reply: String,
    ) -> TypingTarget {
        let reply = match pending.kind {
            ReplyKind::Pdf if reply.is_empty() => PDF_FALLBACK_REPLY.to_string(),
            _ => reply,
        };

        self.clear_pending(&pending);

        let message_id = self.allocate_message_id();
        store.append_message(&pending.chat_id, Message::assistant_placeholder(message_id));

        let target = TypingTarget::new(pending.chat_id, message_id);
        tracing::debug!(
            chat_id = %target.chat_id,
            message_id = %target.message_id,
            char_count = reply.chars().count(),
            "typing started"
        );
        if let Some(previous) = self.typewriter.start(target.clone(), reply) {
            write_finalized(store, previous);
        }
        target
    }

    pub fn fail_reply(&mut self, pending: &PendingReply, error: &dyn Display) {
        tracing::error!(
            chat_id = %pending.chat_id,
            kind = ?pending.kind,
            error = %error,
            "backend request failed"
        );
        self.clear_pending(pending);
        if !self.typewriter.is_active() {
            self.is_loading = false;
        }
    }

    /// Advances the animation by one character. Returns true while more remain.
    pub fn tick(&mut self, store: &mut ChatStore) -> bool {
        match self.typewriter.tick() {
            TickOutcome::Idle => false,
            TickOutcome::Revealed => true,
            TickOutcome::Completed(finalized) => {
                write_finalized(store, finalized);
                self.is_loading = false;
                false
            }
        }
    }

    /// Stops typing, storing what was revealed so far. Returns false when idle.
    pub fn stop_typing(&mut self, store: &mut ChatStore) -> bool {
        let Some(finalized) = self.typewriter.stop() else {
            return false;
        };

        write_finalized(store, finalized);
        self.is_loading = false;
        true
    }

    fn clear_pending(&mut self, pending: &PendingReply) {
        if self.pending.as_ref() == Some(pending) {
            self.pending = None;
        }
    }
}

fn write_finalized(store: &mut ChatStore, finalized: Finalized) {
    tracing::debug!(
        chat_id = %finalized.target.chat_id,
        message_id = %finalized.target.message_id,
        completed = finalized.completed,
        "typing finalized"
    );
    store.replace_message_content(
        &finalized.target.chat_id,
        finalized.target.message_id,
        finalized.content,
    );
}
