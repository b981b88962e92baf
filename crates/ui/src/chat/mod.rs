pub mod events;
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod session;
pub mod sidebar;
pub mod store;
pub mod typewriter;
pub mod view;

pub use events::{AttachPdf, ChatSelected, Stop, Submit};
pub use message::{Chat, ChatId, Message, MessageId, Role};
pub use message_input::MessageInput;
pub use message_list::{MessageList, MessageRow};
pub use session::{ChatSession, PDF_FALLBACK_REPLY, PendingReply, ReplyKind};
pub use sidebar::ChatSidebar;
pub use store::ChatStore;
pub use typewriter::{
    CHAT_TYPING_INTERVAL, TEXT_REVEAL_DEFAULT_INTERVAL, TextReveal, TypingMarker, TypingTarget,
    Typewriter,
};
pub use view::ChatView;
