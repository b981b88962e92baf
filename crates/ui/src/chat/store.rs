use crate::chat::message::{Chat, ChatId, Message, MessageId};

/// In-memory chat collection plus the active selection.
///
/// The app shell owns the only instance (as a GPUI entity). Sidebar and chat
/// view hold the entity handle and go through [`ChatStore::replace`] or
/// [`ChatStore::update`]; nothing else keeps a copy of the chats.
#[derive(Debug, Default)]
pub struct ChatStore {
    chats: Vec<Chat>,
    active_chat_id: Option<ChatId>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    /// Replaces the whole collection.
    pub fn replace(&mut self, next: Vec<Chat>) {
        self.chats = next;
    }

    /// Update-function form of [`ChatStore::replace`].
    pub fn update<R>(&mut self, update: impl FnOnce(&mut Vec<Chat>) -> R) -> R {
        update(&mut self.chats)
    }

    pub fn active_chat_id(&self) -> Option<&ChatId> {
        self.active_chat_id.as_ref()
    }

    /// The id is not checked against the collection.
    pub fn set_active_chat(&mut self, chat_id: Option<ChatId>) {
        self.active_chat_id = chat_id;
    }

    pub fn active_chat(&self) -> Option<&Chat> {
        self.active_chat_id
            .as_ref()
            .and_then(|chat_id| self.find(chat_id))
    }

    pub fn find(&self, chat_id: &ChatId) -> Option<&Chat> {
        self.chats.iter().find(|chat| &chat.id == chat_id)
    }

    /// Prepends a fresh chat and makes it active.
    pub fn create_chat(&mut self) -> ChatId {
        let chat = Chat::new(
            ChatId::generate(),
            format!("New Chat {}", self.chats.len() + 1),
        );
        let chat_id = chat.id.clone();

        self.update(|chats| chats.insert(0, chat));
        self.set_active_chat(Some(chat_id.clone()));
        chat_id
    }

    /// Returns false when the chat does not exist.
    pub fn append_message(&mut self, chat_id: &ChatId, message: Message) -> bool {
        self.update(|chats| {
            let Some(chat) = chats.iter_mut().find(|chat| &chat.id == chat_id) else {
                return false;
            };
            chat.messages.push(message);
            true
        })
    }

    /// The one in-place rewrite the message log allows: finalizing typed content.
    pub fn replace_message_content(
        &mut self,
        chat_id: &ChatId,
        message_id: MessageId,
        content: impl Into<String>,
    ) -> bool {
        let content = content.into();
        self.update(|chats| {
            let Some(message) = chats
                .iter_mut()
                .find(|chat| &chat.id == chat_id)
                .and_then(|chat| {
                    chat.messages
                        .iter_mut()
                        .find(|message| message.id == message_id)
                })
            else {
                return false;
            };
            message.content = content;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;

    #[test]
    fn created_chats_are_prepended_and_activated() {
        let mut store = ChatStore::new();
        let mut created = Vec::new();

        for _ in 0..5 {
            created.push(store.create_chat());
        }

        assert_eq!(store.chats().len(), 5);
        let listed = store
            .chats()
            .iter()
            .map(|chat| chat.id.clone())
            .collect::<Vec<_>>();
        created.reverse();
        assert_eq!(listed, created);
        assert_eq!(store.active_chat_id(), Some(&listed[0]));
        assert_eq!(store.chats()[0].title, "New Chat 5");
        assert_eq!(store.chats()[4].title, "New Chat 1");
    }

    #[test]
    fn selecting_unknown_chat_is_allowed() {
        let mut store = ChatStore::new();
        store.create_chat();

        store.set_active_chat(Some(ChatId::new("missing")));

        assert_eq!(store.active_chat_id(), Some(&ChatId::new("missing")));
        assert!(store.active_chat().is_none());
    }

    #[test]
    fn replace_and_update_forms_both_swap_the_collection() {
        let mut store = ChatStore::new();
        store.replace(vec![Chat::new(ChatId::new("a"), "A")]);
        assert_eq!(store.chats().len(), 1);

        let count = store.update(|chats| {
            chats.push(Chat::new(ChatId::new("b"), "B"));
            chats.len()
        });
        assert_eq!(count, 2);
        assert_eq!(store.chats()[1].id, ChatId::new("b"));
    }

    #[test]
    fn messages_append_in_order_and_content_can_be_finalized() {
        let mut store = ChatStore::new();
        let chat_id = store.create_chat();

        assert!(store.append_message(&chat_id, Message::user(MessageId::new(1), "hi")));
        assert!(store.append_message(&chat_id, Message::assistant_placeholder(MessageId::new(2))));
        assert!(store.replace_message_content(&chat_id, MessageId::new(2), "hello"));

        let chat = store.find(&chat_id).unwrap();
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, Role::User);
        assert_eq!(chat.messages[1].content, "hello");
        assert_eq!(chat.messages[1].id, MessageId::new(2));
    }

    #[test]
    fn writes_to_unknown_targets_are_reported() {
        let mut store = ChatStore::new();
        let chat_id = store.create_chat();

        assert!(!store.append_message(&ChatId::new("nope"), Message::user(MessageId::new(1), "x")));
        assert!(!store.replace_message_content(&chat_id, MessageId::new(99), "x"));
    }
}
