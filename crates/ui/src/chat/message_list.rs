use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex};

use crate::chat::message::{Chat, MessageId, Role};
use crate::chat::session::ChatSession;

const USER_BUBBLE_MAX_WIDTH: Pixels = px(540.);
const USER_BUBBLE_PADDING_X: Pixels = px(14.);
const USER_BUBBLE_PADDING_Y: Pixels = px(10.);
const THINKING_LABEL: &str = "Thinking...";

/// One rendered message with its displayed (not necessarily stored) content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: MessageId,
    pub role: Role,
    pub content: SharedString,
    pub timestamp: SharedString,
}

/// Rows for `chat`, with the message being typed showing the revealed prefix.
pub fn message_rows(chat: &Chat, session: &ChatSession) -> Vec<MessageRow> {
    chat.messages
        .iter()
        .map(|message| MessageRow {
            id: message.id,
            role: message.role,
            content: SharedString::from(session.displayed_content(&chat.id, message).to_string()),
            timestamp: SharedString::from(message.timestamp.format("%H:%M").to_string()),
        })
        .collect()
}

/// True while a reply for `chat` is outstanding and typing has not started.
pub fn shows_thinking(chat: &Chat, session: &ChatSession) -> bool {
    session.is_loading() && !session.is_typing() && session.pending_chat() == Some(&chat.id)
}

pub struct MessageList {
    rows: Vec<MessageRow>,
    thinking: bool,
    scroll_handle: ScrollHandle,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            rows: Vec::new(),
            thinking: false,
            scroll_handle: ScrollHandle::new(),
        }
    }

    pub fn set_rows(&mut self, rows: Vec<MessageRow>, thinking: bool, cx: &mut Context<Self>) {
        if self.rows == rows && self.thinking == thinking {
            return;
        }

        self.rows = rows;
        self.thinking = thinking;
        self.scroll_handle.scroll_to_bottom();
        cx.notify();
    }

    fn render_row(&self, row: &MessageRow, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        if row.role == Role::User {
            return v_flex()
                .w_full()
                .items_end()
                .gap_1()
                .child(
                    div()
                        .max_w(USER_BUBBLE_MAX_WIDTH)
                        .px(USER_BUBBLE_PADDING_X)
                        .py(USER_BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.accent)
                        .text_color(theme.accent_foreground)
                        .child(Label::new(row.content.clone()).text_sm()),
                )
                .child(
                    Label::new(row.timestamp.clone())
                        .text_xs()
                        .text_color(theme.foreground.opacity(0.45)),
                )
                .into_any_element();
        }

        v_flex()
            .w_full()
            .gap_2()
            .child(
                h_flex()
                    .gap_2()
                    .child(
                        Label::new("Assistant")
                            .text_xs()
                            .text_color(theme.foreground.opacity(0.5)),
                    )
                    .child(
                        Label::new(row.timestamp.clone())
                            .text_xs()
                            .text_color(theme.foreground.opacity(0.35)),
                    ),
            )
            .child(Label::new(row.content.clone()).text_sm())
            .into_any_element()
    }

    fn render_thinking(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        h_flex()
            .w_full()
            .gap_2()
            .items_center()
            .child(div().size(px(8.)).rounded_full().bg(theme.primary))
            .child(
                Label::new(THINKING_LABEL)
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.65)),
            )
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let rows = self.rows.clone();
        let mut children = rows
            .iter()
            .map(|row| self.render_row(row, cx))
            .collect::<Vec<_>>();
        if self.thinking {
            children.push(self.render_thinking(cx));
        }

        v_flex().size_full().min_h_0().child(
            v_flex()
                .id("message-list")
                .size_full()
                .px_4()
                .py_3()
                .gap_4()
                .overflow_y_scroll()
                .track_scroll(&self.scroll_handle)
                .children(children),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::ChatStore;

    #[::core::prelude::v1::test]
    fn rows_show_revealed_prefix_for_the_typing_message() {
        let mut store = ChatStore::new();
        let chat_id = store.create_chat();
        let mut session = ChatSession::new();

        let (pending, _) = session.begin_send(&mut store, "hi").unwrap();
        let chat = store.find(&chat_id).unwrap().clone();
        assert!(shows_thinking(&chat, &session));

        session.finish_reply(&mut store, pending, "Hello".to_string());
        session.tick(&mut store);
        session.tick(&mut store);

        let chat = store.find(&chat_id).unwrap();
        let rows = message_rows(chat, &session);
        assert!(!shows_thinking(chat, &session));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].content.as_ref(), "hi");
        assert_eq!(rows[1].role, Role::Assistant);
        assert_eq!(rows[1].content.as_ref(), "He");
    }

    #[::core::prelude::v1::test]
    fn thinking_row_belongs_to_the_pending_chat_only() {
        let mut store = ChatStore::new();
        let first = store.create_chat();
        let mut session = ChatSession::new();
        session.begin_send(&mut store, "hi").unwrap();

        let second = store.create_chat();

        assert!(shows_thinking(store.find(&first).unwrap(), &session));
        assert!(!shows_thinking(store.find(&second).unwrap(), &session));
    }
}
