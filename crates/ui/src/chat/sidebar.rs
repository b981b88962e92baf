use std::rc::Rc;

use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable, VirtualListScrollHandle,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    list::ListItem,
    v_flex, v_virtual_list,
};

use crate::chat::events::ChatSelected;
use crate::chat::message::ChatId;
use crate::chat::store::ChatStore;

const CHAT_ROW_HEIGHT: f32 = 40.0;

/// One rendered history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarRow {
    pub chat_id: ChatId,
    pub title: SharedString,
    pub selected: bool,
}

/// Rows in store order, newest first.
pub fn sidebar_rows(store: &ChatStore) -> Vec<SidebarRow> {
    let active = store.active_chat_id();
    store
        .chats()
        .iter()
        .map(|chat| SidebarRow {
            chat_id: chat.id.clone(),
            title: SharedString::from(chat.title.clone()),
            selected: active == Some(&chat.id),
        })
        .collect()
}

pub struct ChatSidebar {
    store: Entity<ChatStore>,
    rows: Vec<SidebarRow>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_handle: VirtualListScrollHandle,
}

impl EventEmitter<ChatSelected> for ChatSidebar {}

impl ChatSidebar {
    pub fn new(store: Entity<ChatStore>, cx: &mut Context<Self>) -> Self {
        cx.observe(&store, |this, _, cx| {
            this.rebuild_rows(cx);
            cx.notify();
        })
        .detach();

        let mut sidebar = Self {
            store,
            rows: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_handle: VirtualListScrollHandle::new(),
        };
        sidebar.rebuild_rows(cx);
        sidebar
    }

    /// Prepends an empty chat and makes it active.
    pub fn create_new_chat(&mut self, cx: &mut Context<Self>) -> ChatId {
        let chat_id = self.store.update(cx, |store, cx| {
            let chat_id = store.create_chat();
            cx.notify();
            chat_id
        });

        tracing::debug!(chat_id = %chat_id, "created chat");
        cx.emit(ChatSelected {
            chat_id: chat_id.clone(),
        });
        chat_id
    }

    pub fn select_chat(&mut self, chat_id: ChatId, cx: &mut Context<Self>) {
        self.store.update(cx, |store, cx| {
            store.set_active_chat(Some(chat_id.clone()));
            cx.notify();
        });
        cx.emit(ChatSelected { chat_id });
    }

    fn rebuild_rows(&mut self, cx: &mut Context<Self>) {
        self.rows = sidebar_rows(self.store.read(cx));
        self.item_sizes = Rc::new(
            self.rows
                .iter()
                .map(|_| size(px(0.), px(CHAT_ROW_HEIGHT)))
                .collect(),
        );
    }

    fn render_header(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .w_full()
            .min_w_0()
            .items_center()
            .justify_between()
            .px_3()
            .pt(px(8.))
            .pb_2()
            .border_b_1()
            .border_color(theme.border)
            .child(Label::new("Chat History").text_sm())
            .child(
                Button::new("new-chat")
                    .ghost()
                    .small()
                    .icon(IconName::Plus)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.create_new_chat(cx);
                    })),
            )
    }

    fn render_empty_state(&mut self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .flex_1()
            .items_center()
            .justify_center()
            .px_4()
            .child(
                Label::new("No chats yet")
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.55)),
            )
            .into_any_element()
    }

    fn render_history_list(&mut self, cx: &mut Context<Self>) -> AnyElement {
        if self.rows.is_empty() {
            return self.render_empty_state(cx);
        }

        let rows = self.rows.clone();

        v_flex()
            .flex_1()
            .min_h_0()
            .child(
                v_virtual_list(
                    cx.entity().clone(),
                    "chat-list",
                    self.item_sizes.clone(),
                    move |_this, visible_range, _window, cx| {
                        visible_range
                            .filter_map(|index| rows.get(index).map(|row| (index, row.clone())))
                            .map(|(index, row)| {
                                let chat_id = row.chat_id.clone();

                                div()
                                    .w_full()
                                    .h(px(CHAT_ROW_HEIGHT))
                                    .px_2()
                                    .child(
                                        ListItem::new(("chat", index))
                                            .w_full()
                                            .h_full()
                                            .px_3()
                                            .py_2()
                                            .rounded_md()
                                            .selected(row.selected)
                                            .on_click(cx.listener(
                                                move |this, _event: &ClickEvent, _window, cx| {
                                                    this.select_chat(chat_id.clone(), cx);
                                                },
                                            ))
                                            .child(
                                                div()
                                                    .flex_1()
                                                    .min_w_0()
                                                    .truncate()
                                                    .child(Label::new(row.title).text_sm()),
                                            ),
                                    )
                                    .into_any_element()
                            })
                            .collect()
                    },
                )
                .w_full()
                .flex_1()
                .track_scroll(&self.scroll_handle),
            )
            .into_any_element()
    }
}

impl Render for ChatSidebar {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .size_full()
            .min_w_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(self.render_header(cx))
            .child(self.render_history_list(cx))
    }
}
