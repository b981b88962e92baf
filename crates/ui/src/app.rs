use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::notification::NotificationList;
use gpui_component::{
    ActiveTheme, IconName, Sizable, ThemeMode,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};

use crate::chat::{ChatSelected, ChatSidebar, ChatStore, ChatView};
use crate::settings::SettingsState;

/// Sidebar width when expanded.
pub const SIDEBAR_WIDTH: f32 = 260.0;
pub const SIDEBAR_COLLAPSED_WIDTH: f32 = 56.0;
pub const APP_TITLE: &str = "PaperBot";
#[cfg(target_os = "macos")]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 78.0;
#[cfg(not(target_os = "macos"))]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 16.0;
const _: () = {
    assert!(SIDEBAR_COLLAPSED_WIDTH > 0.0);
    assert!(SIDEBAR_COLLAPSED_WIDTH < SIDEBAR_WIDTH);
};

/// Zed-style toolbar height that follows the user's rem size.
fn window_toolbar_height(window: &Window) -> Pixels {
    (1.75 * window.rem_size()).max(px(34.0))
}

/// Theme the bottom bar toggle switches to.
pub fn toggled_theme_mode(current: ThemeMode) -> ThemeMode {
    if current.is_dark() {
        ThemeMode::Light
    } else {
        ThemeMode::Dark
    }
}

gpui::actions!(shell, [NewChat, ToggleSidebar, Quit]);

/// Root layout: sidebar, message pane, top and bottom bars.
///
/// The shell owns the chat store entity and hands the same handle to the
/// sidebar and the chat view.
pub struct ChatAppShell {
    notification_list: Entity<NotificationList>,
    settings_state: Entity<SettingsState>,
    store: Entity<ChatStore>,
    sidebar: Entity<ChatSidebar>,
    chat_view: Entity<ChatView>,
    sidebar_collapsed: bool,
    title_bar_should_move: bool,
}

impl ChatAppShell {
    pub fn new(
        notification_list: Entity<NotificationList>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let settings_state = SettingsState::new(cx);
        let store = cx.new(|_| ChatStore::new());
        let sidebar = cx.new(|cx| ChatSidebar::new(store.clone(), cx));
        let chat_view = cx.new(|cx| ChatView::new(store.clone(), &settings_state, window, cx));

        cx.subscribe(&sidebar, |this, _, event: &ChatSelected, cx| {
            this.chat_view
                .update(cx, |chat_view, cx| chat_view.handle_chat_selected(event, cx));
        })
        .detach();

        Self {
            notification_list,
            settings_state,
            store,
            sidebar,
            chat_view,
            sidebar_collapsed: false,
            title_bar_should_move: false,
        }
    }

    fn toggle_sidebar(&mut self, cx: &mut Context<Self>) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        cx.notify();
    }

    fn new_chat(&mut self, cx: &mut Context<Self>) {
        self.sidebar
            .update(cx, |sidebar, cx| sidebar.create_new_chat(cx));
    }

    fn toggle_theme(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let settings = self.settings_state.read(cx).settings();
        let next = (*settings)
            .clone()
            .with_theme_mode(toggled_theme_mode(settings.theme_mode));
        next.apply_theme(Some(window), cx);

        let result = self
            .settings_state
            .update(cx, |state, cx| state.update_settings(next, cx));
        if let Err(error) = result {
            tracing::error!(error = %error, "failed to persist theme mode");
        }
        cx.notify();
    }

    fn active_chat_title(&self, cx: &App) -> SharedString {
        self.store
            .read(cx)
            .active_chat()
            .map(|chat| SharedString::from(chat.title.clone()))
            .unwrap_or_else(|| SharedString::from(APP_TITLE))
    }
}

impl Render for ChatAppShell {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let toolbar_height = window_toolbar_height(window);

        div()
            .size_full()
            .relative()
            .bg(theme.background)
            .on_action(cx.listener(|this, _: &NewChat, _window, cx| {
                this.new_chat(cx);
            }))
            .on_action(cx.listener(|this, _: &ToggleSidebar, _window, cx| {
                this.toggle_sidebar(cx);
            }))
            .child(
                v_flex()
                    .size_full()
                    .child(
                        h_flex()
                            .id("app-shell-body")
                            .flex_1()
                            .min_w_0()
                            .min_h_0()
                            .pt(toolbar_height)
                            .overflow_hidden()
                            .child(self.render_sidebar(cx))
                            .child(
                                v_flex()
                                    .id("main-content")
                                    .flex_1()
                                    .h_full()
                                    .min_w_0()
                                    .min_h_0()
                                    .overflow_hidden()
                                    .child(self.chat_view.clone()),
                            ),
                    )
                    .child(self.render_bottom_bar(cx)),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .left_0()
                    .right_0()
                    .child(self.render_top_bar(window, toolbar_height, cx)),
            )
            .child(self.notification_list.clone())
    }
}

impl ChatAppShell {
    fn render_collapsed_sidebar(&self, cx: &Context<Self>) -> AnyElement {
        v_flex()
            .id("collapsed-sidebar")
            .size_full()
            .items_center()
            .justify_start()
            .py_3()
            .px_2()
            .child(
                Button::new("new-chat-collapsed")
                    .ghost()
                    .small()
                    .icon(IconName::Plus)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.new_chat(cx);
                    })),
            )
            .into_any_element()
    }

    fn render_top_bar(
        &self,
        window: &Window,
        toolbar_height: Pixels,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();
        let title = self.active_chat_title(cx);

        h_flex()
            .id("app-top-bar")
            .window_control_area(WindowControlArea::Drag)
            .on_mouse_down_out(cx.listener(|this, _, _window, _cx| {
                this.title_bar_should_move = false;
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = false;
                }),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = true;
                }),
            )
            .on_mouse_move(cx.listener(|this, _, window, _cx| {
                if this.title_bar_should_move {
                    this.title_bar_should_move = false;
                    window.start_window_move();
                }
            }))
            .w_full()
            .h(toolbar_height)
            .flex_shrink_0()
            .pl(px(WINDOW_TOOLBAR_LEFT_SAFE_PADDING))
            .pr_4()
            .items_center()
            .justify_between()
            .bg(theme.background)
            .border_b_1()
            .border_color(theme.border)
            .child(Label::new(title).text_sm())
            .when(
                cfg!(target_os = "linux") && window.window_controls().window_menu,
                |title_bar| {
                    title_bar.on_mouse_down(MouseButton::Right, |event, window, _| {
                        window.show_window_menu(event.position);
                    })
                },
            )
    }

    fn render_bottom_bar(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let sidebar_toggle_icon = if self.sidebar_collapsed {
            IconName::PanelLeftOpen
        } else {
            IconName::PanelLeftClose
        };
        let theme_toggle_icon = if theme.mode.is_dark() {
            IconName::Sun
        } else {
            IconName::Moon
        };

        h_flex()
            .id("app-bottom-bar")
            .w_full()
            .flex_shrink_0()
            .items_center()
            .gap_1()
            .px_3()
            .py_1()
            .border_t_1()
            .border_color(theme.border)
            .child(
                Button::new("sidebar-toggle")
                    .ghost()
                    .small()
                    .icon(sidebar_toggle_icon)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.toggle_sidebar(cx);
                    })),
            )
            .child(
                Button::new("theme-toggle")
                    .ghost()
                    .small()
                    .icon(theme_toggle_icon)
                    .on_click(cx.listener(|this, _, window, cx| {
                        this.toggle_theme(window, cx);
                    })),
            )
            .child(div().id("app-bottom-main-spacer").flex_1().min_w_0())
    }

    fn render_sidebar(&self, cx: &Context<Self>) -> impl IntoElement {
        let (sidebar_width, sidebar_content) = if self.sidebar_collapsed {
            (SIDEBAR_COLLAPSED_WIDTH, self.render_collapsed_sidebar(cx))
        } else {
            (SIDEBAR_WIDTH, self.sidebar.clone().into_any_element())
        };
        let theme = cx.theme();

        div()
            .id("sidebar-container")
            .h_full()
            .min_w_0()
            .flex_shrink_0()
            .w(px(sidebar_width))
            .overflow_hidden()
            .bg(theme.background)
            .border_r_1()
            .border_color(theme.border)
            .child(sidebar_content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn theme_toggle_flips_between_modes() {
        assert_eq!(toggled_theme_mode(ThemeMode::Dark), ThemeMode::Light);
        assert_eq!(toggled_theme_mode(ThemeMode::Light), ThemeMode::Dark);
    }
}
