use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, Disableable, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    v_flex,
};

use crate::chat::events::{AttachPdf, Stop, Submit};

pub struct MessageInput {
    input_state: Entity<InputState>,
    is_loading: bool,
    is_typing: bool,
    pending_newline: bool,
}

impl EventEmitter<Submit> for MessageInput {}
impl EventEmitter<Stop> for MessageInput {}
impl EventEmitter<AttachPdf> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Type your message...")
                .auto_grow(1, 4)
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| {
                // Send button state follows the input content.
                cx.notify();

                if let InputEvent::PressEnter { secondary } = event {
                    if *secondary {
                        this.pending_newline = false;
                        return;
                    }

                    if this.pending_newline {
                        // Shift+Enter inserts the newline itself and still emits PressEnter.
                        this.pending_newline = false;
                    } else {
                        this.trim_trailing_newline(window, cx);
                        this.handle_submit(window, cx);
                    }
                }
            },
        )
        .detach();

        Self {
            input_state,
            is_loading: false,
            is_typing: false,
            pending_newline: false,
        }
    }

    /// Mirrors the session flags: input is disabled while loading, Stop shows while typing.
    pub fn set_activity(&mut self, is_loading: bool, is_typing: bool, cx: &mut Context<Self>) {
        if self.is_loading == is_loading && self.is_typing == is_typing {
            return;
        }

        self.is_loading = is_loading;
        self.is_typing = is_typing;
        if is_loading {
            self.pending_newline = false;
        }
        cx.notify();
    }

    pub fn clear(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        self.pending_newline = false;
    }

    fn handle_shift_enter(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.is_loading {
            return;
        }

        self.pending_newline = true;
        self.input_state.update(cx, |state, cx| {
            state.insert("\n", window, cx);
        });
        cx.notify();
    }

    fn trim_trailing_newline(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            let value = state.value().to_string();
            if let Some(trimmed) = value.strip_suffix('\n') {
                state.set_value(trimmed.to_string(), window, cx);
            }
        });
    }

    fn handle_submit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.is_loading {
            return;
        }

        let content = self.input_state.read(cx).value().to_string();
        if content.trim().is_empty() {
            return;
        }

        cx.emit(Submit::new(content));
        self.clear(window, cx);
    }

    fn handle_stop(&mut self, cx: &mut Context<Self>) {
        if !self.is_typing {
            return;
        }

        cx.emit(Stop);
    }

    fn handle_attach(&mut self, cx: &mut Context<Self>) {
        if self.is_loading {
            return;
        }

        cx.emit(AttachPdf);
    }
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let is_loading = self.is_loading;
        let has_content = !self.input_state.read(cx).value().trim().is_empty();

        v_flex()
            .bg(theme.background)
            .gap_2()
            .p_3()
            .child(
                h_flex()
                    .w_full()
                    .gap_2()
                    .items_end()
                    .child(
                        Button::new("attach-pdf")
                            .ghost()
                            .small()
                            .icon(IconName::File)
                            .disabled(is_loading)
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.handle_attach(cx);
                            })),
                    )
                    .child(
                        div()
                            .flex_1()
                            .min_w_0()
                            .px_3()
                            .py_2()
                            .rounded_lg()
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.background)
                            .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                                if event.keystroke.key == "enter" && event.keystroke.modifiers.shift
                                {
                                    this.handle_shift_enter(window, cx);
                                }
                            }))
                            .child(Input::new(&self.input_state).w_full().disabled(is_loading)),
                    )
                    .when(self.is_typing, |row| {
                        row.child(
                            Button::new("stop")
                                .small()
                                .danger()
                                .icon(IconName::CircleX)
                                .child("Stop")
                                .on_click(cx.listener(|this, _, _window, cx| {
                                    this.handle_stop(cx);
                                })),
                        )
                    })
                    .child(
                        Button::new("send")
                            .small()
                            .primary()
                            .icon(IconName::ArrowUp)
                            .child("Send")
                            .disabled(is_loading || !has_content)
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.handle_submit(window, cx);
                            })),
                    ),
            )
    }
}
