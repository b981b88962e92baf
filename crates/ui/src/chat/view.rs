use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gpui::*;
use gpui_component::{ActiveTheme, label::Label, v_flex};
use gpui_tokio_bridge::Tokio;
use paperbot_client::{BackendResult, ChatBackend, ChatRequest, PdfUpload, create_backend};

use crate::chat::events::{AttachPdf, ChatSelected, Stop, Submit};
use crate::chat::message_list::{message_rows, shows_thinking};
use crate::chat::session::{ChatSession, PendingReply};
use crate::chat::store::ChatStore;
use crate::chat::typewriter::TextReveal;
use crate::chat::{MessageInput, MessageList};
use crate::settings::{ClientSettings, SettingsChanged, SettingsState};

const EMPTY_STATE_HEADING: &str = "Select a chat or create a new one";
const NOT_PDF_ALERT: &str = "Please upload a PDF file";

type ReplyTask = Task<Result<BackendResult<String>, gpui_tokio_bridge::JoinError>>;

/// Message pane: renders the active chat and runs the send, upload and typing flows.
pub struct ChatView {
    store: Entity<ChatStore>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    session: ChatSession,
    backend: Option<Arc<dyn ChatBackend>>,
    backend_error: Option<String>,
    typing_interval: Duration,
    has_active_chat: bool,
    request_task: Option<Task<()>>,
    typing_task: Option<Task<()>>,
    picker_task: Option<Task<()>>,
    empty_state: TextReveal,
    empty_state_task: Option<Task<()>>,
}

impl ChatView {
    pub fn new(
        store: Entity<ChatStore>,
        settings_state: &Entity<SettingsState>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));
        let settings = settings_state.read(cx).settings();

        cx.observe(&store, |this, _, cx| {
            this.sync_view(cx);
        })
        .detach();

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.handle_submit(event.content.clone(), cx);
        })
        .detach();

        cx.subscribe(&message_input, |this, _, _event: &Stop, cx| {
            this.handle_stop(cx);
        })
        .detach();

        cx.subscribe_in(
            &message_input,
            window,
            |this, _, _event: &AttachPdf, window, cx| {
                this.handle_attach(window, cx);
            },
        )
        .detach();

        cx.subscribe(settings_state, |this, _, event: &SettingsChanged, cx| {
            this.handle_settings_changed(event, cx);
        })
        .detach();

        let mut this = Self {
            store,
            message_list,
            message_input,
            session: ChatSession::new(),
            backend: None,
            backend_error: None,
            typing_interval: settings.typing_interval(),
            has_active_chat: false,
            request_task: None,
            typing_task: None,
            picker_task: None,
            empty_state: TextReveal::new(EMPTY_STATE_HEADING),
            empty_state_task: None,
        };
        this.configure_backend(&settings);
        this.sync_view(cx);
        this
    }

    pub fn handle_chat_selected(&mut self, event: &ChatSelected, cx: &mut Context<Self>) {
        tracing::debug!(chat_id = %event.chat_id, "chat selected");
        self.sync_view(cx);
    }

    fn configure_backend(&mut self, settings: &ClientSettings) {
        match create_backend(settings.backend_config()) {
            Ok(backend) => {
                tracing::info!(base_url = %settings.api_base_url, "configured chat backend");
                self.backend = Some(backend);
                self.backend_error = None;
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to configure chat backend");
                self.backend = None;
                self.backend_error = Some(error.to_string());
            }
        }
    }

    fn handle_settings_changed(&mut self, event: &SettingsChanged, cx: &mut Context<Self>) {
        self.typing_interval = event.settings.typing_interval();
        self.configure_backend(&event.settings);
        cx.notify();
    }

    fn handle_submit(&mut self, content: String, cx: &mut Context<Self>) {
        let started = self.store.update(cx, |store, cx| {
            let started = self.session.begin_send(store, &content);
            if started.is_some() {
                cx.notify();
            }
            started
        });
        let Some((pending, request)) = started else {
            return;
        };

        self.spawn_chat_request(pending, request, cx);
        self.sync_view(cx);
    }

    fn spawn_chat_request(
        &mut self,
        pending: PendingReply,
        request: ChatRequest,
        cx: &mut Context<Self>,
    ) {
        let Some(backend) = self.backend.clone() else {
            self.fail_without_backend(&pending);
            return;
        };

        let reply_task: ReplyTask =
            Tokio::spawn(cx, async move { backend.send_message(request).await });
        self.await_reply(pending, reply_task, cx);
    }

    fn handle_attach(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.session.is_loading() {
            return;
        }

        let paths = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: false,
            prompt: None,
        });

        self.picker_task = Some(cx.spawn_in(window, async move |this, cx| {
            let Ok(Ok(Some(paths))) = paths.await else {
                return;
            };
            let Some(path) = paths.into_iter().next() else {
                return;
            };

            let _ = this.update_in(cx, |this, window, cx| {
                this.picker_task = None;
                this.upload_pdf(path, window, cx);
            });
        }));
    }

    fn upload_pdf(&mut self, path: PathBuf, window: &mut Window, cx: &mut Context<Self>) {
        let pending = match self.session.begin_pdf_upload(self.store.read(cx), &path) {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!(error = %error, "rejected upload");
                let answer = window.prompt(PromptLevel::Warning, NOT_PDF_ALERT, None, &["OK"], cx);
                cx.spawn(async move |_, _| {
                    let _ = answer.await;
                })
                .detach();
                return;
            }
        };

        self.sync_view(cx);

        let Some(backend) = self.backend.clone() else {
            self.fail_without_backend(&pending);
            return;
        };

        let chat_id = pending.chat_id.as_str().to_string();
        let reply_task: ReplyTask = Tokio::spawn(cx, async move {
            let upload = PdfUpload::read(chat_id, &path).await?;
            backend.upload_pdf(upload).await
        });
        self.await_reply(pending, reply_task, cx);
    }

    fn await_reply(&mut self, pending: PendingReply, reply_task: ReplyTask, cx: &mut Context<Self>) {
        self.request_task = Some(cx.spawn(async move |this, cx| {
            let result = reply_task.await;

            let _ = this.update(cx, |this, cx| {
                this.request_task = None;
                this.handle_reply(pending, result, cx);
            });
        }));
    }

    fn handle_reply(
        &mut self,
        pending: PendingReply,
        result: Result<BackendResult<String>, gpui_tokio_bridge::JoinError>,
        cx: &mut Context<Self>,
    ) {
        match result {
            Ok(Ok(reply)) => {
                self.store.update(cx, |store, cx| {
                    self.session.finish_reply(store, pending, reply);
                    cx.notify();
                });
                self.schedule_typing(cx);
            }
            Ok(Err(error)) => self.session.fail_reply(&pending, &error),
            Err(error) => self.session.fail_reply(&pending, &error),
        }

        self.sync_view(cx);
    }

    fn fail_without_backend(&mut self, pending: &PendingReply) {
        let error = self
            .backend_error
            .clone()
            .unwrap_or_else(|| "chat backend is not configured".to_string());
        self.session.fail_reply(pending, &error);
    }

    /// Replaces the typing timer; the previous one is cancelled on drop.
    fn schedule_typing(&mut self, cx: &mut Context<Self>) {
        let interval = self.typing_interval;

        self.typing_task = Some(cx.spawn(async move |this, cx| {
            loop {
                cx.background_executor().timer(interval).await;

                let keep_typing = this
                    .update(cx, |this, cx| this.tick_typing(cx))
                    .unwrap_or(false);
                if !keep_typing {
                    break;
                }
            }
        }));
    }

    fn tick_typing(&mut self, cx: &mut Context<Self>) -> bool {
        let keep_typing = self.store.update(cx, |store, cx| {
            let keep_typing = self.session.tick(store);
            if !keep_typing {
                cx.notify();
            }
            keep_typing
        });

        if !keep_typing {
            tracing::debug!("typing finished");
            self.typing_task = None;
        }
        self.sync_view(cx);
        keep_typing
    }

    fn handle_stop(&mut self, cx: &mut Context<Self>) {
        let stopped = self.store.update(cx, |store, cx| {
            let stopped = self.session.stop_typing(store);
            if stopped {
                cx.notify();
            }
            stopped
        });

        if stopped {
            tracing::debug!("typing stopped");
            self.typing_task = None;
            self.sync_view(cx);
        }
    }

    fn schedule_empty_state_reveal(&mut self, cx: &mut Context<Self>) {
        if self.empty_state_task.is_some() || self.empty_state.is_complete() {
            return;
        }

        let interval = self.empty_state.interval();
        self.empty_state_task = Some(cx.spawn(async move |this, cx| {
            loop {
                cx.background_executor().timer(interval).await;

                let more = this
                    .update(cx, |this, cx| {
                        let more = this.empty_state.tick();
                        if !more {
                            this.empty_state_task = None;
                        }
                        cx.notify();
                        more
                    })
                    .unwrap_or(false);
                if !more {
                    break;
                }
            }
        }));
    }

    /// Pushes displayed rows and activity flags down to the child views.
    fn sync_view(&mut self, cx: &mut Context<Self>) {
        let (rows, thinking, has_active_chat) = {
            let store = self.store.read(cx);
            match store.active_chat() {
                Some(chat) => (
                    message_rows(chat, &self.session),
                    shows_thinking(chat, &self.session),
                    true,
                ),
                None => (Vec::new(), false, false),
            }
        };

        let is_loading = self.session.is_loading();
        let is_typing = self.session.is_typing();
        self.message_list
            .update(cx, |list, cx| list.set_rows(rows, thinking, cx));
        self.message_input
            .update(cx, |input, cx| input.set_activity(is_loading, is_typing, cx));

        self.has_active_chat = has_active_chat;
        if has_active_chat {
            self.empty_state_task = None;
        } else {
            self.schedule_empty_state_reveal(cx);
        }
        cx.notify();
    }

    fn render_empty_state(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-view-empty-state")
            .size_full()
            .items_center()
            .justify_center()
            .child(
                Label::new(SharedString::from(self.empty_state.displayed().to_string()))
                    .text_lg()
                    .text_color(theme.foreground.opacity(0.65)),
            )
            .into_any_element()
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if !self.has_active_chat {
            return self.render_empty_state(cx);
        }

        let theme = cx.theme();

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(
                div()
                    .id("chat-view-message-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.message_input.clone()),
            )
            .into_any_element()
    }
}
