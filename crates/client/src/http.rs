use reqwest::multipart::{Form, Part};
use snafu::ResultExt;
use url::Url;

use super::backend::{
    BackendConfig, BackendResult, BoxFuture, BuildClientSnafu, BuildMultipartSnafu, ChatBackend,
    ChatRequest, InvalidBaseUrlSnafu, PdfUpload, ReadBodySnafu, SendRequestSnafu,
    UnexpectedStatusSnafu,
};
use super::upload::PDF_CONTENT_TYPE;

pub const CHAT_ENDPOINT_PATH: &str = "api/chat";
pub const PDF_ENDPOINT_PATH: &str = "api/chat/pdf";

/// `ChatBackend` over plain HTTP: JSON for text, multipart for PDFs.
pub struct HttpBackend {
    http: reqwest::Client,
    chat_url: Url,
    pdf_url: Url,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        let chat_url = endpoint_url(&config.base_url, CHAT_ENDPOINT_PATH)?;
        let pdf_url = endpoint_url(&config.base_url, PDF_ENDPOINT_PATH)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context(BuildClientSnafu {
                stage: "build-client",
            })?;

        Ok(Self {
            http,
            chat_url,
            pdf_url,
        })
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    pub fn pdf_url(&self) -> &Url {
        &self.pdf_url
    }

    async fn post_message(&self, request: ChatRequest) -> BackendResult<String> {
        tracing::debug!(
            chat_id = %request.chat_id,
            url = %self.chat_url,
            message_len = request.message.len(),
            "posting chat message"
        );

        let response = self
            .http
            .post(self.chat_url.clone())
            .json(&request)
            .send()
            .await
            .context(SendRequestSnafu {
                stage: "send-chat-request",
                url: self.chat_url.to_string(),
            })?;

        read_reply(response, "read-chat-reply").await
    }

    async fn post_pdf(&self, upload: PdfUpload) -> BackendResult<String> {
        tracing::debug!(
            chat_id = %upload.chat_id,
            url = %self.pdf_url,
            file_name = %upload.file_name,
            byte_len = upload.bytes.len(),
            "posting pdf upload"
        );

        let file_part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(PDF_CONTENT_TYPE)
            .context(BuildMultipartSnafu {
                stage: "build-pdf-part",
            })?;
        let form = Form::new()
            .part("file", file_part)
            .text("chatId", upload.chat_id);

        let response = self
            .http
            .post(self.pdf_url.clone())
            .multipart(form)
            .send()
            .await
            .context(SendRequestSnafu {
                stage: "send-pdf-request",
                url: self.pdf_url.to_string(),
            })?;

        read_reply(response, "read-pdf-reply").await
    }
}

impl ChatBackend for HttpBackend {
    fn send_message<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, BackendResult<String>> {
        Box::pin(self.post_message(request))
    }

    fn upload_pdf<'a>(&'a self, upload: PdfUpload) -> BoxFuture<'a, BackendResult<String>> {
        Box::pin(self.post_pdf(upload))
    }
}

/// Joins an endpoint path onto the base url without dropping a base path prefix.
fn endpoint_url(base_url: &str, path: &str) -> BackendResult<Url> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    Url::parse(&normalized)
        .and_then(|base| base.join(path))
        .context(InvalidBaseUrlSnafu {
            stage: "build-endpoint-url",
            base_url: base_url.to_string(),
        })
}

/// Reads the body as raw text; any non-2xx status is an error.
async fn read_reply(response: reqwest::Response, stage: &'static str) -> BackendResult<String> {
    let status = response.status();
    let body = response.text().await.context(ReadBodySnafu { stage })?;

    if !status.is_success() {
        return UnexpectedStatusSnafu {
            stage,
            status: status.as_u16(),
            body,
        }
        .fail();
    }

    tracing::debug!(stage, byte_len = body.len(), "received backend reply");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::extract::{Json, Multipart};
    use axum::http::StatusCode;
    use axum::routing::post;

    use super::*;
    use crate::BackendError;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{address}")
    }

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(BackendConfig::new(base_url).with_request_timeout(Duration::from_secs(5)))
            .unwrap()
    }

    #[test]
    fn endpoint_urls_keep_base_path_prefix() {
        let plain = backend("http://localhost:8080");
        assert_eq!(plain.chat_url().as_str(), "http://localhost:8080/api/chat");
        assert_eq!(plain.pdf_url().as_str(), "http://localhost:8080/api/chat/pdf");

        let prefixed = backend("http://localhost:8080/bot/");
        assert_eq!(prefixed.chat_url().as_str(), "http://localhost:8080/bot/api/chat");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let error = HttpBackend::new(BackendConfig::new("not a url")).err().unwrap();
        assert!(matches!(error, BackendError::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn send_message_posts_json_and_returns_raw_body() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<serde_json::Value>| async move {
                format!(
                    "{}|{}",
                    body["message"].as_str().unwrap_or_default(),
                    body["chatId"].as_str().unwrap_or_default()
                )
            }),
        );
        let base_url = serve(router).await;

        let reply = backend(&base_url)
            .send_message(ChatRequest::new("What is this paper about?", "chat-42"))
            .await
            .unwrap();

        assert_eq!(reply, "What is this paper about?|chat-42");
    }

    #[tokio::test]
    async fn json_looking_reply_is_kept_as_text() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { r#"{"answer":"not parsed"}"# }),
        );
        let base_url = serve(router).await;

        let reply = backend(&base_url)
            .send_message(ChatRequest::new("hi", "chat-1"))
            .await
            .unwrap();

        assert_eq!(reply, r#"{"answer":"not parsed"}"#);
    }

    #[tokio::test]
    async fn upload_pdf_sends_file_and_chat_id_parts() {
        let router = Router::new().route(
            "/api/chat/pdf",
            post(|mut multipart: Multipart| async move {
                let mut parts = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let text = field.text().await.unwrap();
                    parts.push(format!("{name}:{file_name}:{content_type}:{text}"));
                }
                parts.join(";")
            }),
        );
        let base_url = serve(router).await;

        let reply = backend(&base_url)
            .upload_pdf(PdfUpload::new("chat-9", "paper.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();

        assert_eq!(reply, "file:paper.pdf:application/pdf:%PDF;chatId:::chat-9");
    }

    #[tokio::test]
    async fn empty_pdf_reply_is_returned_as_empty_string() {
        let router = Router::new().route("/api/chat/pdf", post(|| async { "" }));
        let base_url = serve(router).await;

        let reply = backend(&base_url)
            .upload_pdf(PdfUpload::new("chat-9", "paper.pdf", Vec::new()))
            .await
            .unwrap();

        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model offline") }),
        );
        let base_url = serve(router).await;

        let error = backend(&base_url)
            .send_message(ChatRequest::new("hi", "chat-1"))
            .await
            .unwrap_err();

        match error {
            BackendError::UnexpectedStatus { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model offline");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_send_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let error = backend(&format!("http://{address}"))
            .send_message(ChatRequest::new("hi", "chat-1"))
            .await
            .unwrap_err();

        assert!(matches!(error, BackendError::SendRequest { .. }));
    }
}
