use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use snafu::Snafu;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// JSON body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub chat_id: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            chat_id: chat_id.into(),
        }
    }
}

/// Multipart payload of `POST /api/chat/pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfUpload {
    pub chat_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BackendError {
    #[snafu(display("base url '{base_url}' is invalid on `{stage}`: {source}"))]
    InvalidBaseUrl {
        stage: &'static str,
        base_url: String,
        source: url::ParseError,
    },
    #[snafu(display("failed to build http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to build multipart body on `{stage}`: {source}"))]
    BuildMultipart {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read upload file {path:?} on `{stage}`: {source}"))]
    ReadFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("request to {url} failed on `{stage}`: {source}"))]
    SendRequest {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read response body on `{stage}`: {source}"))]
    ReadBody {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("backend returned status {status} on `{stage}`: {body}"))]
    UnexpectedStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
}

/// Opaque request/response collaborator behind the chat pane.
///
/// Both calls resolve to the assistant's full reply text; animation happens
/// on the client side.
pub trait ChatBackend: Send + Sync {
    fn send_message<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, BackendResult<String>>;
    fn upload_pdf<'a>(&'a self, upload: PdfUpload) -> BoxFuture<'a, BackendResult<String>>;
}
