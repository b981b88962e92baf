use std::sync::Arc;

mod backend;
mod http;
mod upload;

pub use backend::{
    BackendConfig, BackendError, BackendResult, BoxFuture, ChatBackend, ChatRequest,
    DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, PdfUpload,
};
pub use http::{CHAT_ENDPOINT_PATH, HttpBackend, PDF_ENDPOINT_PATH};
pub use upload::{PDF_CONTENT_TYPE, UploadError, declared_content_type, ensure_pdf};

pub fn create_backend(config: BackendConfig) -> BackendResult<Arc<dyn ChatBackend>> {
    Ok(Arc::new(HttpBackend::new(config)?))
}
