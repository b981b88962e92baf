use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu, ensure};

use super::backend::{BackendResult, PdfUpload, ReadFileSnafu};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UploadError {
    #[snafu(display("{path:?} is declared as '{declared_type}', expected {PDF_CONTENT_TYPE}"))]
    NotPdf {
        stage: &'static str,
        path: PathBuf,
        declared_type: String,
    },
}

/// Content type a file declares through its name, the way a browser file
/// input reports it.
pub fn declared_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Rejects anything that does not declare itself as a PDF. No IO happens here.
pub fn ensure_pdf(path: &Path) -> Result<(), UploadError> {
    let declared_type = declared_content_type(path);
    ensure!(
        declared_type == PDF_CONTENT_TYPE,
        NotPdfSnafu {
            stage: "validate-upload-type",
            path: path.to_path_buf(),
            declared_type,
        }
    );
    Ok(())
}

impl PdfUpload {
    pub fn new(chat_id: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            chat_id: chat_id.into(),
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads an already validated file into an upload payload.
    pub async fn read(chat_id: impl Into<String>, path: &Path) -> BackendResult<Self> {
        let bytes = tokio::fs::read(path).await.context(ReadFileSnafu {
            stage: "read-pdf-upload",
            path: path.to_path_buf(),
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        Ok(Self::new(chat_id, file_name, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BackendError;

    #[test]
    fn pdf_extension_is_accepted_case_insensitively() {
        assert!(ensure_pdf(Path::new("paper.pdf")).is_ok());
        assert!(ensure_pdf(Path::new("/tmp/Paper.PDF")).is_ok());
    }

    #[test]
    fn other_types_are_rejected_with_their_declared_type() {
        let error = ensure_pdf(Path::new("notes.txt")).unwrap_err();
        let UploadError::NotPdf { declared_type, .. } = error;
        assert_eq!(declared_type, "text/plain");

        let error = ensure_pdf(Path::new("no-extension")).unwrap_err();
        let UploadError::NotPdf { declared_type, .. } = error;
        assert_eq!(declared_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn read_keeps_file_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.pdf");
        std::fs::write(&path, b"%PDF-1.7 fake").unwrap();

        let upload = PdfUpload::read("chat-7", &path).await.unwrap();

        assert_eq!(upload.chat_id, "chat-7");
        assert_eq!(upload.file_name, "sample.pdf");
        assert_eq!(upload.bytes, b"%PDF-1.7 fake");
    }

    #[tokio::test]
    async fn read_reports_missing_file() {
        let error = PdfUpload::read("chat-7", Path::new("/definitely/missing/file.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(error, BackendError::ReadFile { .. }));
    }
}
