//! Attachment intake
//!
//! Client-side checks applied to a selected file before anything is sent:
//! at most 5 MB, and either an image or a PDF.

use crate::mime::detect_mime;
use crate::models::{Attachment, AttachmentKind, AttachmentPayload};
use crate::{Error, Result};
use std::path::Path;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

pub const TOO_LARGE_MESSAGE: &str = "File is too large. Max size is 5MB.";
pub const INVALID_TYPE_MESSAGE: &str =
    "Invalid file type. Only images (PNG, JPEG) and PDFs are supported.";

/// A file picked by the user, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Load a file from disk, detecting its MIME type from content.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Rejected(format!("Invalid file path: {}", path.display())))?
            .to_string();
        let mime = detect_mime(&bytes, &name).unwrap_or("application/octet-stream");

        Ok(Self::new(name, mime, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Check size and type; returns the attachment kind on acceptance.
    pub fn validate(&self) -> Result<AttachmentKind> {
        if self.size() > MAX_FILE_SIZE {
            return Err(Error::Rejected(TOO_LARGE_MESSAGE.to_string()));
        }

        if self.mime.starts_with("image/") {
            Ok(AttachmentKind::Image)
        } else if self.mime == "application/pdf" {
            Ok(AttachmentKind::Pdf)
        } else {
            Err(Error::Rejected(INVALID_TYPE_MESSAGE.to_string()))
        }
    }

    /// Hold the raw file for inclusion in the next query.
    pub fn into_raw_attachment(self, kind: AttachmentKind) -> Attachment {
        Attachment {
            name: self.name,
            kind,
            payload: AttachmentPayload::File {
                bytes: self.bytes,
                mime: self.mime,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_accepts_image_and_pdf() {
        let png = SelectedFile::new("scan.png", "image/png", vec![0; 10]);
        assert_eq!(png.validate().unwrap(), AttachmentKind::Image);

        let pdf = SelectedFile::new("notes.pdf", "application/pdf", vec![0; 10]);
        assert_eq!(pdf.validate().unwrap(), AttachmentKind::Pdf);
    }

    #[test]
    fn test_rejects_oversized_file() {
        let file = SelectedFile::new("big.pdf", "application/pdf", vec![0; MAX_FILE_SIZE + 1]);
        let err = file.validate().unwrap_err();
        assert!(matches!(err, Error::Rejected(_)));
        assert_eq!(err.to_string(), TOO_LARGE_MESSAGE);
    }

    #[test]
    fn test_accepts_file_at_exact_limit() {
        let file = SelectedFile::new("edge.png", "image/png", vec![0; MAX_FILE_SIZE]);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_rejects_other_document_types() {
        let docx = SelectedFile::new(
            "notes.docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            vec![0; 10],
        );
        assert_eq!(docx.validate().unwrap_err().to_string(), INVALID_TYPE_MESSAGE);

        let text = SelectedFile::new("notes.txt", "text/plain", vec![0; 10]);
        assert!(text.validate().is_err());
    }

    #[test]
    fn test_into_raw_attachment_keeps_bytes() {
        let file = SelectedFile::new("scan.jpg", "image/jpeg", vec![1, 2, 3]);
        let attachment = file.into_raw_attachment(AttachmentKind::Image);
        assert_eq!(attachment.name, "scan.jpg");
        assert_eq!(
            attachment.payload,
            AttachmentPayload::File {
                bytes: vec![1, 2, 3],
                mime: "image/jpeg".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_from_path_detects_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discharge.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.5\n...").unwrap();

        let selected = SelectedFile::from_path(&path).await.unwrap();
        assert_eq!(selected.name, "discharge.pdf");
        assert_eq!(selected.mime, "application/pdf");
        assert_eq!(selected.validate().unwrap(), AttachmentKind::Pdf);
    }

    #[tokio::test]
    async fn test_from_path_plain_text_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"Take aspirin daily").unwrap();

        let selected = SelectedFile::from_path(&path).await.unwrap();
        assert_eq!(selected.mime, "application/octet-stream");
        assert_eq!(selected.validate().unwrap_err().to_string(), INVALID_TYPE_MESSAGE);
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SelectedFile::from_path(&dir.path().join("nope.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
