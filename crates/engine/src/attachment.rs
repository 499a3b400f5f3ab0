//! Images and invoices attached to a vehicle.

use std::path::{Path, PathBuf};

use crate::{EngineError, ResultEngine, gateway::BlobKind};

/// Where an attachment reference points to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentTarget {
    /// Served by the backend; the caller opens it.
    Remote(String),
    /// A file on this machine that exists.
    Local(PathBuf),
}

/// Resolve a stored reference so it can be opened.
///
/// A failure here never affects the vehicle record itself.
pub fn resolve(kind: BlobKind, reference: Option<&str>) -> ResultEngine<AttachmentTarget> {
    let reference = reference
        .map(str::trim)
        .filter(|reference| !reference.is_empty())
        .ok_or_else(|| EngineError::Attachment(format!("no {} attached", kind.label())))?;

    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Ok(AttachmentTarget::Remote(reference.to_string()));
    }

    let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
    if !path.is_file() {
        return Err(EngineError::Attachment(format!(
            "{} file not found: {}",
            kind.label(),
            path.display()
        )));
    }
    Ok(AttachmentTarget::Local(path.to_path_buf()))
}

/// Largest invoice accepted for upload.
pub const MAX_INVOICE_BYTES: u64 = 10 * 1024 * 1024;

/// Read a local file that is about to be uploaded.
///
/// Invoices must be `.pdf` files of at most [`MAX_INVOICE_BYTES`].
pub async fn read_upload(kind: BlobKind, path: &Path) -> ResultEngine<Vec<u8>> {
    let unreadable = |err: std::io::Error| {
        EngineError::Attachment(format!(
            "cannot read {} {}: {err}",
            kind.label(),
            path.display()
        ))
    };

    if kind == BlobKind::Invoice {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(EngineError::Attachment(
                "Please select a PDF file".to_string(),
            ));
        }
        let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
        if size > MAX_INVOICE_BYTES {
            return Err(EngineError::Attachment(
                "Please select a PDF smaller than 10MB".to_string(),
            ));
        }
    }

    let bytes = tokio::fs::read(path).await.map_err(unreadable)?;
    if bytes.is_empty() {
        return Err(EngineError::Attachment(format!(
            "{} {} is empty",
            kind.label(),
            path.display()
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn missing_reference_reports_nothing_attached() {
        let err = resolve(BlobKind::Invoice, None).unwrap_err();
        assert_eq!(err, EngineError::Attachment("no invoice attached".to_string()));
        assert!(resolve(BlobKind::Image, Some("  ")).is_err());
    }

    #[test]
    fn urls_are_handed_back() {
        let url = "https://example.test/storage/v1/object/public/invoices/a.pdf";
        assert_eq!(
            resolve(BlobKind::Invoice, Some(url)).unwrap(),
            AttachmentTarget::Remote(url.to_string())
        );
    }

    #[test]
    fn local_paths_must_exist() {
        let missing = std::env::temp_dir().join(format!("lotbook_{}.pdf", Uuid::new_v4()));
        let err = resolve(BlobKind::Invoice, missing.to_str()).unwrap_err();
        assert!(matches!(err, EngineError::Attachment(_)));

        std::fs::write(&missing, b"%PDF-1.4").unwrap();
        assert_eq!(
            resolve(BlobKind::Invoice, missing.to_str()).unwrap(),
            AttachmentTarget::Local(missing.clone())
        );
        let _ = std::fs::remove_file(missing);
    }

    #[tokio::test]
    async fn empty_uploads_are_rejected() {
        let path = std::env::temp_dir().join(format!("lotbook_{}.jpg", Uuid::new_v4()));
        std::fs::write(&path, b"").unwrap();
        assert!(read_upload(BlobKind::Image, &path).await.is_err());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn invoices_must_be_pdf_files() {
        let path = std::env::temp_dir().join(format!("lotbook_{}_notes.txt", Uuid::new_v4()));
        std::fs::write(&path, b"not an invoice").unwrap();
        let err = read_upload(BlobKind::Invoice, &path).await.unwrap_err();
        assert_eq!(err.alert(), "Please select a PDF file");
        assert!(read_upload(BlobKind::Image, &path).await.is_ok());
        let _ = std::fs::remove_file(path);

        let upper = std::env::temp_dir().join(format!("lotbook_{}.PDF", Uuid::new_v4()));
        std::fs::write(&upper, b"%PDF-1.4").unwrap();
        assert_eq!(read_upload(BlobKind::Invoice, &upper).await.unwrap(), b"%PDF-1.4");
        let _ = std::fs::remove_file(upper);
    }

    #[tokio::test]
    async fn invoices_over_ten_megabytes_are_rejected() {
        let path = std::env::temp_dir().join(format!("lotbook_{}.pdf", Uuid::new_v4()));
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_INVOICE_BYTES + 1).unwrap();
        let err = read_upload(BlobKind::Invoice, &path).await.unwrap_err();
        assert_eq!(err.alert(), "Please select a PDF smaller than 10MB");

        file.set_len(MAX_INVOICE_BYTES).unwrap();
        assert!(read_upload(BlobKind::Invoice, &path).await.is_ok());
        drop(file);
        let _ = std::fs::remove_file(path);
    }
}
