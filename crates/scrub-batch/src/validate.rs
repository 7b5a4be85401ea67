//! Upload validation

use crate::error::{ProcessingError, Result};
use crate::types::FileReference;
use scrub_extract::DocumentFormat;

/// Check the upload's type and size, returning the format to extract it as.
///
/// The type is checked first, so an empty `.exe` is reported as unsupported.
pub fn validate_upload(reference: &FileReference, size: u64, max_size: u64) -> Result<DocumentFormat> {
    let ext = reference.extension().unwrap_or_default();
    let format = DocumentFormat::from_extension(&ext)
        .ok_or_else(|| ProcessingError::validation(format!("Unsupported file type: {ext}")))?;

    check_size(size, max_size)?;
    Ok(format)
}

/// Reject empty files and files strictly larger than `max_size`
pub fn check_size(size: u64, max_size: u64) -> Result<()> {
    if size == 0 {
        return Err(ProcessingError::validation("File is empty"));
    }
    if size > max_size {
        return Err(ProcessingError::validation(format!(
            "File too large: {size} bytes exceeds max {max_size} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u64 = 50 * 1024 * 1024;

    fn reference(key: &str) -> FileReference {
        FileReference::new("uploads", key)
    }

    #[test]
    fn test_supported_types() {
        assert_eq!(
            validate_upload(&reference("users/u1/a.PDF"), 10, MAX).unwrap(),
            DocumentFormat::PdfDocument
        );
        assert_eq!(
            validate_upload(&reference("notes.md"), 10, MAX).unwrap(),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_unsupported_type_message() {
        let err = validate_upload(&reference("users/u1/tool.exe"), 10, MAX).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: exe");
        assert!(err.should_quarantine());

        let err = validate_upload(&reference("README"), 10, MAX).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: ");
    }

    #[test]
    fn test_size_boundary() {
        assert!(check_size(MAX, MAX).is_ok());
        assert_eq!(
            check_size(MAX + 1, MAX).unwrap_err().to_string(),
            format!("File too large: {} bytes exceeds max {} bytes", MAX + 1, MAX)
        );
        assert_eq!(check_size(0, MAX).unwrap_err().to_string(), "File is empty");
    }
}
