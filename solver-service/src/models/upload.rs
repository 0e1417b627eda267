use axum::body::Bytes;

/// A file received in the `file` part of an upload, held in memory for the
/// lifetime of one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Client-supplied name, unsanitized.
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedDocument {
    /// Uploads are accepted by name only; the suffix check is case-sensitive.
    pub fn has_pdf_name(file_name: &str) -> bool {
        file_name.ends_with(".pdf")
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_suffix_check_is_case_sensitive() {
        assert!(UploadedDocument::has_pdf_name("quiz.pdf"));
        assert!(UploadedDocument::has_pdf_name("a.b.pdf"));
        assert!(!UploadedDocument::has_pdf_name("quiz.PDF"));
        assert!(!UploadedDocument::has_pdf_name("quiz.pdf.exe"));
        assert!(!UploadedDocument::has_pdf_name("quiz.txt"));
    }
}
