//! File content extraction.
//!
//! Attachments are turned into plain text before they are appended to a
//! prompt. Dispatch is purely by file extension (case-insensitive) through an
//! [`ExtractorRegistry`]; unknown extensions fail closed with
//! [`LlmError::UnsupportedFileType`] before the file is opened.
//!
//! | extension | extractor |
//! |-----------|-----------|
//! | `.txt` | [`PlainTextExtractor`] |
//! | `.csv` | [`CsvExtractor`] (records re-encoded as pretty JSON) |
//! | `.docx` | [`DocxExtractor`] |
//! | `.pdf` | [`PdfExtractor`] |
//! | `.png` `.jpg` `.jpeg` `.bmp` | [`TesseractOcr`] (English) |
//!
//! Each file is read once, fully, into memory. There is no size limit.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{LlmError, Result};

pub mod csv;
pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod text;

pub use self::csv::CsvExtractor;
pub use self::docx::DocxExtractor;
pub use self::ocr::TesseractOcr;
pub use self::pdf::PdfExtractor;
pub use self::text::PlainTextExtractor;

/// Error type returned by extraction collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Extensions routed to the OCR collaborator.
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".bmp"];

/// Turns the raw bytes of one file format into text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> std::result::Result<String, BoxError>;
}

/// Text pulled out of an attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Base name of the file, used in the attribution line.
    pub file_name: String,
    /// Normalized extension, e.g. ".pdf".
    pub extension: String,
    pub text: String,
}

impl ExtractedFile {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let extension = extension_of(Path::new(&file_name));
        Self {
            file_name,
            extension,
            text: text.into(),
        }
    }
}

/// Maps normalized extensions to extractors.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    /// Registry with every built-in extractor.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(".txt", Arc::new(PlainTextExtractor));
        registry.register(".csv", Arc::new(CsvExtractor));
        registry.register(".docx", Arc::new(DocxExtractor));
        registry.register(".pdf", Arc::new(PdfExtractor));
        registry.register_images(Arc::new(TesseractOcr::default()));
        registry
    }

    /// Registry that supports nothing until extractors are registered.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register (or replace) the extractor for an extension.
    ///
    /// `"PDF"`, `".pdf"` and `".Pdf"` all name the same entry.
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) {
        self.extractors
            .insert(normalize_extension(extension), extractor);
    }

    /// Register one extractor for every image extension.
    pub fn register_images(&mut self, extractor: Arc<dyn TextExtractor>) {
        for ext in IMAGE_EXTENSIONS {
            self.register(ext, extractor.clone());
        }
    }

    /// Whether an extension has an extractor.
    pub fn supports(&self, extension: &str) -> bool {
        self.extractors
            .contains_key(&normalize_extension(extension))
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.extractors.keys().cloned().collect();
        exts.sort();
        exts
    }

    /// Read `path` fully and extract its text.
    ///
    /// The extension is checked first, so unsupported files are never opened.
    pub fn extract(&self, path: &Path) -> Result<ExtractedFile> {
        let extension = extension_of(path);
        let extractor = self
            .extractors
            .get(&extension)
            .ok_or_else(|| LlmError::UnsupportedFileType(extension.clone()))?;

        // The handle is closed before extraction starts, on success or failure.
        let bytes = std::fs::read(path).map_err(|source| LlmError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            path = %path.display(),
            extension = %extension,
            bytes = bytes.len(),
            "Extracting file content"
        );

        let text = extractor
            .extract(&bytes)
            .map_err(|e| LlmError::extraction(&extension, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ExtractedFile {
            file_name,
            extension,
            text,
        })
    }
}

/// Lowercased extension with a leading dot; empty when the path has none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| normalize_extension(&e.to_string_lossy()))
        .unwrap_or_default()
}

fn normalize_extension(extension: &str) -> String {
    let ext = extension.trim().trim_start_matches('.').to_lowercase();
    if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct Upper;

    impl TextExtractor for Upper {
        fn extract(&self, bytes: &[u8]) -> std::result::Result<String, BoxError> {
            Ok(String::from_utf8_lossy(bytes).to_uppercase())
        }
    }

    struct Failing;

    impl TextExtractor for Failing {
        fn extract(&self, _bytes: &[u8]) -> std::result::Result<String, BoxError> {
            Err("corrupt header".into())
        }
    }

    fn write_temp(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("report.PDF")), ".pdf");
        assert_eq!(extension_of(Path::new("/a/b/photo.JpEg")), ".jpeg");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Path::new("Makefile")), "");
    }

    #[test]
    fn test_builtin_extensions() {
        let registry = ExtractorRegistry::new();
        assert_eq!(
            registry.extensions(),
            vec![".bmp", ".csv", ".docx", ".jpeg", ".jpg", ".pdf", ".png", ".txt"]
        );
        assert!(registry.supports("TXT"));
        assert!(registry.supports(".Docx"));
        assert!(!registry.supports(".xyz"));
    }

    #[test]
    fn test_unsupported_extension_names_it() {
        let registry = ExtractorRegistry::new();
        // the file does not exist: the extension check must fail first
        let err = registry.extract(Path::new("/no/such/dir/data.xyz")).unwrap_err();
        match err {
            LlmError::UnsupportedFileType(ext) => assert_eq!(ext, ".xyz"),
            other => panic!("Expected UnsupportedFileType, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_extension_is_unsupported() {
        let registry = ExtractorRegistry::new();
        let err = registry.extract(Path::new("README")).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedFileType(ref e) if e.is_empty()));
    }

    #[test]
    fn test_missing_file_is_file_read_error() {
        let registry = ExtractorRegistry::new();
        let err = registry
            .extract(Path::new("/definitely/not/here/notes.txt"))
            .unwrap_err();
        assert!(matches!(err, LlmError::FileRead { .. }));
    }

    #[test]
    fn test_extract_txt_uppercase_extension() {
        let file = write_temp(".TXT", b"plain words here");
        let extracted = ExtractorRegistry::new().extract(file.path()).unwrap();
        assert_eq!(extracted.text, "plain words here");
        assert_eq!(extracted.extension, ".txt");
        assert!(extracted.file_name.ends_with(".TXT"));
    }

    #[test]
    fn test_custom_extractor_registration() {
        let mut registry = ExtractorRegistry::empty();
        registry.register("md", Arc::new(Upper));
        let file = write_temp(".md", b"# title");
        let extracted = registry.extract(file.path()).unwrap();
        assert_eq!(extracted.text, "# TITLE");
    }

    #[test]
    fn test_replace_image_extractor() {
        let mut registry = ExtractorRegistry::new();
        registry.register_images(Arc::new(Upper));
        let file = write_temp(".png", b"pixels");
        assert_eq!(registry.extract(file.path()).unwrap().text, "PIXELS");
    }

    #[test]
    fn test_collaborator_failure_is_extraction_failed() {
        let mut registry = ExtractorRegistry::empty();
        registry.register(".bin", Arc::new(Failing));
        let file = write_temp(".bin", b"\x00\x01");
        match registry.extract(file.path()).unwrap_err() {
            LlmError::ExtractionFailed { extension, reason } => {
                assert_eq!(extension, ".bin");
                assert_eq!(reason, "corrupt header");
            }
            other => panic!("Expected ExtractionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_extracted_file_new() {
        let file = ExtractedFile::new("Notes.CSV", "a,b");
        assert_eq!(file.extension, ".csv");
        assert_eq!(file.file_name, "Notes.CSV");
    }
}
