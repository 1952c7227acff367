//! Image OCR through the `tesseract` executable.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{BoxError, TextExtractor};

/// Runs `tesseract stdin stdout -l <language>` with the image on stdin.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

impl TesseractOcr {
    /// English OCR using `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific tesseract executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use another trained language (e.g. "deu").
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl TextExtractor for TesseractOcr {
    fn extract(&self, bytes: &[u8]) -> Result<String, BoxError> {
        debug!(binary = %self.binary.display(), lang = %self.language, "Running OCR");

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.language.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to start '{}': {}", self.binary.display(), e))?;

        // A write error usually means tesseract exited early; reap it and
        // report its exit status before the pipe error.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(bytes),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }
        written?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
