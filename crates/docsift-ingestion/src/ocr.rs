//! Optical character recognition capability.

use async_trait::async_trait;
use docsift_core::OcrConfig;
use image::ImageFormat;
use std::io::Cursor;
use std::process::Stdio;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// OCR failures
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Failed to run recognizer: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Recognizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Turns image bytes into text
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in an encoded image
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;

    /// Recognizer name
    fn name(&self) -> &'static str;
}

/// Decode an image and re-encode it as PNG.
pub fn normalize_image(bytes: &[u8]) -> Result<Vec<u8>, OcrError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| OcrError::InvalidImage(e.to_string()))?;

    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

    Ok(png)
}

/// Recognizer backed by the `tesseract` executable
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_path.clone(),
            language: config.language.clone(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let png = tokio::task::spawn_blocking({
            let bytes = image.to_vec();
            move || normalize_image(&bytes)
        })
        .await
        .map_err(|e| OcrError::InvalidImage(e.to_string()))??;

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.language.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = feed_stdin(&mut stdin, &png).await {
                    warn!(error = %e, bytes = png.len(), "Failed to write image to recognizer");
                }
            });
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            language = %self.language,
            chars = text.chars().count(),
            "Tesseract recognized text"
        );
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

/// Write the whole image, then close the pipe so the recognizer sees EOF.
async fn feed_stdin<W: AsyncWrite + Unpin>(stdin: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    stdin.write_all(bytes).await?;
    stdin.shutdown().await
}
