// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) backend for rectified receipts.
//
// Uses the `ocrs` crate, a pure-Rust OCR engine backed by neural network
// models executed via `rten`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// belegscan-document = { path = "crates/belegscan-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`): locates text regions.
// - **Recognition model** (`text-recognition.rten`): decodes characters.
//
// Running `ocrs-cli` once downloads both into `~/.cache/ocrs/`.

use std::path::{Path, PathBuf};

use belegscan_core::config::PageSegmentation;
use belegscan_core::error::BelegscanError;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, OcrInput};
use rten::Model;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::scan::recognizer::TextRecognizer;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Configuration for constructing an [`OcrEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
    /// How recognised lines are assembled into the transcription.
    pub page_segmentation: PageSegmentation,
}

impl Default for OcrConfig {
    /// Points at the default model cache directory.
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            page_segmentation: PageSegmentation::default(),
        }
    }

    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
            page_segmentation: PageSegmentation::default(),
        }
    }

    pub fn with_page_segmentation(mut self, mode: PageSegmentation) -> Self {
        self.page_segmentation = mode;
        self
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<(), BelegscanError> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(BelegscanError::OcrError(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Text-recognition engine for rectified receipts.
///
/// Model loading is the expensive step: build the engine once and reuse it
/// for every receipt in a batch.
pub struct OcrEngine {
    engine: OcrsEngine,
    page_segmentation: PageSegmentation,
}

impl OcrEngine {
    /// Load the detection and recognition models named in `config`.
    ///
    /// The `ocrs` and `rten` crates must be compiled in release mode; debug
    /// builds are 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
        mode = %config.page_segmentation,
    ))]
    pub fn new(config: OcrConfig) -> Result<Self, BelegscanError> {
        config.validate()?;

        info!("Loading OCR models");
        let detection_model = load_model(&config.detection_model_path)?;
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            BelegscanError::OcrError(format!("failed to initialise OCR engine: {}", err))
        })?;

        Ok(Self {
            engine,
            page_segmentation: config.page_segmentation,
        })
    }

    pub fn page_segmentation(&self) -> PageSegmentation {
        self.page_segmentation
    }

    /// Full transcription in reading order, lines separated by `\n`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_block(&self, image: &DynamicImage) -> Result<String, BelegscanError> {
        let input = self.prepare(image)?;
        let text = self.engine.get_text(&input).map_err(|err| {
            BelegscanError::OcrError(format!("OCR text recognition failed: {}", err))
        })?;
        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }

    /// Recognised lines, empty ones dropped.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>, BelegscanError> {
        let input = self.prepare(image)?;

        let word_rects = self.engine.detect_words(&input).map_err(|err| {
            BelegscanError::OcrError(format!("word detection failed: {}", err))
        })?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| {
                BelegscanError::OcrError(format!("line recognition failed: {}", err))
            })?;

        let lines: Vec<String> = line_texts
            .iter()
            .flatten()
            .map(|line| line.to_string())
            .filter(|text| !text.trim().is_empty())
            .collect();
        debug!(words = word_rects.len(), lines = lines.len(), "Lines recognised");
        Ok(lines)
    }

    fn prepare(&self, image: &DynamicImage) -> Result<OcrInput, BelegscanError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            BelegscanError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        self.engine.prepare_input(source).map_err(|err| {
            BelegscanError::OcrError(format!("OCR preprocessing failed: {}", err))
        })
    }
}

impl TextRecognizer for OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, BelegscanError> {
        match self.page_segmentation {
            PageSegmentation::SingleLine => Ok(self.recognize_lines(image)?.join(" ")),
            PageSegmentation::Auto
            | PageSegmentation::SingleColumn
            | PageSegmentation::SingleBlock => self.recognize_block(image),
        }
    }
}

fn load_model(path: &Path) -> Result<Model, BelegscanError> {
    Model::load_file(path).map_err(|err| {
        BelegscanError::OcrError(format!(
            "failed to load model from {}: {}",
            path.display(),
            err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_to_model_files() {
        let config = OcrConfig::default();
        assert!(config
            .detection_model_path
            .to_string_lossy()
            .ends_with(DETECTION_MODEL_FILENAME));
        assert!(config
            .recognition_model_path
            .to_string_lossy()
            .ends_with(RECOGNITION_MODEL_FILENAME));
        assert_eq!(config.page_segmentation, PageSegmentation::SingleBlock);
    }

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn page_segmentation_override() {
        let config = OcrConfig::from_paths("/a/detect.rten", "/b/recog.rten")
            .with_page_segmentation(PageSegmentation::SingleLine);
        assert_eq!(config.page_segmentation, PageSegmentation::SingleLine);
        assert_eq!(config.detection_model_path, PathBuf::from("/a/detect.rten"));
    }

    #[test]
    fn missing_models_fail_validation() {
        let result = OcrEngine::new(OcrConfig::from_dir("/nonexistent/path/ocr-models"));
        assert!(matches!(result, Err(BelegscanError::OcrError(_))));
    }
}
