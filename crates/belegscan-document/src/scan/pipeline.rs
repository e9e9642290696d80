// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Receipt scan orchestration: rectify each input, hand the flattened receipt
// to a text recognizer, and record per-file outcomes for batch runs.

use std::path::{Path, PathBuf};

use belegscan_core::config::ScannerConfig;
use belegscan_core::error::BelegscanError;
use belegscan_core::types::{ExtractionFailure, ReceiptQuad, is_supported_extension};
use image::DynamicImage;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::image::processor::{ImageProcessor, encode_for_llm};
use crate::scan::recognizer::TextRecognizer;
use crate::scan::rectify::Rectifier;

/// Text and geometry recovered from one receipt photo.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Plain-text transcription of the rectified receipt.
    pub text: String,
    /// Detected outline in raw image coordinates.
    pub quad: ReceiptQuad,
    pub scale_ratio: f64,
    pub rectified_width: u32,
    pub rectified_height: u32,
}

/// Outcome of one file in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScanOutcome {
    Scanned {
        input_file: PathBuf,
        result: ScanResult,
    },
    Failed(ExtractionFailure),
}

impl ScanOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Scanned { .. })
    }
}

/// Orchestrates: decode → rectify → recognize.
pub struct ReceiptScanner<R: TextRecognizer> {
    rectifier: Rectifier,
    recognizer: R,
    llm_max_image_side: u32,
}

impl<R: TextRecognizer> ReceiptScanner<R> {
    /// Scanner with the default rectifier settings.
    pub fn new(recognizer: R) -> Self {
        Self {
            rectifier: Rectifier::default(),
            recognizer,
            llm_max_image_side: ScannerConfig::default().llm_max_image_side,
        }
    }

    /// Scanner with explicit settings, validated up front.
    pub fn with_config(config: &ScannerConfig, recognizer: R) -> Result<Self, BelegscanError> {
        config.validate()?;
        Ok(Self {
            rectifier: Rectifier::new(config.rectifier.clone())?,
            recognizer,
            llm_max_image_side: config.llm_max_image_side,
        })
    }

    pub fn rectifier(&self) -> &Rectifier {
        &self.rectifier
    }

    /// Rectify an already-decoded image and transcribe it.
    #[instrument(skip_all, fields(width = raw.width(), height = raw.height()))]
    pub fn scan_image(&self, raw: &DynamicImage) -> Result<ScanResult, BelegscanError> {
        let rectified = self.rectifier.rectify(raw)?;
        let text = self.recognizer.recognize(&rectified.image)?;
        info!(chars = text.len(), "Receipt transcribed");
        Ok(ScanResult {
            text,
            quad: rectified.quad,
            scale_ratio: rectified.scale_ratio,
            rectified_width: rectified.image.width(),
            rectified_height: rectified.image.height(),
        })
    }

    /// Decode encoded image bytes, then scan.
    pub fn scan_bytes(&self, data: &[u8]) -> Result<ScanResult, BelegscanError> {
        let raw = ImageProcessor::from_bytes(data)?;
        self.scan_image(raw.as_dynamic())
    }

    /// Read and decode a file, then scan.
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult, BelegscanError> {
        let raw = ImageProcessor::open(path)?;
        self.scan_image(raw.as_dynamic())
    }

    /// Scan each path in order. A failing file is recorded and the batch
    /// continues with the next one.
    #[instrument(skip_all, fields(count = paths.len()))]
    pub fn scan_paths(&self, paths: &[PathBuf]) -> Vec<ScanOutcome> {
        paths
            .iter()
            .map(|path| match self.scan_file(path) {
                Ok(result) => {
                    info!(path = %path.display(), "Scanned");
                    ScanOutcome::Scanned {
                        input_file: path.clone(),
                        result,
                    }
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Scan failed");
                    ScanOutcome::Failed(ExtractionFailure::new(
                        err.to_string(),
                        path.display().to_string(),
                    ))
                }
            })
            .collect()
    }

    /// Load an image file and encode it for a multimodal model request,
    /// bounded by the configured longest side.
    pub fn llm_payload(&self, path: &Path) -> Result<String, BelegscanError> {
        let raw = ImageProcessor::open(path)?;
        encode_for_llm(raw.as_dynamic(), self.llm_max_image_side)
    }
}

/// Regular files in `dir` with a supported raster extension, sorted by path.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>, BelegscanError> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(is_supported_extension);
        if path.is_file() && supported {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    /// Reports the size of the image it was handed.
    struct DimensionRecognizer;

    impl TextRecognizer for DimensionRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<String, BelegscanError> {
            Ok(format!("{}x{}", image.width(), image.height()))
        }
    }

    struct BrokenRecognizer;

    impl TextRecognizer for BrokenRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, BelegscanError> {
            Err(BelegscanError::OcrError("engine unavailable".into()))
        }
    }

    fn receipt_photo() -> DynamicImage {
        let mut img = RgbImage::from_pixel(480, 360, Rgb([35, 35, 35]));
        draw_polygon_mut(
            &mut img,
            &[
                Point::new(120, 40),
                Point::new(330, 55),
                Point::new(320, 320),
                Point::new(110, 310),
            ],
            Rgb([240, 240, 240]),
        );
        DynamicImage::ImageRgb8(img)
    }

    fn write_png(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
        let path = dir.join(name);
        image.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn recognizer_sees_rectified_image() {
        let scanner = ReceiptScanner::new(DimensionRecognizer);
        let result = scanner.scan_image(&receipt_photo()).unwrap();

        assert_eq!(
            result.text,
            format!("{}x{}", result.rectified_width, result.rectified_height)
        );
        assert!(result.rectified_width < 480 && result.rectified_height < 360);
    }

    #[test]
    fn recognizer_errors_propagate() {
        let scanner = ReceiptScanner::new(BrokenRecognizer);
        let result = scanner.scan_image(&receipt_photo());
        assert!(matches!(result, Err(BelegscanError::OcrError(_))));
    }

    #[test]
    fn invalid_bytes_never_reach_recognizer() {
        let scanner = ReceiptScanner::new(BrokenRecognizer);
        let result = scanner.scan_bytes(b"garbage");
        assert!(matches!(result, Err(BelegscanError::InvalidImage(_))));
    }

    #[test]
    fn with_config_rejects_invalid_settings() {
        let mut config = ScannerConfig::default();
        config.rectifier.working_width = 0;
        assert!(ReceiptScanner::with_config(&config, DimensionRecognizer).is_err());
    }

    #[test]
    fn collect_inputs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let tiny = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([9u8])));
        write_png(dir.path(), "b.png", &tiny);
        write_png(dir.path(), "a.PNG", &tiny);
        std::fs::write(dir.path().join("notes.txt"), "not a receipt").unwrap();
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let inputs = collect_inputs(dir.path()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.png"]);
    }

    #[test]
    fn batch_records_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 150, Luma([128u8])));
        let failing = write_png(dir.path(), "a_blank.png", &blank);
        let good = write_png(dir.path(), "b_receipt.png", &receipt_photo());
        let missing = dir.path().join("c_missing.png");

        let scanner = ReceiptScanner::new(DimensionRecognizer);
        let outcomes = scanner.scan_paths(&[failing.clone(), good, missing]);

        assert_eq!(outcomes.len(), 3);
        match &outcomes[0] {
            ScanOutcome::Failed(failure) => {
                assert_eq!(failure.error, ExtractionFailure::KIND);
                assert!(failure.message.contains("receipt outline"));
                assert_eq!(failure.input_file, failing.display().to_string());
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(outcomes[1].is_success());
        assert!(!outcomes[2].is_success());
    }

    #[test]
    fn failure_outcome_serializes_as_error_object() {
        let outcome = ScanOutcome::Failed(ExtractionFailure::new("boom", "input/x.png"));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["error"], "processing_failed");
        assert_eq!(value["input_file"], "input/x.png");
    }

    #[test]
    fn llm_payload_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let wide = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 100, Luma([50u8])));
        let path = write_png(dir.path(), "wide.png", &wide);

        let config = ScannerConfig {
            llm_max_image_side: 150,
            ..ScannerConfig::default()
        };
        let scanner = ReceiptScanner::with_config(&config, DimensionRecognizer).unwrap();
        let payload = scanner.llm_payload(&path).unwrap();

        use base64::Engine as _;
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 50));
    }
}
