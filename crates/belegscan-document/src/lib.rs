// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// belegscan-document: Image handling for receipt scanning.
//
// Provides image decoding and encoding (including the base64 handoff used by
// multimodal models), the receipt boundary rectifier (edge detection, contour
// selection, perspective correction), and the text-recognition seam that turns
// a rectified receipt into plain text.

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `belegscan_document::Rectifier` etc.
pub use crate::image::processor::{ImageProcessor, encode_for_llm};
pub use scan::pipeline::{ReceiptScanner, ScanOutcome, ScanResult, collect_inputs};
pub use scan::recognizer::TextRecognizer;
pub use scan::rectify::{Rectification, Rectifier};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
