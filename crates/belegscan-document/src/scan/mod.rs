// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: receipt boundary detection, perspective rectification,
// and optical character recognition (OCR).

pub mod geometry;
pub mod pipeline;
pub mod recognizer;
pub mod rectify;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use pipeline::ReceiptScanner;
pub use rectify::Rectifier;

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
