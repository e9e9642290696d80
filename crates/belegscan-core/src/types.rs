// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared value types: the detected receipt quadrilateral, the structured
// failure record, and the default extraction schema handed to multimodal models.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Raster file extensions accepted as scan inputs (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Whether `ext` (without the dot, any case) names a supported raster format.
pub fn is_supported_extension(ext: &str) -> bool {
    let lower = ext.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&lower.as_str())
}

/// Structured error object recorded for an input that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    /// Machine-readable error kind; always `processing_failed`.
    pub error: String,
    /// Human-readable cause.
    pub message: String,
    /// The input file the failure belongs to.
    pub input_file: String,
}

impl ExtractionFailure {
    pub const KIND: &'static str = "processing_failed";

    pub fn new(message: impl Into<String>, input_file: impl Into<String>) -> Self {
        Self {
            error: Self::KIND.to_string(),
            message: message.into(),
            input_file: input_file.into(),
        }
    }
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.error, self.message, self.input_file)
    }
}

/// The schema description sent to the model when the caller supplies none.
pub fn default_receipt_schema() -> Value {
    json!({
        "merchant_name": "string",
        "merchant_address": "string",
        "transaction_date": "string",
        "transaction_time": "string",
        "total_amount": "number",
        "currency": "string",
        "invoice_number": "string",
        "tax_amount": "number",
        "line_items": [
            {
                "item_name": "string",
                "item_quantity": "number",
                "item_price": "number"
            }
        ]
    })
}

/// A 2D point in image pixel coordinates.
pub type Corner = (f32, f32);

/// The four corners of a detected receipt, in a fixed logical order.
///
/// The corners always form a simple cycle: they are sorted by angle around
/// their centroid, the top-left corner is the one with the smallest `x + y`,
/// and the others follow clockwise on screen. Every input vertex is used
/// exactly once, so a receipt rotated close to 45 degrees still yields four
/// distinct corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiptQuad {
    pub top_left: Corner,
    pub top_right: Corner,
    pub bottom_right: Corner,
    pub bottom_left: Corner,
}

impl ReceiptQuad {
    /// Order four unordered vertices into a quadrilateral.
    pub fn from_points(points: [Corner; 4]) -> Self {
        let cx = points.iter().map(|p| p.0).sum::<f32>() / 4.0;
        let cy = points.iter().map(|p| p.1).sum::<f32>() / 4.0;
        let angle = |p: &Corner| (p.1 - cy).atan2(p.0 - cx);
        let sum = |p: &Corner| p.0 + p.1;

        // Image y grows downwards, so increasing angle runs clockwise on screen.
        let mut cyclic = points;
        cyclic.sort_by(|a, b| angle(a).total_cmp(&angle(b)));

        let start = (0..4)
            .min_by(|&i, &j| sum(&cyclic[i]).total_cmp(&sum(&cyclic[j])))
            .unwrap_or(0);
        Self {
            top_left: cyclic[start],
            top_right: cyclic[(start + 1) % 4],
            bottom_right: cyclic[(start + 2) % 4],
            bottom_left: cyclic[(start + 3) % 4],
        }
    }

    /// Whether no two corners coincide.
    pub fn has_distinct_corners(&self) -> bool {
        let corners = self.corners();
        (0..4).all(|i| (i + 1..4).all(|j| corners[i] != corners[j]))
    }

    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn corners(&self) -> [Corner; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Multiply every coordinate by `ratio` (working image to raw image space).
    pub fn scaled(&self, ratio: f64) -> Self {
        let scale = |(x, y): Corner| ((x as f64 * ratio) as f32, (y as f64 * ratio) as f32);
        Self {
            top_left: scale(self.top_left),
            top_right: scale(self.top_right),
            bottom_right: scale(self.bottom_right),
            bottom_left: scale(self.bottom_left),
        }
    }

    /// Enclosed area via the shoelace formula.
    pub fn area(&self) -> f32 {
        let corners = self.corners();
        let mut area = 0.0f32;
        for i in 0..corners.len() {
            let j = (i + 1) % corners.len();
            area += corners[i].0 * corners[j].1;
            area -= corners[j].0 * corners[i].1;
        }
        area.abs() / 2.0
    }

    /// Size of the upright rectangle this quadrilateral rectifies to.
    ///
    /// Width is the longer of the top and bottom edges, height the longer of
    /// the left and right edges, both truncated to whole pixels. This keeps
    /// the apparent aspect ratio of the detected receipt.
    pub fn output_size(&self) -> (u32, u32) {
        let width = distance(self.bottom_right, self.bottom_left)
            .max(distance(self.top_right, self.top_left));
        let height = distance(self.top_right, self.bottom_right)
            .max(distance(self.top_left, self.bottom_left));
        (width as u32, height as u32)
    }
}

fn distance(a: Corner, b: Corner) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
