// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Receipt boundary rectifier: locates the outline of a photographed receipt
// and warps it to an upright, top-down image ready for text recognition.

use belegscan_core::config::RectifierConfig;
use belegscan_core::error::BelegscanError;
use belegscan_core::types::ReceiptQuad;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::morphology::dilate;
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::scan::geometry::{approximate_closed, rank_outer_contours};

/// A successfully rectified receipt.
#[derive(Debug, Clone)]
pub struct Rectification {
    /// The perspective-corrected receipt. Grayscale inputs stay `Luma8`,
    /// everything else becomes `Rgb8`.
    pub image: DynamicImage,
    /// The detected outline in raw image coordinates.
    pub quad: ReceiptQuad,
    /// Raw image width divided by working image width.
    pub scale_ratio: f64,
}

/// Detects the receipt quadrilateral in a photo and flattens it.
///
/// ## Pipeline
///
/// 1. Shrink to the working width (never upscale), recording the scale ratio
/// 2. Convert to grayscale and apply a Gaussian blur
/// 3. Canny edge detection with fixed thresholds, then a small dilation to
///    close single-pixel gaps
/// 4. Extract outermost contours only
/// 5. Rank contours by enclosed area, largest first
/// 6. Accept the first contour whose polygon approximation has exactly four
///    vertices
/// 7. Scale the accepted corners back to raw image coordinates
/// 8. Order the corners and warp the raw image onto an upright rectangle
///
/// There is no fallback: when no contour approximates to four corners the
/// call fails with [`BelegscanError::BoundaryNotFound`] rather than returning
/// the full frame.
#[derive(Debug, Clone, Default)]
pub struct Rectifier {
    config: RectifierConfig,
}

impl Rectifier {
    /// Create a rectifier, validating the configuration first.
    pub fn new(config: RectifierConfig) -> Result<Self, BelegscanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RectifierConfig {
        &self.config
    }

    /// Decode `data` and rectify it. Undecodable bytes fail before any
    /// pipeline stage runs.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn rectify_bytes(&self, data: &[u8]) -> Result<Rectification, BelegscanError> {
        let raw = ImageProcessor::from_bytes(data)?;
        self.rectify(raw.as_dynamic())
    }

    /// Read, decode, and rectify an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn rectify_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Rectification, BelegscanError> {
        let raw = ImageProcessor::open(path)?;
        self.rectify(raw.as_dynamic())
    }

    /// Locate the receipt in `raw` and return the flattened receipt image.
    #[instrument(skip_all, fields(width = raw.width(), height = raw.height()))]
    pub fn rectify(&self, raw: &DynamicImage) -> Result<Rectification, BelegscanError> {
        let (quad, scale_ratio) = self.detect_quad(raw)?;
        let image = warp_to_rectangle(raw, &quad)?;
        info!(
            out_w = image.width(),
            out_h = image.height(),
            "Receipt rectified"
        );
        Ok(Rectification {
            image,
            quad,
            scale_ratio,
        })
    }

    /// Run the detection stages only.
    ///
    /// Returns the receipt outline in raw image coordinates together with the
    /// scale ratio between the raw and working images.
    #[instrument(skip_all, fields(width = raw.width(), height = raw.height()))]
    pub fn detect_quad(&self, raw: &DynamicImage) -> Result<(ReceiptQuad, f64), BelegscanError> {
        if raw.width() == 0 || raw.height() == 0 {
            return Err(BelegscanError::InvalidImage("image has no pixels".into()));
        }

        // Step 1: Working copy at a fixed width.
        let working = ImageProcessor::from_dynamic(raw.clone())
            .shrink_to_width(self.config.working_width)
            .into_dynamic();
        let scale_ratio = raw.width() as f64 / working.width() as f64;
        debug!(
            working_w = working.width(),
            working_h = working.height(),
            scale_ratio,
            "Working image prepared"
        );

        // Step 2: Grayscale + blur.
        let gray = working.to_luma8();
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);

        // Step 3: Edge map.
        let edges = self.edge_map(&blurred);

        // Steps 4-5: Outer contours ranked by area.
        let ranked = rank_outer_contours(find_contours::<i32>(&edges));
        debug!(contours = ranked.len(), "Outer contours ranked");

        // Step 6: First contour that simplifies to four vertices.
        let mut accepted = None;
        for (rank, contour) in ranked.iter().enumerate() {
            let Some(polygon) = approximate_closed(contour, self.config.approx_epsilon_ratio)
            else {
                continue;
            };
            debug!(rank, vertices = polygon.len(), "Candidate approximated");
            if polygon.len() == 4 {
                accepted = Some([
                    (polygon[0].x as f32, polygon[0].y as f32),
                    (polygon[1].x as f32, polygon[1].y as f32),
                    (polygon[2].x as f32, polygon[2].y as f32),
                    (polygon[3].x as f32, polygon[3].y as f32),
                ]);
                break;
            }
        }

        let Some(corners) = accepted else {
            warn!(
                candidates = ranked.len(),
                "No contour approximates to four corners"
            );
            return Err(BelegscanError::BoundaryNotFound);
        };

        // Step 7: Back to raw image coordinates.
        let quad = ReceiptQuad::from_points(corners).scaled(scale_ratio);
        debug!(
            top_left = ?quad.top_left,
            top_right = ?quad.top_right,
            bottom_right = ?quad.bottom_right,
            bottom_left = ?quad.bottom_left,
            "Receipt outline detected"
        );
        Ok((quad, scale_ratio))
    }

    fn edge_map(&self, blurred: &GrayImage) -> GrayImage {
        let edges = canny(blurred, self.config.canny_low, self.config.canny_high);
        if self.config.edge_dilation == 0 {
            edges
        } else {
            dilate(&edges, Norm::LInf, self.config.edge_dilation)
        }
    }
}

/// Smallest enclosed area, in raw pixels, worth warping.
const MIN_QUAD_AREA: f32 = 4.0;

/// Step 8: map the quadrilateral onto an upright rectangle sized from its
/// longest edges.
fn warp_to_rectangle(
    raw: &DynamicImage,
    quad: &ReceiptQuad,
) -> Result<DynamicImage, BelegscanError> {
    let (out_w, out_h) = quad.output_size();
    let area = quad.area();
    if !quad.has_distinct_corners() || area < MIN_QUAD_AREA || out_w < 2 || out_h < 2 {
        warn!(out_w, out_h, area, "Detected outline is degenerate");
        return Err(BelegscanError::BoundaryNotFound);
    }

    let (max_x, max_y) = ((out_w - 1) as f32, (out_h - 1) as f32);
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),     // top-left
        (max_x, 0.0),   // top-right
        (max_x, max_y), // bottom-right
        (0.0, max_y),   // bottom-left
    ];

    let Some(projection) = Projection::from_control_points(quad.corners(), dest) else {
        warn!("Failed to compute projective transform");
        return Err(BelegscanError::BoundaryNotFound);
    };

    let image = if raw.color().has_color() {
        let rgb = raw.to_rgb8();
        let mut output = RgbImage::new(out_w, out_h);
        warp_into(
            &rgb,
            &projection,
            Interpolation::Bilinear,
            Rgb([255u8, 255, 255]),
            &mut output,
        );
        DynamicImage::ImageRgb8(output)
    } else {
        let gray = raw.to_luma8();
        let mut output = GrayImage::new(out_w, out_h);
        warp_into(
            &gray,
            &projection,
            Interpolation::Bilinear,
            Luma([255u8]),
            &mut output,
        );
        DynamicImage::ImageLuma8(output)
    };
    Ok(image)
}

// -- Tests --------------------------------------------------------------------
