// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding, aspect-preserving resizing, and encoding of
// in-memory images using the `image` crate.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use belegscan_core::error::BelegscanError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`
/// wrapping the result, enabling method chaining.
///
/// ```ignore
/// let payload = ImageProcessor::open("receipt.jpg")?
///     .fit_within(1080)
///     .to_base64_png()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Read and decode an image file.
    ///
    /// A missing or unreadable file is an I/O error; bytes that do not decode
    /// as a raster image are [`BelegscanError::InvalidImage`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, BelegscanError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, BMP, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, BelegscanError> {
        let img = image::load_from_memory(data).map_err(|err| {
            BelegscanError::InvalidImage(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Shrink the image to `width` pixels wide, preserving aspect ratio.
    ///
    /// Images that are already `width` pixels wide or narrower are returned
    /// unchanged; this never upscales. The new height is rounded to the
    /// nearest pixel and is at least one.
    #[instrument(skip(self))]
    pub fn shrink_to_width(self, width: u32) -> Self {
        let (from_w, from_h) = (self.image.width(), self.image.height());
        if from_w <= width || width == 0 {
            return self;
        }
        let height = ((from_h as f64 * width as f64 / from_w as f64).round() as u32).max(1);
        debug!(from_w, from_h, to_w = width, to_h = height, "Shrinking to working width");
        Self {
            image: self.image.resize_exact(width, height, FilterType::Triangle),
        }
    }

    /// Resize so that the longer side is at most `max_side` pixels.
    ///
    /// The longer side becomes exactly `max_side`; the shorter side is scaled
    /// proportionally and truncated. Uses Lanczos3 filtering.
    #[instrument(skip(self))]
    pub fn fit_within(self, max_side: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if w.max(h) <= max_side || max_side == 0 {
            return self;
        }
        let (new_w, new_h) = if w > h {
            (max_side, (h as u64 * max_side as u64 / w as u64) as u32)
        } else {
            ((w as u64 * max_side as u64 / h as u64) as u32, max_side)
        };
        let (new_w, new_h) = (new_w.max(1), new_h.max(1));
        info!(from_w = w, from_h = h, new_w, new_h, "Resizing image");
        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::Lanczos3),
        }
    }

    /// Convert anything other than 8-bit RGB or 8-bit luma to 8-bit RGB.
    pub fn normalize_color(self) -> Self {
        if matches!(
            self.image,
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_)
        ) {
            return self;
        }
        Self {
            image: DynamicImage::ImageRgb8(self.image.to_rgb8()),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, BelegscanError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as PNG and wrap it in standard base64.
    pub fn to_base64_png(&self) -> Result<String, BelegscanError> {
        let png = self.to_png_bytes()?;
        Ok(STANDARD.encode(png))
    }
}

/// Prepare an image for a multimodal model request.
///
/// Normalises the colour type, bounds the longer side to `max_side`, and
/// returns the PNG encoding as a base64 string.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn encode_for_llm(image: &DynamicImage, max_side: u32) -> Result<String, BelegscanError> {
    let payload = ImageProcessor::from_dynamic(image.clone())
        .normalize_color()
        .fit_within(max_side)
        .to_base64_png()?;
    debug!(encoded_len = payload.len(), "Image encoded for model handoff");
    Ok(payload)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, BelegscanError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        BelegscanError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
