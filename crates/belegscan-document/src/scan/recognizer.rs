// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-recognition seam between the rectifier and an OCR engine.

use belegscan_core::error::BelegscanError;
use image::DynamicImage;

/// Abstraction over a text-recognition engine.
///
/// Implementations receive the rectified receipt in memory and return a
/// plain-text transcription.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, BelegscanError>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for &R {
    fn recognize(&self, image: &DynamicImage) -> Result<String, BelegscanError> {
        (**self).recognize(image)
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, BelegscanError> {
        (**self).recognize(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    struct Dimensions;

    impl TextRecognizer for Dimensions {
        fn recognize(&self, image: &DynamicImage) -> Result<String, BelegscanError> {
            Ok(format!("{}x{}", image.width(), image.height()))
        }
    }

    #[test]
    fn boxed_and_borrowed_recognizers_delegate() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([0u8])));
        let boxed: Box<dyn TextRecognizer> = Box::new(Dimensions);
        assert_eq!(boxed.recognize(&img).unwrap(), "3x2");
        assert_eq!((&Dimensions).recognize(&img).unwrap(), "3x2");
    }
}
