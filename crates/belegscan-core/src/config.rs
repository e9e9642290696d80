// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration. Every tunable is an explicit value handed to the
// component that uses it; nothing here reads process state.

use serde::{Deserialize, Serialize};

use crate::error::{BelegscanError, Result};

/// Parameters of the receipt boundary detection pipeline.
///
/// The edge thresholds and approximation tolerance are empirical constants
/// tuned for receipt-on-table photos with moderate contrast. They are not
/// adapted per image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifierConfig {
    /// Width of the downscaled working image used for edge and contour detection.
    pub working_width: u32,
    /// Gaussian sigma applied before edge detection (1.1 matches a 5x5 kernel).
    pub blur_sigma: f32,
    /// Lower hysteresis threshold of the Canny detector.
    pub canny_low: f32,
    /// Upper hysteresis threshold of the Canny detector.
    pub canny_high: f32,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// L-infinity dilation radius applied to the edge map (0 disables).
    pub edge_dilation: u8,
}

impl Default for RectifierConfig {
    fn default() -> Self {
        Self {
            working_width: 500,
            blur_sigma: 1.1,
            canny_low: 75.0,
            canny_high: 200.0,
            approx_epsilon_ratio: 0.02,
            edge_dilation: 1,
        }
    }
}

impl RectifierConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.working_width == 0 {
            return Err(BelegscanError::InvalidConfig(
                "working_width must be greater than zero".into(),
            ));
        }
        if !(self.blur_sigma > 0.0) {
            return Err(BelegscanError::InvalidConfig(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.canny_low < 0.0 || self.canny_high < 0.0 {
            return Err(BelegscanError::InvalidConfig(
                "edge thresholds must not be negative".into(),
            ));
        }
        if self.canny_low > self.canny_high {
            return Err(BelegscanError::InvalidConfig(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio < 1.0) {
            return Err(BelegscanError::InvalidConfig(format!(
                "approx_epsilon_ratio must lie in (0, 1), got {}",
                self.approx_epsilon_ratio
            )));
        }
        Ok(())
    }
}

/// Page segmentation mode requested from the text-recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegmentation {
    /// Fully automatic layout analysis.
    Auto,
    /// A single column of text of variable sizes.
    SingleColumn,
    /// A single uniform block of text. Receipts are read this way.
    #[default]
    SingleBlock,
    /// The whole image is treated as one line of text.
    SingleLine,
}

impl PageSegmentation {
    /// Conventional numeric page segmentation code (as used by Tesseract's `--psm`).
    pub fn psm(self) -> u8 {
        match self {
            PageSegmentation::Auto => 3,
            PageSegmentation::SingleColumn => 4,
            PageSegmentation::SingleBlock => 6,
            PageSegmentation::SingleLine => 7,
        }
    }
}

impl std::fmt::Display for PageSegmentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSegmentation::Auto => write!(f, "auto"),
            PageSegmentation::SingleColumn => write!(f, "single_column"),
            PageSegmentation::SingleBlock => write!(f, "single_block"),
            PageSegmentation::SingleLine => write!(f, "single_line"),
        }
    }
}

/// Settings for a full scan run: rectification plus the LLM image handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub rectifier: RectifierConfig,
    /// Longest side, in pixels, of images sent to a multimodal model.
    pub llm_max_image_side: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rectifier: RectifierConfig::default(),
            llm_max_image_side: 1080,
        }
    }
}

impl ScannerConfig {
    pub fn validate(&self) -> Result<()> {
        self.rectifier.validate()?;
        if self.llm_max_image_side == 0 {
            return Err(BelegscanError::InvalidConfig(
                "llm_max_image_side must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RectifierConfig::default().validate().is_ok());
        assert!(ScannerConfig::default().validate().is_ok());
    }

    #[test]
    fn default_thresholds_match_receipt_tuning() {
        let config = RectifierConfig::default();
        assert_eq!(config.working_width, 500);
        assert_eq!(config.canny_low, 75.0);
        assert_eq!(config.canny_high, 200.0);
        assert!((config.approx_epsilon_ratio - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_working_width_rejected() {
        let config = RectifierConfig {
            working_width: 0,
            ..RectifierConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BelegscanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let config = RectifierConfig {
            canny_low: 250.0,
            canny_high: 100.0,
            ..RectifierConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn epsilon_ratio_bounds() {
        for ratio in [0.0, -0.1, 1.0, f64::NAN] {
            let config = RectifierConfig {
                approx_epsilon_ratio: ratio,
                ..RectifierConfig::default()
            };
            assert!(config.validate().is_err(), "ratio {ratio} should be rejected");
        }
    }

    #[test]
    fn non_positive_sigma_rejected() {
        let config = RectifierConfig {
            blur_sigma: 0.0,
            ..RectifierConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_llm_side_rejected() {
        let config = ScannerConfig {
            llm_max_image_side: 0,
            ..ScannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn page_segmentation_codes() {
        assert_eq!(PageSegmentation::default(), PageSegmentation::SingleBlock);
        assert_eq!(PageSegmentation::SingleBlock.psm(), 6);
        assert_eq!(PageSegmentation::Auto.psm(), 3);
        assert_eq!(PageSegmentation::SingleLine.to_string(), "single_line");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ScannerConfig =
            serde_json::from_str(r#"{"rectifier": {"working_width": 800}}"#).unwrap();
        assert_eq!(config.rectifier.working_width, 800);
        assert_eq!(config.rectifier.canny_high, 200.0);
        assert_eq!(config.llm_max_image_side, 1080);
    }
}
