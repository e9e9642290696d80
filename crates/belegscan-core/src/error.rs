// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for belegscan.

use thiserror::Error;

/// Top-level error type for all belegscan operations.
#[derive(Debug, Error)]
pub enum BelegscanError {
    // -- Rectification --
    #[error("could not find receipt outline")]
    BoundaryNotFound,

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Text recognition --
    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BelegscanError>;
