// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// belegscan: Core types, configuration, and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod response;
pub mod types;

pub use config::{PageSegmentation, RectifierConfig, ScannerConfig};
pub use error::BelegscanError;
pub use response::parse_model_response;
pub use types::*;
