// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Scoring engine for building-energy-simulation tool validation.
//!
//! For each test case, tool outputs are aligned against a trusted reference
//! time series, a catalogue of statistical metrics is computed per
//! evaluation window, and the metrics are combined into one weighted
//! composite score and quality badge per (tool, variable) pair.

#![forbid(unsafe_code)]

pub mod align;
pub mod common;
pub mod config;
pub mod evaluate;
pub mod norms;
pub mod results;
pub mod score;
pub mod tsv;
pub mod variable;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::config::{EvaluationPeriods, ToolCatalog, ToolInfo, load_weight_factors};
pub use self::evaluate::{CaseResult, process_directory};
pub use self::norms::{METRICS, Metric, Norms};
pub use self::results::write_results;
pub use self::score::{Badge, WeightTable};
