// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Run and test-case configuration tables, all tab-separated.
//!
//! The weight table and the tool catalog are loaded once per run and shared
//! read-only across every test case; evaluation periods are per test case.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::align::Window;
use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::norms::Metric;
use crate::score::WeightTable;

fn config_err(details: String) -> Error {
    Error::new(ErrorKind::Config, ErrorCode::MissingData, Some(details))
}

/// Per-variable evaluation windows, from `EvaluationPeriods.tsv`.
///
/// Multi-window variables list their bounds as comma-separated values, e.g.
/// `Start` = `0,24` and `End` = `23,47`.
#[derive(Debug, Clone, Default)]
pub struct EvaluationPeriods {
    windows: HashMap<String, Vec<Window>>,
}

#[derive(Deserialize)]
struct PeriodRecord {
    #[serde(rename = "Variable")]
    variable: String,
    #[serde(rename = "Start")]
    start: String,
    #[serde(rename = "End")]
    end: String,
}

impl EvaluationPeriods {
    pub fn load(path: &Path) -> Result<EvaluationPeriods> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|err| config_err(format!("{}: {}", path.display(), err)))?;

        let mut windows: HashMap<String, Vec<Window>> = HashMap::new();
        for record in rdr.deserialize() {
            let record: PeriodRecord =
                record.map_err(|err| config_err(format!("{}: {}", path.display(), err)))?;
            let starts = parse_bounds(&record.start, path)?;
            let ends = parse_bounds(&record.end, path)?;
            if starts.len() != ends.len() {
                return Err(config_err(format!(
                    "'{}': {} start bounds but {} end bounds",
                    record.variable,
                    starts.len(),
                    ends.len()
                )));
            }
            let entry = windows.entry(record.variable).or_default();
            entry.extend(
                starts
                    .into_iter()
                    .zip(ends)
                    .map(|(start, end)| Window { start, end }),
            );
        }

        Ok(EvaluationPeriods { windows })
    }

    pub fn windows_for(&self, variable: &str) -> Option<&[Window]> {
        self.windows.get(variable).map(|w| w.as_slice())
    }
}

fn parse_bounds(field: &str, path: &Path) -> Result<Vec<f64>> {
    field
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|_err| config_err(format!("{}: bad bound '{}'", path.display(), s)))
        })
        .collect()
}

/// Load `WeightFactors.tsv`: one `Metric\tWeight` row per configured metric.
///
/// A pre-computed `Sum` row is accepted and ignored; the total is always
/// rederived so it cannot drift from the entries.
pub fn load_weight_factors(path: &Path) -> Result<WeightTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| config_err(format!("{}: {}", path.display(), err)))?;

    #[derive(Deserialize)]
    struct WeightRecord {
        #[serde(rename = "Metric")]
        metric: String,
        #[serde(rename = "Weight")]
        weight: f64,
    }

    let mut weights: HashMap<Metric, f64> = HashMap::new();
    for record in rdr.deserialize() {
        let record: WeightRecord =
            record.map_err(|err| config_err(format!("{}: {}", path.display(), err)))?;
        if record.metric == "Sum" {
            continue;
        }
        let metric = Metric::from_name(&record.metric).ok_or_else(|| {
            config_err(format!(
                "{}: unknown metric '{}'",
                path.display(),
                record.metric
            ))
        })?;
        weights.insert(metric, record.weight);
    }

    Ok(WeightTable::new(weights))
}

/// Descriptive metadata for one participating tool, from `ToolData.tsv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolInfo {
    #[serde(rename = "ToolID")]
    pub tool_id: String,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Editor")]
    pub editor: String,
    #[serde(rename = "DisplayColor")]
    pub display_color: String,
}

#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<String, ToolInfo>,
}

impl ToolCatalog {
    pub fn load(path: &Path) -> Result<ToolCatalog> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|err| config_err(format!("{}: {}", path.display(), err)))?;

        let mut tools = HashMap::new();
        for record in rdr.deserialize() {
            let info: ToolInfo =
                record.map_err(|err| config_err(format!("{}: {}", path.display(), err)))?;
            tools.insert(info.tool_id.clone(), info);
        }
        Ok(ToolCatalog { tools })
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolInfo> {
        self.tools.get(tool_id)
    }
}
