// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Per-test-case evaluation: drives tools × variables × windows, applies
//! the error taxonomy, and assembles the ordered result set.
//!
//! Only fatal conditions (missing reference data or evaluation periods)
//! abort a test case; everything below that degrades to sentinel results,
//! silent skips, or per-window/per-metric gaps as specified in the error
//! taxonomy.

use std::path::Path;

use crate::align::{self, Window};
use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::config::{EvaluationPeriods, ToolCatalog, ToolInfo};
use crate::norms::{self, Norms};
use crate::score::{self, Badge, WeightTable};
use crate::tsv::TsvContainer;
use crate::variable::{self, Variable};

const RESULTS_SUBDIR: &str = "Auswertung/Ergebnisse";
const REFERENCE_FILE: &str = "Reference.tsv";
const REFERENCE_TOOL_PREFIX: &str = "Reference_";
const PERIODS_FILE: &str = "EvaluationPeriods.tsv";

/// One evaluated (test case, tool, variable) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    pub test_case: String,
    pub tool_id: String,
    pub variable: String,
    pub unit: String,
    pub display_name: String,
    pub version: String,
    pub editor: String,
    pub is_reference: bool,
    pub error_code: ErrorCode,
    pub norms: Norms,
    pub score: Option<f64>,
    pub badge: Badge,
}

impl CaseResult {
    fn sentinel(
        test_case: &str,
        tool: &ToolInfo,
        variable: &Variable,
        is_reference: bool,
        code: ErrorCode,
    ) -> CaseResult {
        CaseResult {
            test_case: test_case.to_owned(),
            tool_id: tool.tool_id.clone(),
            variable: variable.name.clone(),
            unit: variable.unit.clone(),
            display_name: tool.display_name.clone(),
            version: tool.version.clone(),
            editor: tool.editor.clone(),
            is_reference,
            error_code: code,
            norms: Norms::default(),
            score: None,
            badge: Badge::Failed,
        }
    }
}

/// Reference data for one test case: normalized hour axis plus one value
/// column per variable. `time_divisor` maps the file's native time unit
/// onto hours; window bounds arrive in the native unit and need the same
/// normalization.
struct ReferenceSeries {
    time: Vec<f64>,
    time_divisor: f64,
    variables: Vec<Variable>,
    columns: Vec<Vec<f64>>,
}

fn fatal(code: ErrorCode, details: String) -> Error {
    Error::new(ErrorKind::Structure, code, Some(details))
}

/// Validate and convert one series file; any defect is returned as the
/// matching structural error.
fn load_numeric(path: &Path) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
    let tsv = TsvContainer::read(path)?;
    if tsv.has_empty_column() {
        return Err(fatal(
            ErrorCode::MissingData,
            format!("'{}' contains empty columns", path.display()),
        ));
    }
    let data = tsv.to_f64()?;
    Ok((tsv.headers, data))
}

/// Build the reference series, either from `Reference.tsv` directly or by
/// averaging the `Reference_*.tsv` tool outputs.
///
/// The averaging is an explicit two-pass reduction: every contributing file
/// is loaded and its header set and time grid verified against the first
/// before any arithmetic, then columns are summed and divided by the file
/// count. An unaligned contributor is fatal for the test case.
fn load_reference(results_dir: &Path, tsv_files: &[String]) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
    if tsv_files.iter().any(|f| f == REFERENCE_FILE) {
        return load_numeric(&results_dir.join(REFERENCE_FILE));
    }

    let contributors: Vec<&String> = tsv_files
        .iter()
        .filter(|f| f.starts_with(REFERENCE_TOOL_PREFIX))
        .collect();
    if contributors.is_empty() {
        return Err(Error::new(
            ErrorKind::Io,
            ErrorCode::MissingData,
            Some(format!("missing '{REFERENCE_FILE}' in '{}'", results_dir.display())),
        ));
    }

    // pass one: load everything and verify common alignment
    let mut loaded = Vec::with_capacity(contributors.len());
    for file in &contributors {
        loaded.push(load_numeric(&results_dir.join(file.as_str()))?);
    }
    let (first_headers, first_data) = &loaded[0];
    for (i, (headers, data)) in loaded.iter().enumerate().skip(1) {
        if headers != first_headers {
            return Err(fatal(
                ErrorCode::HeaderMismatch,
                format!(
                    "'{}' headers disagree with '{}'",
                    contributors[i], contributors[0]
                ),
            ));
        }
        if data[0] != first_data[0] {
            return Err(fatal(
                ErrorCode::TimeAlignment,
                format!(
                    "'{}' time grid disagrees with '{}'",
                    contributors[i], contributors[0]
                ),
            ));
        }
    }

    // pass two: column-wise mean
    let n = loaded.len() as f64;
    let mut averaged = first_data.clone();
    for (_, data) in loaded.iter().skip(1) {
        for (col, acc) in data.iter().zip(averaged.iter_mut()).skip(1) {
            for (v, a) in col.iter().zip(acc.iter_mut()) {
                *a += *v;
            }
        }
    }
    for acc in averaged.iter_mut().skip(1) {
        for a in acc.iter_mut() {
            *a /= n;
        }
    }

    Ok((first_headers.clone(), averaged))
}

fn parse_reference(headers: Vec<String>, mut data: Vec<Vec<f64>>) -> Result<ReferenceSeries> {
    if headers.len() < 2 {
        return Err(fatal(
            ErrorCode::MissingData,
            "reference needs a time column and at least one variable".to_owned(),
        ));
    }

    let time_header = variable::parse_header(&headers[0])?;
    let divisor = align::time_scale(&time_header.unit)?;

    let mut variables = Vec::with_capacity(headers.len() - 1);
    for h in &headers[1..] {
        variables.push(variable::parse_header(h)?);
    }

    let time: Vec<f64> = data[0].iter().map(|t| t / divisor).collect();
    let columns: Vec<Vec<f64>> = data.drain(1..).collect();

    Ok(ReferenceSeries {
        time,
        time_divisor: divisor,
        variables,
        columns,
    })
}

/// Process one test-case directory, e.g. `data/TF03-Waermeleitung`.
///
/// Returns one `CaseResult` per evaluated (tool, variable) pair, ordered by
/// sorted tool file name and reference-header variable index. An `Err`
/// means the whole test case is unusable (missing reference data or
/// evaluation periods); sibling test cases are unaffected.
pub fn process_directory(
    path: &Path,
    weights: &WeightTable,
    tools: &ToolCatalog,
) -> Result<Vec<CaseResult>> {
    let dir_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // directory names carry a "TF" prefix that is not part of the case name
    let test_case = dir_name.strip_prefix("TF").unwrap_or(&dir_name).to_owned();

    let results_dir = path.join(RESULTS_SUBDIR);
    if !results_dir.exists() {
        return Err(Error::new(
            ErrorKind::Io,
            ErrorCode::MissingData,
            Some(format!("missing test result directory '{}'", results_dir.display())),
        ));
    }

    let mut tsv_files: Vec<String> = std::fs::read_dir(&results_dir)
        .map_err(|err| {
            Error::new(
                ErrorKind::Io,
                ErrorCode::MissingData,
                Some(format!("{}: {}", results_dir.display(), err)),
            )
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tsv"))
        .collect();
    tsv_files.sort();

    let (ref_headers, ref_data) = load_reference(&results_dir, &tsv_files)?;
    let reference = parse_reference(ref_headers, ref_data)?;

    let periods = EvaluationPeriods::load(&path.join(PERIODS_FILE))?;

    let mut results: Vec<CaseResult> = Vec::new();
    for file in &tsv_files {
        if file == REFERENCE_FILE {
            continue;
        }
        let tool_id = file.strip_suffix(".tsv").unwrap_or(file.as_str());
        let is_reference = file.starts_with(REFERENCE_TOOL_PREFIX);

        let tool = match tools.get(tool_id) {
            Some(info) => info.clone(),
            None => {
                eprintln!("warning, tool '{tool_id}' missing from tool metadata");
                let placeholder = ToolInfo {
                    tool_id: tool_id.to_owned(),
                    display_name: tool_id.to_owned(),
                    version: String::new(),
                    editor: String::new(),
                    display_color: String::new(),
                };
                append_sentinels(
                    &mut results,
                    &test_case,
                    &placeholder,
                    &reference.variables,
                    is_reference,
                    ErrorCode::MissingData,
                );
                continue;
            }
        };

        evaluate_tool_file(
            &mut results,
            &results_dir.join(file),
            &test_case,
            &tool,
            is_reference,
            &reference,
            &periods,
            weights,
        );
    }

    Ok(results)
}

fn append_sentinels(
    results: &mut Vec<CaseResult>,
    test_case: &str,
    tool: &ToolInfo,
    variables: &[Variable],
    is_reference: bool,
    code: ErrorCode,
) {
    for v in variables {
        results.push(CaseResult::sentinel(test_case, tool, v, is_reference, code));
    }
}

#[allow(clippy::too_many_arguments)]
fn evaluate_tool_file(
    results: &mut Vec<CaseResult>,
    path: &Path,
    test_case: &str,
    tool: &ToolInfo,
    is_reference: bool,
    reference: &ReferenceSeries,
    periods: &EvaluationPeriods,
    weights: &WeightTable,
) {
    let structural = |results: &mut Vec<CaseResult>, code: ErrorCode, details: String| {
        eprintln!("warning, '{}' skipped: {}", path.display(), details);
        append_sentinels(results, test_case, tool, &reference.variables, is_reference, code);
    };

    let tsv = match TsvContainer::read(path) {
        Ok(tsv) => tsv,
        Err(err) => {
            structural(results, err.code, err.to_string());
            return;
        }
    };
    if tsv.n_columns() == 0 || tsv.has_empty_column() {
        structural(
            results,
            ErrorCode::MissingData,
            "contains empty columns".to_owned(),
        );
        return;
    }

    let mut tool_vars: Vec<Variable> = Vec::with_capacity(tsv.headers.len());
    for h in &tsv.headers {
        match variable::parse_header(h) {
            Ok(v) => tool_vars.push(v),
            Err(err) => {
                structural(results, ErrorCode::HeaderMismatch, err.to_string());
                return;
            }
        }
    }

    let data = match tsv.to_f64() {
        Ok(data) => data,
        Err(err) => {
            structural(results, ErrorCode::InvalidNumbers, err.to_string());
            return;
        }
    };

    let divisor = match align::time_scale(&tool_vars[0].unit) {
        Ok(d) => d,
        Err(err) => {
            structural(results, ErrorCode::TimeAlignment, err.to_string());
            return;
        }
    };
    let tool_time = &data[0];

    for (i, var) in reference.variables.iter().enumerate() {
        // variables without configured windows are skipped silently, as are
        // variables a tool simply did not report
        let Some(windows) = periods.windows_for(&var.name) else {
            continue;
        };
        let Some(j) = tool_vars[1..].iter().position(|tv| tv.name == var.name) else {
            continue;
        };

        // window bounds are expressed in the reference's native time unit
        let windows: Vec<Window> = windows
            .iter()
            .map(|w| Window {
                start: w.start / reference.time_divisor,
                end: w.end / reference.time_divisor,
            })
            .collect();

        let candidate = match align::resample(&reference.time, tool_time, &data[j + 1], divisor) {
            Ok(c) => c,
            Err(err) => {
                eprintln!("warning, '{}': {}: {}", path.display(), var.name, err);
                results.push(CaseResult::sentinel(
                    test_case,
                    tool,
                    var,
                    is_reference,
                    ErrorCode::TimeAlignment,
                ));
                continue;
            }
        };

        match evaluate_windows(
            &windows,
            &reference.time,
            &reference.columns[i],
            &candidate,
            weights,
        ) {
            Ok((window_scores, last_norms)) => {
                let score = score::combine_windows(&window_scores);
                let badge = score.map(Badge::classify).unwrap_or_default();
                results.push(CaseResult {
                    test_case: test_case.to_owned(),
                    tool_id: tool.tool_id.clone(),
                    variable: var.name.clone(),
                    unit: var.unit.clone(),
                    display_name: tool.display_name.clone(),
                    version: tool.version.clone(),
                    editor: tool.editor.clone(),
                    is_reference,
                    error_code: ErrorCode::NoError,
                    norms: last_norms,
                    score,
                    badge,
                });
            }
            Err(err) => {
                eprintln!("warning, '{}': {}: {}", path.display(), var.name, err);
                results.push(CaseResult::sentinel(
                    test_case,
                    tool,
                    var,
                    is_reference,
                    err.code,
                ));
            }
        }
    }
}

/// Evaluate every valid window for one variable. Invalid windows are
/// skipped without affecting their siblings; the returned norms are those
/// of the last evaluated window.
fn evaluate_windows(
    windows: &[Window],
    time: &[f64],
    reference: &[f64],
    candidate: &[f64],
    weights: &WeightTable,
) -> Result<(Vec<f64>, Norms)> {
    let mut window_scores = Vec::with_capacity(windows.len());
    let mut last_norms = Norms::default();

    for window in windows {
        if !align::window_in_range(window, time) {
            eprintln!(
                "warning, skipping window [{}, {}] outside the reference extent",
                window.start, window.end
            );
            continue;
        }
        let aligned = align::slice_window(window, time, reference, candidate)?;
        if aligned.time.is_empty() {
            eprintln!(
                "warning, window [{}, {}] selects no samples",
                window.start, window.end
            );
            continue;
        }
        let norms = norms::compute_norms(&aligned.time, &aligned.reference, &aligned.candidate);
        window_scores.push(score::score_window(&norms, weights));
        last_norms = norms;
    }

    Ok((window_scores, last_norms))
}
