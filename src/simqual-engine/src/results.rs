// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! `Results.tsv` emission for the accumulated result set.

use std::path::Path;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::evaluate::CaseResult;
use crate::norms::METRICS;

fn io_err(path: &Path, err: csv::Error) -> Error {
    Error::new(
        ErrorKind::Io,
        ErrorCode::MissingData,
        Some(format!("{}: {}", path.display(), err)),
    )
}

/// Write the ordered result set as a tab-separated table.
///
/// Failed metrics appear as the `-99` sentinel; an unset score is an empty
/// field with badge `Failed`.
pub fn write_results(path: &Path, results: &[CaseResult]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|err| io_err(path, err))?;

    let mut header: Vec<&str> = vec![
        "Test Case",
        "Variable",
        "ToolID",
        "Tool Name",
        "Version",
        "Unit",
        "Editor",
        "Fehlercode",
    ];
    header.extend(METRICS.iter().map(|m| m.column_label()));
    header.extend(["Reference", "SimQ-Score [%]", "SimQ-Rating"]);
    wtr.write_record(&header).map_err(|err| io_err(path, err))?;

    for r in results {
        let mut record: Vec<String> = vec![
            r.test_case.clone(),
            r.variable.clone(),
            r.tool_id.clone(),
            r.display_name.clone(),
            r.version.clone(),
            r.unit.clone(),
            r.editor.clone(),
            r.error_code.code().to_string(),
        ];
        for metric in METRICS {
            record.push(format!("{}", r.norms.get_or_sentinel(metric)));
        }
        record.push(if r.is_reference { "1" } else { "0" }.to_owned());
        record.push(r.score.map(|s| format!("{s:.2}")).unwrap_or_default());
        record.push(r.badge.name().to_owned());
        wtr.write_record(&record).map_err(|err| io_err(path, err))?;
    }

    wtr.flush().map_err(|err| {
        Error::new(
            ErrorKind::Io,
            ErrorCode::MissingData,
            Some(format!("{}: {}", path.display(), err)),
        )
    })?;
    Ok(())
}
