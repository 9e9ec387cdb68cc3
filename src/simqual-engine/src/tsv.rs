// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Tab-separated input tables (reference series, tool series).
//!
//! Files are read as strings first so that structural problems (ragged rows,
//! empty columns) can be reported separately from numeric conversion
//! failures, which carry different error codes.

use std::path::Path;

use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// One parsed TSV file, held column-major below the header row.
#[derive(Debug, Clone)]
pub struct TsvContainer {
    pub headers: Vec<String>,
    columns: Vec<Vec<String>>,
}

impl TsvContainer {
    pub fn read(path: &Path) -> Result<TsvContainer> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(false)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|err| {
                Error::new(
                    ErrorKind::Io,
                    ErrorCode::MissingData,
                    Some(format!("{}: {}", path.display(), err)),
                )
            })?;

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|err| {
                Error::new(
                    ErrorKind::Structure,
                    ErrorCode::HeaderMismatch,
                    Some(err.to_string()),
                )
            })?
            .iter()
            .map(|h| h.to_owned())
            .collect();

        let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            // a ragged row surfaces here as a csv `UnequalLengths` error
            let record = record.map_err(|err| {
                Error::new(
                    ErrorKind::Structure,
                    ErrorCode::RowCountMismatch,
                    Some(err.to_string()),
                )
            })?;
            for (i, field) in record.iter().enumerate() {
                columns[i].push(field.to_owned());
            }
        }

        Ok(TsvContainer { headers, columns })
    }

    pub fn n_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn column(&self, i: usize) -> Option<&[String]> {
        self.columns.get(i).map(|c| c.as_slice())
    }

    /// True if any column has no rows or consists entirely of empty cells.
    pub fn has_empty_column(&self) -> bool {
        self.columns
            .iter()
            .any(|col| col.is_empty() || col.iter().all(|cell| cell.is_empty()))
    }

    /// Convert every cell to `f64`, column-major.
    pub fn to_f64(&self) -> Result<Vec<Vec<f64>>> {
        let mut out: Vec<Vec<f64>> = Vec::with_capacity(self.columns.len());
        for (i, col) in self.columns.iter().enumerate() {
            let mut values: Vec<f64> = Vec::with_capacity(col.len());
            for cell in col {
                let n: f64 = cell.parse().map_err(|_err| {
                    Error::new(
                        ErrorKind::Structure,
                        ErrorCode::InvalidNumbers,
                        Some(format!("column '{}': bad value '{}'", self.headers[i], cell)),
                    )
                })?;
                values.push(n);
            }
            out.push(values);
        }
        Ok(out)
    }
}
