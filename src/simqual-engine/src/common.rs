// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

/// Which stage of an evaluation produced an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Config,
    Structure,
    Alignment,
}

/// Error taxonomy shared with the `Fehlercode` column of `Results.tsv`.
///
/// Structural codes (`InvalidNumbers` through `PostCheckMismatch`) mark one
/// tool file's contribution as unusable; `TimeAlignment` marks a tool file
/// (unknown time unit) or a single (tool, variable) pair (resampling miss).
///
/// `ColumnOutOfRange` is part of the published code table consumed by
/// downstream reporting; name-based column lookup means the current
/// evaluation path never emits it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError,
    InvalidNumbers,
    RowCountMismatch,
    HeaderMismatch,
    MissingData,
    ColumnOutOfRange,
    PostCheckMismatch,
    TimeAlignment,
}

impl ErrorCode {
    /// The numeric code written to result files.
    pub fn code(&self) -> i32 {
        use ErrorCode::*;
        match self {
            NoError => 0,
            InvalidNumbers => -7,
            RowCountMismatch => -8,
            HeaderMismatch => -9,
            MissingData => -10,
            ColumnOutOfRange => -11,
            PostCheckMismatch => -12,
            TimeAlignment => -15,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            NoError => "no_error",
            InvalidNumbers => "invalid_numbers",
            RowCountMismatch => "row_count_mismatch",
            HeaderMismatch => "header_mismatch",
            MissingData => "missing_data",
            ColumnOutOfRange => "column_out_of_range",
            PostCheckMismatch => "post_check_mismatch",
            TimeAlignment => "time_alignment",
        };

        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Io => "IoError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Structure => "StructureError",
            ErrorKind::Alignment => "AlignmentError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[test]
fn test_error_codes() {
    assert_eq!(0, ErrorCode::NoError.code());
    assert_eq!(-7, ErrorCode::InvalidNumbers.code());
    assert_eq!(-8, ErrorCode::RowCountMismatch.code());
    assert_eq!(-9, ErrorCode::HeaderMismatch.code());
    assert_eq!(-10, ErrorCode::MissingData.code());
    assert_eq!(-11, ErrorCode::ColumnOutOfRange.code());
    assert_eq!(-12, ErrorCode::PostCheckMismatch.code());
    assert_eq!(-15, ErrorCode::TimeAlignment.code());
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Structure,
        ErrorCode::HeaderMismatch,
        Some("ToolA.tsv".to_owned()),
    );
    assert_eq!("StructureError{header_mismatch: ToolA.tsv}", err.to_string());
}
