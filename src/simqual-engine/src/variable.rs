// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// A physical variable parsed from a series header label.
///
/// Labels look like `Zone temperature [C]` or
/// `Zone temperature (mean) [C]`; the canonical name is the text before the
/// optional `(mean)` marker or the unit bracket, and the unit bracket is
/// mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub unit: String,
    pub raw: String,
}

pub fn parse_header(raw: &str) -> Result<Variable> {
    let bad_header = |details: String| {
        Error::new(ErrorKind::Structure, ErrorCode::HeaderMismatch, Some(details))
    };

    let open = raw
        .find('[')
        .ok_or_else(|| bad_header(format!("missing unit in header label '{raw}'")))?;
    let close = raw[open..]
        .find(']')
        .map(|i| open + i)
        .ok_or_else(|| bad_header(format!("unterminated unit in header label '{raw}'")))?;
    let unit = raw[open + 1..close].trim().to_owned();

    let name_end = raw.find("(mean)").unwrap_or(open);
    let name = raw[..name_end].trim().to_owned();
    if name.is_empty() {
        return Err(bad_header(format!("empty variable name in header label '{raw}'")));
    }

    Ok(Variable {
        name,
        unit,
        raw: raw.to_owned(),
    })
}

#[test]
fn test_parse_header() {
    let v = parse_header("Operative temperature [C]").unwrap();
    assert_eq!("Operative temperature", v.name);
    assert_eq!("C", v.unit);

    let v = parse_header("Operative temperature (mean) [C]").unwrap();
    assert_eq!("Operative temperature", v.name);
    assert_eq!("C", v.unit);

    let v = parse_header("Time [h]").unwrap();
    assert_eq!("Time", v.name);
    assert_eq!("h", v.unit);
}

#[test]
fn test_parse_header_rejects_missing_unit() {
    assert!(parse_header("Operative temperature").is_err());
    assert!(parse_header("Operative temperature [C").is_err());
    assert!(parse_header("[C]").is_err());
}
