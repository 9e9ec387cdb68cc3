// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end evaluation over an on-disk test-case tree.

use std::fs;
use std::path::{Path, PathBuf};

use float_cmp::approx_eq;

use simqual_engine::{
    Badge, CaseResult, ErrorCode, Metric, ToolCatalog, load_weight_factors, process_directory,
    write_results,
};

const HOURS: usize = 72;

fn hour_axis() -> Vec<f64> {
    (0..HOURS).map(|h| h as f64).collect()
}

fn zone_temperature() -> Vec<f64> {
    (0..HOURS).map(|h| 20.0 + ((h * 7) % 13) as f64).collect()
}

/// Alternating 40/60 W, so the mean is exactly 50.
fn heating_load() -> Vec<f64> {
    (0..HOURS)
        .map(|h| if h % 2 == 0 { 40.0 } else { 60.0 })
        .collect()
}

fn write_series(path: &Path, time_header: &str, time: &[f64], columns: &[(&str, &[f64])]) {
    let mut out = String::new();
    out.push_str(time_header);
    for (header, _) in columns {
        out.push('\t');
        out.push_str(header);
    }
    out.push('\n');
    for (i, t) in time.iter().enumerate() {
        out.push_str(&format!("{t}"));
        for (_, values) in columns {
            out.push_str(&format!("\t{}", values[i]));
        }
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

/// Build one complete test-case directory under `data_dir` and return it.
fn build_case_dir(data_dir: &Path) -> PathBuf {
    let case_dir = data_dir.join("TF01-Conduction");
    let results_dir = case_dir.join("Auswertung/Ergebnisse");
    fs::create_dir_all(&results_dir).unwrap();

    // the third Zone temperature window is reversed and must be skipped
    // without affecting its siblings
    fs::write(
        case_dir.join("EvaluationPeriods.tsv"),
        "Variable\tStart\tEnd\n\
         Zone temperature\t0,24,30\t23,47,10\n\
         Heating load\t0\t71\n",
    )
    .unwrap();

    let t = hour_axis();
    let zt = zone_temperature();
    let hl = heating_load();

    write_series(
        &results_dir.join("Reference.tsv"),
        "Time [h]",
        &t,
        &[("Zone temperature [C]", &zt), ("Heating load [W]", &hl)],
    );

    // identical to the reference
    write_series(
        &results_dir.join("ToolA.tsv"),
        "Time [h]",
        &t,
        &[("Zone temperature [C]", &zt), ("Heating load [W]", &hl)],
    );

    // uniformly offset by +5
    let zt_off: Vec<f64> = zt.iter().map(|v| v + 5.0).collect();
    let hl_off: Vec<f64> = hl.iter().map(|v| v + 5.0).collect();
    write_series(
        &results_dir.join("ToolB.tsv"),
        "Time [h]",
        &t,
        &[
            ("Zone temperature [C]", &zt_off),
            ("Heating load [W]", &hl_off),
        ],
    );

    // identical values on a minute axis
    let t_min: Vec<f64> = t.iter().map(|h| h * 60.0).collect();
    write_series(
        &results_dir.join("ToolC.tsv"),
        "Time [min]",
        &t_min,
        &[("Zone temperature [C]", &zt), ("Heating load [W]", &hl)],
    );

    // missing the Heating load column entirely
    write_series(
        &results_dir.join("ToolD.tsv"),
        "Time [h]",
        &t,
        &[("Zone temperature [C]", &zt)],
    );

    // one corrupt cell
    let mut corrupt = String::from("Time [h]\tZone temperature [C]\tHeating load [W]\n");
    corrupt.push_str("0\tnot-a-number\t40\n");
    fs::write(results_dir.join("ToolE.tsv"), corrupt).unwrap();

    // unknown time unit
    write_series(
        &results_dir.join("ToolF.tsv"),
        "Time [s]",
        &t,
        &[("Zone temperature [C]", &zt), ("Heating load [W]", &hl)],
    );

    // not listed in the tool metadata table
    write_series(
        &results_dir.join("ToolG.tsv"),
        "Time [h]",
        &t,
        &[("Zone temperature [C]", &zt), ("Heating load [W]", &hl)],
    );

    // one ragged row
    fs::write(
        results_dir.join("ToolH.tsv"),
        "Time [h]\tZone temperature [C]\tHeating load [W]\n\
         0\t20\t40\n\
         1\t21\n",
    )
    .unwrap();

    case_dir
}

fn write_run_config(data_dir: &Path) {
    fs::write(
        data_dir.join("WeightFactors.tsv"),
        "Metric\tWeight\nCVRMSE\t2\nNMBE\t1\nNRMSE\t1\nRMSE\t1\nMBE\t1\n",
    )
    .unwrap();

    let mut tools = String::from("ToolID\tDisplayName\tVersion\tEditor\tDisplayColor\n");
    for (id, name) in [
        ("ToolA", "Tool Alpha"),
        ("ToolB", "Tool Beta"),
        ("ToolC", "Tool Gamma"),
        ("ToolD", "Tool Delta"),
        ("ToolE", "Tool Epsilon"),
        ("ToolF", "Tool Zeta"),
        ("ToolH", "Tool Eta"),
        ("Reference_X", "Ref Tool X"),
        ("Reference_Y", "Ref Tool Y"),
    ] {
        tools.push_str(&format!("{id}\t{name}\t1.0\tAcme\t#336699\n"));
    }
    fs::write(data_dir.join("ToolData.tsv"), tools).unwrap();
}

fn find<'a>(results: &'a [CaseResult], tool: &str, variable: &str) -> Option<&'a CaseResult> {
    results
        .iter()
        .find(|r| r.tool_id == tool && r.variable == variable)
}

#[test]
fn full_case_evaluation() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path();
    write_run_config(data_dir);
    let case_dir = build_case_dir(data_dir);

    let weights = load_weight_factors(&data_dir.join("WeightFactors.tsv")).unwrap();
    let tools = ToolCatalog::load(&data_dir.join("ToolData.tsv")).unwrap();

    let results = process_directory(&case_dir, &weights, &tools).unwrap();

    // the directory prefix is stripped from the case name
    assert!(results.iter().all(|r| r.test_case == "01-Conduction"));

    // identical series: all error metrics zero, exactly 100.00, Gold
    let r = find(&results, "ToolA", "Zone temperature").unwrap();
    assert_eq!(ErrorCode::NoError, r.error_code);
    assert_eq!(Some(0.0), r.norms.get(Metric::Rmse));
    assert_eq!(Some(0.0), r.norms.get(Metric::Cvrmse));
    assert_eq!(Some(0.0), r.norms.get(Metric::Mbe));
    assert_eq!(Some(100.0), r.score);
    assert_eq!(Badge::Gold, r.badge);

    // +5 offset over a mean-50 reference: MBE = 5, NMBE = 10%
    let r = find(&results, "ToolB", "Heating load").unwrap();
    assert!(approx_eq!(f64, 5.0, r.norms.get(Metric::Mbe).unwrap()));
    assert!(approx_eq!(f64, 10.0, r.norms.get(Metric::Nmbe).unwrap()));
    // every configured penalty is 10, so the window score is 90: Bronze
    assert_eq!(Some(90.0), r.score);
    assert_eq!(Badge::Bronze, r.badge);

    // a minute-sampled tool aligns onto the hourly reference
    let r = find(&results, "ToolC", "Heating load").unwrap();
    assert_eq!(Some(100.0), r.score);
    assert_eq!(Badge::Gold, r.badge);

    // missing column: no result for that pair, full results otherwise
    assert!(find(&results, "ToolD", "Heating load").is_none());
    let r = find(&results, "ToolD", "Zone temperature").unwrap();
    assert_eq!(Some(100.0), r.score);

    // structural failures produce one sentinel result per variable
    for variable in ["Zone temperature", "Heating load"] {
        let r = find(&results, "ToolE", variable).unwrap();
        assert_eq!(ErrorCode::InvalidNumbers, r.error_code);
        assert_eq!(None, r.score);
        assert_eq!(Badge::Failed, r.badge);

        let r = find(&results, "ToolF", variable).unwrap();
        assert_eq!(ErrorCode::TimeAlignment, r.error_code);

        let r = find(&results, "ToolG", variable).unwrap();
        assert_eq!(ErrorCode::MissingData, r.error_code);

        // a ragged row maps onto the row-count structural code
        let r = find(&results, "ToolH", variable).unwrap();
        assert_eq!(ErrorCode::RowCountMismatch, r.error_code);
        assert_eq!(None, r.score);
        assert_eq!(Badge::Failed, r.badge);
    }

    // ordering: sorted tool file name, then reference-header variable order
    let keys: Vec<(&str, &str)> = results
        .iter()
        .map(|r| (r.tool_id.as_str(), r.variable.as_str()))
        .collect();
    let mut expected: Vec<(&str, &str)> = Vec::new();
    for tool in ["ToolA", "ToolB", "ToolC"] {
        expected.push((tool, "Zone temperature"));
        expected.push((tool, "Heating load"));
    }
    expected.push(("ToolD", "Zone temperature"));
    for tool in ["ToolE", "ToolF", "ToolG", "ToolH"] {
        expected.push((tool, "Zone temperature"));
        expected.push((tool, "Heating load"));
    }
    assert_eq!(expected, keys);
}

#[test]
fn reversed_window_skipped_without_harming_siblings() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path();
    write_run_config(data_dir);
    let case_dir = build_case_dir(data_dir);

    let weights = load_weight_factors(&data_dir.join("WeightFactors.tsv")).unwrap();
    let tools = ToolCatalog::load(&data_dir.join("ToolData.tsv")).unwrap();
    let results = process_directory(&case_dir, &weights, &tools).unwrap();

    // Zone temperature has windows [0,23], [24,47], and a reversed [30,10];
    // the reversed one is dropped and the variable still scores
    let r = find(&results, "ToolA", "Zone temperature").unwrap();
    assert_eq!(ErrorCode::NoError, r.error_code);
    assert_eq!(Some(100.0), r.score);
}

#[test]
fn minute_unit_reference_keeps_windows() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path();
    write_run_config(data_dir);

    let case_dir = data_dir.join("TF04-Convection");
    let results_dir = case_dir.join("Auswertung/Ergebnisse");
    fs::create_dir_all(&results_dir).unwrap();

    // reference sampled in minutes; window bounds are in the same unit
    fs::write(
        case_dir.join("EvaluationPeriods.tsv"),
        "Variable\tStart\tEnd\nHeating load\t0\t4260\n",
    )
    .unwrap();

    let t_min: Vec<f64> = hour_axis().iter().map(|h| h * 60.0).collect();
    let hl = heating_load();
    write_series(
        &results_dir.join("Reference.tsv"),
        "Time [min]",
        &t_min,
        &[("Heating load [W]", &hl)],
    );
    write_series(
        &results_dir.join("ToolA.tsv"),
        "Time [min]",
        &t_min,
        &[("Heating load [W]", &hl)],
    );

    let weights = load_weight_factors(&data_dir.join("WeightFactors.tsv")).unwrap();
    let tools = ToolCatalog::load(&data_dir.join("ToolData.tsv")).unwrap();
    let results = process_directory(&case_dir, &weights, &tools).unwrap();

    let r = find(&results, "ToolA", "Heating load").unwrap();
    assert_eq!(ErrorCode::NoError, r.error_code);
    assert_eq!(Some(100.0), r.score);
    assert_eq!(Badge::Gold, r.badge);
}

#[test]
fn reference_built_from_reference_tool_average() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path();
    write_run_config(data_dir);

    let case_dir = data_dir.join("TF02-Radiation");
    let results_dir = case_dir.join("Auswertung/Ergebnisse");
    fs::create_dir_all(&results_dir).unwrap();
    fs::write(
        case_dir.join("EvaluationPeriods.tsv"),
        "Variable\tStart\tEnd\nHeating load\t0\t71\n",
    )
    .unwrap();

    let t = hour_axis();
    let hl = heating_load();
    // two reference tools straddling the target mean
    let hl_hi: Vec<f64> = hl.iter().map(|v| v + 2.0).collect();
    let hl_lo: Vec<f64> = hl.iter().map(|v| v - 2.0).collect();
    write_series(
        &results_dir.join("Reference_X.tsv"),
        "Time [h]",
        &t,
        &[("Heating load [W]", &hl_hi)],
    );
    write_series(
        &results_dir.join("Reference_Y.tsv"),
        "Time [h]",
        &t,
        &[("Heating load [W]", &hl_lo)],
    );
    // a candidate equal to the average of the two
    write_series(
        &results_dir.join("ToolA.tsv"),
        "Time [h]",
        &t,
        &[("Heating load [W]", &hl)],
    );

    let weights = load_weight_factors(&data_dir.join("WeightFactors.tsv")).unwrap();
    let tools = ToolCatalog::load(&data_dir.join("ToolData.tsv")).unwrap();
    let results = process_directory(&case_dir, &weights, &tools).unwrap();

    let r = find(&results, "ToolA", "Heating load").unwrap();
    assert_eq!(Some(100.0), r.score);
    assert_eq!(Badge::Gold, r.badge);
    assert!(!r.is_reference);

    // the contributing reference tools are themselves evaluated and flagged
    let r = find(&results, "Reference_X", "Heating load").unwrap();
    assert!(r.is_reference);
    assert_eq!(ErrorCode::NoError, r.error_code);
}

#[test]
fn missing_reference_is_fatal_for_the_case() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path();
    write_run_config(data_dir);

    let case_dir = data_dir.join("TF03-Empty");
    fs::create_dir_all(case_dir.join("Auswertung/Ergebnisse")).unwrap();
    fs::write(
        case_dir.join("EvaluationPeriods.tsv"),
        "Variable\tStart\tEnd\n",
    )
    .unwrap();

    let weights = load_weight_factors(&data_dir.join("WeightFactors.tsv")).unwrap();
    let tools = ToolCatalog::load(&data_dir.join("ToolData.tsv")).unwrap();
    assert!(process_directory(&case_dir, &weights, &tools).is_err());
}

#[test]
fn results_file_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path();
    write_run_config(data_dir);
    let case_dir = build_case_dir(data_dir);

    let weights = load_weight_factors(&data_dir.join("WeightFactors.tsv")).unwrap();
    let tools = ToolCatalog::load(&data_dir.join("ToolData.tsv")).unwrap();
    let results = process_directory(&case_dir, &weights, &tools).unwrap();

    let out = data_dir.join("Results.tsv");
    write_results(&out, &results).unwrap();
    let contents = fs::read_to_string(&out).unwrap();
    let mut lines = contents.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with(
        "Test Case\tVariable\tToolID\tTool Name\tVersion\tUnit\tEditor\tFehlercode\t"
    ));
    assert!(header.contains("CVRMSE [%]"));
    assert!(header.ends_with("Reference\tSimQ-Score [%]\tSimQ-Rating"));
    assert_eq!(results.len(), lines.count());

    // a fully evaluated row carries the rounded score and badge
    let gold = contents
        .lines()
        .find(|l| l.starts_with("01-Conduction\tZone temperature\tToolA"))
        .unwrap();
    assert!(gold.ends_with("\t0\t100.00\tGold"));

    // a structural failure row carries its code and the -99 sentinels
    let failed = contents
        .lines()
        .find(|l| l.starts_with("01-Conduction\tZone temperature\tToolE"))
        .unwrap();
    assert!(failed.contains("\t-7\t"));
    assert!(failed.contains("\t-99\t"));
    assert!(failed.ends_with("\tFailed"));
}
