// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::path::{Path, PathBuf};
use std::result::Result as StdResult;

use pico_args::Arguments;

use simqual_engine::{
    CaseResult, ToolCatalog, WeightTable, load_weight_factors, process_directory, write_results,
};

const VERSION: &str = "1.0";
const EXIT_FAILURE: i32 = 1;

const RESULTS_FILE: &str = "Results.tsv";
const WEIGHTS_FILE: &str = "WeightFactors.tsv";
const TOOLS_FILE: &str = "ToolData.tsv";

macro_rules! die(
    ($($arg:tt)*) => { {
        eprintln!($($arg)*);
        std::process::exit(EXIT_FAILURE)
    } }
);

fn usage() -> ! {
    let argv0 = std::env::args()
        .next()
        .unwrap_or_else(|| "simqual".to_string());
    die!(
        concat!(
            "simqual {}: score simulation results against reference data.\n\
         \n\
         USAGE:\n",
            "    {} [SUBCOMMAND] [OPTION...] DATA_DIR\n",
            "\n\
         OPTIONS:\n",
            "    -h, --help       show this message\n",
            "    --output FILE    path of the results file (default DATA_DIR/Results.tsv)\n",
            "    --weights FILE   weight factor table (default DATA_DIR/WeightFactors.tsv)\n",
            "    --tools FILE     tool metadata table (default DATA_DIR/ToolData.tsv)\n",
            "\n\
         SUBCOMMANDS:\n",
            "    score            Evaluate all test-case directories and write a score file\n",
        ),
        VERSION,
        argv0
    );
}

#[derive(Clone, Default, Debug)]
struct Args {
    data_dir: Option<String>,
    output: Option<String>,
    weights: Option<String>,
    tools: Option<String>,
}

fn parse_args() -> StdResult<Args, Box<dyn std::error::Error>> {
    let mut parsed = Arguments::from_env();
    if parsed.contains(["-h", "--help"]) {
        usage();
    }

    let subcommand = parsed.subcommand()?;
    let Some(subcommand) = subcommand else {
        eprintln!("error: subcommand required");
        usage();
    };
    if subcommand != "score" {
        eprintln!("error: unknown subcommand {}", subcommand);
        usage();
    }

    let mut args: Args = Default::default();
    args.output = parsed.value_from_str("--output").ok();
    args.weights = parsed.value_from_str("--weights").ok();
    args.tools = parsed.value_from_str("--tools").ok();

    let free_arguments = parsed.finish();
    if free_arguments.is_empty() {
        eprintln!("error: data directory required");
        usage();
    }

    args.data_dir = free_arguments[0].to_str().map(|s| s.to_owned());

    Ok(args)
}

/// Test-case directories are named `TF<digit>…`; anything else under the
/// data directory is ignored (with a warning for near-misses).
fn discover_test_cases(data_dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(err) => die!("error: cannot read '{}': {}", data_dir.display(), err),
    };

    let mut cases: Vec<PathBuf> = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with("TF") {
            continue;
        }
        if name.len() < 3 || !name.as_bytes()[2].is_ascii_digit() {
            eprintln!("warning, malformed test case directory name '{}'", name);
            continue;
        }
        cases.push(path);
    }
    cases.sort();
    cases
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => die!("error: {}", err),
    };

    let data_dir = PathBuf::from(args.data_dir.unwrap_or_default());
    let weights_path = args
        .weights
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(WEIGHTS_FILE));
    let tools_path = args
        .tools
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(TOOLS_FILE));
    let output_path = args
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(RESULTS_FILE));

    // the weight table and tool metadata are fatal for the whole run
    let weights: WeightTable = match load_weight_factors(&weights_path) {
        Ok(weights) => weights,
        Err(err) => die!("error: {}", err),
    };
    let tools = match ToolCatalog::load(&tools_path) {
        Ok(tools) => tools,
        Err(err) => die!("error: {}", err),
    };

    let mut results: Vec<CaseResult> = Vec::new();
    for case_dir in discover_test_cases(&data_dir) {
        eprintln!("processing '{}'", case_dir.display());
        // a fatal test case does not abort its siblings
        match process_directory(&case_dir, &weights, &tools) {
            Ok(case_results) => results.extend(case_results),
            Err(err) => eprintln!("error, skipping '{}': {}", case_dir.display(), err),
        }
    }

    if let Err(err) = write_results(&output_path, &results) {
        die!("error: {}", err);
    }
    eprintln!("wrote {} results to '{}'", results.len(), output_path.display());
}
