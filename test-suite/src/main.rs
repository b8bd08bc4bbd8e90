//! Test runner for the jschema case files.
//!
//! Prints one line per case file:
//! - draft2020-12/ref 12/12 PASS
//! - draft2020-12/dynamicRef 5/6 FAIL

use std::process::ExitCode;

use clap::Parser;
use rayon::prelude::*;
use test_suite::{
    CaseFile, CaseResult, CollectCasesError, ScenarioResult, cases_dir, collect_cases,
    file_name_from_path, load_remotes, remotes_dir,
};

#[derive(Parser)]
#[command(name = "test-suite", about = "jschema test suite runner")]
struct Args {
    /// Filter case files by name (substring match)
    #[arg(short, long)]
    filter: Option<String>,

    /// Show one line per failure instead of the full error
    #[arg(short, long)]
    short: bool,
}

/// ANSI color codes
mod colors {
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RESET: &str = "\x1b[0m";
}

enum FileOutcome {
    Ran {
        file_name: String,
        cases: Vec<(String, CaseResult)>,
    },
    LoadError {
        file_name: String,
        error: String,
    },
}

impl FileOutcome {
    fn file_name(&self) -> &str {
        match self {
            FileOutcome::Ran { file_name, .. } | FileOutcome::LoadError { file_name, .. } => {
                file_name
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if run(&args) { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run(args: &Args) -> bool {
    println!(
        "\n{}{}jschema Test Suite{}",
        colors::BOLD,
        colors::CYAN,
        colors::RESET
    );
    println!("{}{}{}\n", colors::DIM, "=".repeat(50), colors::RESET);

    let remotes = match load_remotes(&remotes_dir()) {
        Ok(remotes) => remotes,
        Err(e) => {
            eprintln!(
                "{}{}Error:{} failed to load remote documents: {e:#}",
                colors::BOLD,
                colors::RED,
                colors::RESET
            );
            return false;
        }
    };

    let base = cases_dir();
    let files: Vec<_> = collect_cases()
        .into_iter()
        .filter(|file| match (&args.filter, file) {
            (None, _) => true,
            (Some(filter), Ok(file)) => file_name_from_path(&file.path, &base).contains(filter),
            (Some(_), Err(_)) => true,
        })
        .collect();

    if files.is_empty() {
        println!(
            "{}{}Warning:{} No case files found",
            colors::BOLD,
            colors::YELLOW,
            colors::RESET
        );
        return true;
    }

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|file| match file {
            Ok(file) => run_file(file, &remotes),
            Err(error) => FileOutcome::LoadError {
                file_name: match error {
                    CollectCasesError::Io { path, .. } | CollectCasesError::Parse { path, .. } => {
                        file_name_from_path(path, &base)
                    }
                    CollectCasesError::Pattern(_) => "<pattern>".to_string(),
                },
                error: error.to_string(),
            },
        })
        .collect();

    let mut passed_files = 0;
    let mut failed_files = 0;
    let mut passed_scenarios = 0;
    let mut total_scenarios = 0;
    let mut failures: Vec<(String, Vec<String>)> = Vec::new();

    for outcome in &outcomes {
        match outcome {
            FileOutcome::Ran { file_name, cases } => {
                let passed: usize = cases.iter().map(|(_, r)| r.passed_count()).sum();
                let total: usize = cases.iter().map(|(_, r)| r.total_count()).sum();
                passed_scenarios += passed;
                total_scenarios += total;

                let ok = passed == total;
                let (status, color) = if ok {
                    ("PASS", colors::GREEN)
                } else {
                    ("FAIL", colors::RED)
                };
                println!(
                    "  {}{}{}{} {} {}{}/{}{}",
                    colors::BOLD,
                    color,
                    status,
                    colors::RESET,
                    outcome.file_name(),
                    colors::DIM,
                    passed,
                    total,
                    colors::RESET
                );
                if ok {
                    passed_files += 1;
                    continue;
                }
                failed_files += 1;
                for (case_name, result) in cases {
                    let details = result
                        .failed_scenarios()
                        .into_iter()
                        .filter_map(|scenario| match &scenario.result {
                            ScenarioResult::Failed { error } if args.short => Some(format!(
                                "{}: {}",
                                scenario.name,
                                first_line(&error.to_string())
                            )),
                            ScenarioResult::Failed { error } => {
                                Some(format!("{}: {}", scenario.name, error))
                            }
                            ScenarioResult::Passed => None,
                        })
                        .collect::<Vec<_>>();
                    if !details.is_empty() {
                        failures.push((format!("{file_name}[{case_name}]"), details));
                    }
                }
            }
            FileOutcome::LoadError { file_name, error } => {
                println!(
                    "  {}{}LOAD ERROR{} {}",
                    colors::BOLD,
                    colors::RED,
                    colors::RESET,
                    file_name
                );
                failed_files += 1;
                failures.push((file_name.clone(), vec![error.clone()]));
            }
        }
    }

    println!("\n{}{}Summary{}", colors::BOLD, colors::CYAN, colors::RESET);
    println!("{}{}{}", colors::DIM, "-".repeat(50), colors::RESET);
    println!(
        "  Files:     {} passed, {} failed, {} total",
        passed_files,
        failed_files,
        passed_files + failed_files
    );
    println!(
        "  Scenarios: {} passed, {} failed, {} total",
        passed_scenarios,
        total_scenarios - passed_scenarios,
        total_scenarios
    );

    if !failures.is_empty() {
        println!("\n{}{}Failures{}", colors::BOLD, colors::RED, colors::RESET);
        println!("{}{}{}", colors::DIM, "-".repeat(50), colors::RESET);
        for (name, details) in &failures {
            println!("\n  {}{}{}{}", colors::BOLD, colors::RED, name, colors::RESET);
            for detail in details {
                for line in detail.lines() {
                    println!("    {line}");
                }
            }
        }
    }

    println!();
    if failed_files == 0 {
        println!(
            "{}{}All tests passed!{}",
            colors::BOLD,
            colors::GREEN,
            colors::RESET
        );
        true
    } else {
        println!(
            "{}{}{} file(s) failed.{}",
            colors::BOLD,
            colors::RED,
            failed_files,
            colors::RESET
        );
        false
    }
}

fn run_file(file: &CaseFile, remotes: &[(url::Url, serde_json::Value)]) -> FileOutcome {
    FileOutcome::Ran {
        file_name: file_name_from_path(&file.path, &cases_dir()),
        cases: file
            .cases
            .iter()
            .map(|case| (case.description.clone(), case.run_all(remotes)))
            .collect(),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}
