//! Reference test binary entry point.
//!
//! Runs the recovered interactive scenes headless and validates the
//! expected physical outcomes. Exits nonzero if any check fails, so the
//! binary doubles as a regression gate for the solver.

use reference_tests::scenario::{splash_box_test, zero_gravity_drift_test};
use reference_tests::{ReferenceTest, TestResult};

/// Get all reference tests, cheapest first.
fn all_tests() -> Vec<ReferenceTest> {
    vec![
        zero_gravity_drift_test(343, 4, 300),
        splash_box_test(5000, 16, 600),
    ]
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    tracing::info!("SPH Reference Test Suite");
    tracing::info!("========================");

    let tests = all_tests();
    tracing::info!("Found {} reference tests", tests.len());

    // Run all tests
    let mut results: Vec<TestResult> = Vec::new();
    let mut passed_count = 0;
    let mut failed_count = 0;

    for test in tests {
        match test.run() {
            Ok(result) => {
                if result.passed {
                    passed_count += 1;
                } else {
                    failed_count += 1;
                }
                result.print_summary();
                results.push(result);
            }
            Err(e) => {
                eprintln!("\nERROR running test {}: {}", test.name, e);
                failed_count += 1;
            }
        }
    }

    // Print overall summary
    println!("\n{}", "=".repeat(80));
    println!("OVERALL SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Total tests: {}", results.len());
    println!("Passed: {}", passed_count);
    println!("Failed: {}", failed_count);
    println!("{}", "=".repeat(80));

    // Exit with error code if any tests failed
    if failed_count > 0 {
        std::process::exit(1);
    }
}
