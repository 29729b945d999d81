//! Test runner for executing scenario suites
//!
//! Manages scenario execution, result collection, and reporting.

use std::time::{Duration, Instant};

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use crate::harness::{TestContext, TestHarness, TestResult};

type ScenarioFn = Box<dyn FnOnce(&mut TestContext) -> Result<()> + Send>;

/// A single scenario
pub struct TestCase {
    pub name: String,
    pub category: String,
    pub test_fn: ScenarioFn,
}

impl TestCase {
    pub fn new<F>(name: &str, category: &str, test_fn: F) -> Self
    where
        F: FnOnce(&mut TestContext) -> Result<()> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            test_fn: Box::new(test_fn),
        }
    }

    fn matches(&self, pattern: &str) -> bool {
        self.name.contains(pattern) || self.category.contains(pattern)
    }
}

/// Result of running a scenario
#[derive(Debug, Serialize)]
pub struct TestRun {
    pub name: String,
    pub category: String,
    pub result: TestResult,
    pub duration: Duration,
}

impl TestRun {
    pub fn is_passed(&self) -> bool {
        self.result.is_passed()
    }
}

/// Scenarios sharing a category
pub struct TestSuite {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases: Vec::new(),
        }
    }

    pub fn add<F>(&mut self, name: &str, test_fn: F) -> &mut Self
    where
        F: FnOnce(&mut TestContext) -> Result<()> + Send + 'static,
    {
        self.cases.push(TestCase::new(name, &self.name, test_fn));
        self
    }
}

pub struct TestRunner {
    harness: TestHarness,
    suites: Vec<TestSuite>,
    /// Filter pattern (None = run all)
    filter: Option<String>,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::with_harness(TestHarness::default())
    }
}

impl TestRunner {
    pub fn with_harness(harness: TestHarness) -> Self {
        Self {
            harness,
            suites: Vec::new(),
            filter: None,
        }
    }

    pub fn add_suite(&mut self, suite: TestSuite) -> &mut Self {
        self.suites.push(suite);
        self
    }

    pub fn filter(&mut self, pattern: &str) -> &mut Self {
        self.filter = Some(pattern.to_string());
        self
    }

    /// Run every scenario that passes the filter
    pub fn run(&mut self) -> RunResult {
        let start = Instant::now();
        let mut results = Vec::new();

        for suite in self.suites.drain(..) {
            tracing::info!("Running suite: {}", suite.name);

            for case in suite.cases {
                if let Some(ref pattern) = self.filter {
                    if !case.matches(pattern) {
                        continue;
                    }
                }

                let test_start = Instant::now();
                let full_name = format!("{}::{}", case.category, case.name);
                tracing::debug!("Running scenario: {}", full_name);

                let result = self.harness.run_test(&full_name, case.test_fn);
                let duration = test_start.elapsed();

                match result {
                    TestResult::Passed => tracing::info!("  ✓ {} ({:?})", case.name, duration),
                    TestResult::Failed { ref reason } => {
                        tracing::error!("  ✗ {} ({:?}): {}", case.name, duration, reason)
                    }
                }

                results.push(TestRun {
                    name: case.name,
                    category: case.category,
                    result,
                    duration,
                });
            }
        }

        RunResult::new(results, start.elapsed())
    }

    pub fn harness(&self) -> &TestHarness {
        &self.harness
    }
}

/// Results from running scenarios
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub results: Vec<TestRun>,
    pub duration: Duration,
}

impl RunResult {
    pub fn new(results: Vec<TestRun>, duration: Duration) -> Self {
        Self { results, duration }
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_passed()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.is_passed())
    }

    /// Results grouped by category, in run order
    pub fn by_category(&self) -> IndexMap<&str, Vec<&TestRun>> {
        let mut map: IndexMap<&str, Vec<&TestRun>> = IndexMap::new();
        for result in &self.results {
            map.entry(result.category.as_str()).or_default().push(result);
        }
        map
    }

    /// Machine-readable report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════╗");
        println!("║         SCENARIO RESULTS SUMMARY         ║");
        println!("╠══════════════════════════════════════════╣");
        for (category, runs) in self.by_category() {
            let passed = runs.iter().filter(|r| r.is_passed()).count();
            println!("║  {:<20} {:>5} / {:<5}         ║", category, passed, runs.len());
        }
        println!("╠══════════════════════════════════════════╣");
        println!("║  Passed:  {:>5}                          ║", self.passed());
        println!("║  Failed:  {:>5}                          ║", self.failed());
        println!("║  Total:   {:>5}                          ║", self.total());
        println!("║  Time:    {:>8.2?}                      ║", self.duration);
        println!("╚══════════════════════════════════════════╝");

        if self.failed() > 0 {
            println!("\nFailed scenarios:");
            for result in &self.results {
                if let TestResult::Failed { ref reason } = result.result {
                    println!("  ✗ {}::{}: {}", result.category, result.name, reason);
                }
            }
        }
    }
}
