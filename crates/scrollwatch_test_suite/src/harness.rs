//! Test harness for scenario tests
//!
//! Provides infrastructure for running scenarios:
//! - A current-thread tokio runtime per scenario for the data service
//! - The container configuration shared by every scenario
//! - Result reporting

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::runtime::Runtime;

use scrollwatch_engine::ContainerConfig;

use crate::data::{keys, DataService, Mutation};
use crate::driver::ScrollDriver;

/// Latency of the demo data service
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(50);

/// Result of a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestResult {
    Passed,
    Failed { reason: String },
}

impl TestResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestResult::Passed)
    }
}

/// Context for a single scenario
pub struct TestContext {
    /// Scenario name
    pub name: String,
    /// Container tunables; scenarios add their own points
    pub config: ContainerConfig,
    /// Demo data source
    pub data: DataService,
    runtime: Runtime,
}

impl TestContext {
    pub fn new(name: &str, config: ContainerConfig, latency: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to build scenario runtime")?;

        Ok(Self {
            name: name.to_string(),
            config,
            data: DataService::new(latency),
            runtime,
        })
    }

    /// Drive a future to completion on the scenario runtime
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// A fresh container over a default simulated DOM
    pub fn driver(&self) -> ScrollDriver {
        ScrollDriver::new(self.config.clone())
    }

    /// Keys of the initial list
    pub fn initial_keys(&self) -> Vec<String> {
        keys(&self.block_on(self.data.initial()))
    }

    /// Keys of the list a mutation yields
    pub fn fetch_keys(&self, mutation: Mutation) -> Vec<String> {
        keys(&self.block_on(self.data.fetch(mutation)))
    }
}

/// Runs scenarios, each in its own context
pub struct TestHarness {
    config: ContainerConfig,
    latency: Duration,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

impl TestHarness {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            latency: DEFAULT_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Run a scenario and collect its result
    pub fn run_test<F>(&self, name: &str, test_fn: F) -> TestResult
    where
        F: FnOnce(&mut TestContext) -> Result<()>,
    {
        let outcome = TestContext::new(name, self.config.clone(), self.latency)
            .and_then(|mut ctx| test_fn(&mut ctx));

        match outcome {
            Ok(()) => TestResult::Passed,
            Err(e) => TestResult::Failed {
                reason: format!("{:#}", e),
            },
        }
    }
}

/// Run a scenario from a `#[test]` and fail the test on failure
#[cfg(test)]
pub(crate) fn run_scenario<F>(name: &str, test_fn: F)
where
    F: FnOnce(&mut TestContext) -> Result<()>,
{
    let harness = TestHarness::default().with_latency(Duration::from_millis(1));
    let result = harness.run_test(name, test_fn);
    assert!(result.is_passed(), "{}: {:?}", name, result);
}

/// Fail unless `actual` is within half a pixel of `expected`
pub fn ensure_px(actual: f32, expected: f32, what: &str) -> Result<()> {
    anyhow::ensure!(
        (actual - expected).abs() <= 0.5,
        "{}: expected {}, got {}",
        what,
        expected,
        actual
    );
    Ok(())
}
