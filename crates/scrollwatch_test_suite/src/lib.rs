//! Scrollwatch Scenario Suite
//!
//! Headless end-to-end scenarios for the scrollwatch engine. A
//! [`SimulatedDom`](dom::SimulatedDom) stands in for the browser, a
//! [`DataService`](data::DataService) serves the demo lists with injected
//! latency, and [`ScrollDriver`](driver::ScrollDriver) plays the host's
//! event loop around a [`ScrollContainer`](scrollwatch_engine::ScrollContainer).
//!
//! # Categories
//!
//! - **anchoring**: the anchored item stays put across list mutations
//! - **crossings**: reference-line crossings under touch scrolling
//! - **calibration**: device pixel ratio distortion is measured and corrected
//! - **lifecycle**: missing geometry and unmount

pub mod data;
pub mod dom;
pub mod driver;
pub mod harness;
pub mod runner;
pub mod scenarios;
pub mod tracker;

pub use harness::{TestContext, TestHarness, TestResult};
pub use runner::TestRunner;
