//! Benchmark harness for the TMS9900 compiler backend.
//!
//! Two pipelines share the shape build → inspect/execute → classify →
//! aggregate → report:
//!
//! - [`suite`] builds every registered benchmark at several optimization
//!   levels, runs each image on the cycle-accurate simulator and records
//!   status, code size, steps and cycles.
//! - [`compare`] builds one source twice, with and without a compiler
//!   pass, and diffs size, instruction mix and post-increment usage.
//!
//! Output scraping lives in the `tmsbench-scrape` crate.

pub mod build;
pub mod compare;
pub mod error;
pub mod inspect;
pub mod metrics;
pub mod process;
pub mod registry;
pub mod report;
pub mod sim;
pub mod status;
pub mod suite;
pub mod toolchain;

pub use build::{Artifact, BuildLayout, OptLevel};
pub use compare::{CompareTarget, Comparison, Delta, PassExperiment, Variant, compute_deltas};
pub use error::{BuildError, Error, Result, SetupError, ToolError};
pub use registry::{BENCHMARKS, BenchmarkInfo, HaltSemantics, find_benchmark};
pub use sim::{Halt, RunResult, SimConfig, run_image};
pub use status::{RunStatus, classify};
pub use suite::{
    MetricsRecord, SuiteBackend, SuiteObserver, SuiteSummary, ToolchainBackend, run_suite,
};
pub use toolchain::{Tool, Toolchain};
