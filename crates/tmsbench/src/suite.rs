//! Suite pipeline: build, inspect, simulate and classify every requested
//! (benchmark, opt) pair, then aggregate.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::build::{Artifact, BuildLayout, OptLevel};
use crate::error::BuildError;
use crate::inspect;
use crate::registry::{BenchmarkInfo, HaltSemantics};
use crate::sim::{self, Halt, RunResult, SimConfig};
use crate::status::{RunStatus, classify};

/// The external stages of one measurement.
pub trait SuiteBackend {
    /// Produce the artifact for a pair.
    fn build(&self, bench: &BenchmarkInfo, opt: OptLevel) -> Result<Artifact, BuildError>;

    /// Code section size of a built artifact (0 when unavailable).
    fn code_size(&self, artifact: &Artifact) -> u64;

    /// Execute a built artifact.
    fn simulate(&self, artifact: &Artifact) -> RunResult;
}

/// Backend driving `make`, `llvm-size` and the simulator.
#[derive(Debug, Clone)]
pub struct ToolchainBackend {
    pub layout: BuildLayout,
    pub size_tool: PathBuf,
    pub sim: SimConfig,
}

impl SuiteBackend for ToolchainBackend {
    fn build(&self, bench: &BenchmarkInfo, opt: OptLevel) -> Result<Artifact, BuildError> {
        self.layout.build(bench.name, opt)
    }

    fn code_size(&self, artifact: &Artifact) -> u64 {
        inspect::code_size(&self.size_tool, &artifact.elf)
    }

    fn simulate(&self, artifact: &Artifact) -> RunResult {
        sim::run_image(&self.sim, &artifact.image)
    }
}

/// Progress hooks for callers that display the run as it happens.
pub trait SuiteObserver {
    fn pair_started(&mut self, _bench: &BenchmarkInfo, _opt: OptLevel) {}
    fn pair_finished(&mut self, _record: &MetricsRecord) {}
}

impl SuiteObserver for () {}

/// Measurements for one (benchmark, opt) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsRecord {
    pub bench: String,
    pub opt: OptLevel,
    pub status: RunStatus,
    /// `.text` bytes.
    pub code_size: u64,
    pub steps: u64,
    pub cycles: u64,
    /// Raw terminal condition; absent when the build failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halt: Option<Halt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricsRecord {
    /// Degraded record for a pair whose build failed.
    #[must_use]
    pub fn build_failure(bench: &str, opt: OptLevel, error: impl Into<String>) -> Self {
        Self {
            bench: bench.to_string(),
            opt,
            status: RunStatus::BuildFail,
            code_size: 0,
            steps: 0,
            cycles: 0,
            halt: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn from_run(bench: &str, opt: OptLevel, code_size: u64, run: RunResult) -> Self {
        Self {
            bench: bench.to_string(),
            opt,
            status: classify(&run.halt),
            code_size,
            steps: run.steps,
            cycles: run.cycles,
            halt: Some(run.halt),
            error: run.error,
        }
    }
}

/// Measure a single pair. A build failure stops the pair before inspection
/// or simulation and yields a `BUILD_FAIL` record.
pub fn run_pair<B: SuiteBackend + ?Sized>(
    backend: &B,
    bench: &BenchmarkInfo,
    opt: OptLevel,
) -> MetricsRecord {
    let _span = info_span!("pair", bench = bench.name, opt = %opt).entered();

    let artifact = match backend.build(bench, opt) {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!("{e}");
            return MetricsRecord::build_failure(bench.name, opt, e.to_string());
        }
    };

    let code_size = backend.code_size(&artifact);
    let run = backend.simulate(&artifact);
    let record = MetricsRecord::from_run(bench.name, opt, code_size, run);

    if record.status == RunStatus::Limit && bench.halt == HaltSemantics::Idle {
        warn!(
            halt = ?record.halt,
            "expected {} halt, run was capped",
            bench.halt.as_str()
        );
    }
    record
}

/// Measure every pair, opt level outer and benchmark inner.
///
/// Returns exactly one record per pair, in request order.
pub fn run_suite<B, O>(
    backend: &B,
    benches: &[&BenchmarkInfo],
    opts: &[OptLevel],
    observer: &mut O,
) -> Vec<MetricsRecord>
where
    B: SuiteBackend + ?Sized,
    O: SuiteObserver + ?Sized,
{
    let mut records = Vec::with_capacity(benches.len() * opts.len());
    for &opt in opts {
        for bench in benches {
            observer.pair_started(bench, opt);
            let record = run_pair(backend, bench, opt);
            crate::metrics::record_outcome(&record);
            observer.pair_finished(&record);
            records.push(record);
        }
    }
    let summary = SuiteSummary::from_records(&records);
    info!(passed = summary.passed, total = summary.total, "suite finished");
    records
}

/// Pass count over a finished suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteSummary {
    pub passed: usize,
    pub total: usize,
}

impl SuiteSummary {
    #[must_use]
    pub fn from_records(records: &[MetricsRecord]) -> Self {
        Self {
            passed: records.iter().filter(|r| r.status.is_pass()).count(),
            total: records.len(),
        }
    }

    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// 0 when every record passed, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }
}

impl std::fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} passed", self.passed, self.total)
    }
}
