//! Dynamic runner - executes images on the cycle-accurate simulator.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use tmsbench_scrape::{SimSummary, find_summary};
use tracing::{debug, warn};

use crate::process::{TimedOutput, run_with_timeout};

/// Default instruction budget; enough for every suite program.
pub const DEFAULT_MAX_STEPS: u64 = 5_000_000;
/// Wall-clock limit for one simulator invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default workspace pointer (register file base, also the initial stack).
pub const DEFAULT_WORKSPACE: u16 = 0xF000;

/// Trailing output lines kept on a failed run.
const ERROR_TAIL_LINES: usize = 20;

/// Simulator invocation parameters.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub simulator: PathBuf,
    pub load_addr: u16,
    pub entry_addr: u16,
    pub workspace: u16,
    pub max_steps: u64,
    pub timeout: Duration,
}

impl SimConfig {
    pub fn new(simulator: impl Into<PathBuf>) -> Self {
        Self {
            simulator: simulator.into(),
            load_addr: 0x0000,
            entry_addr: 0x0000,
            workspace: DEFAULT_WORKSPACE,
            max_steps: DEFAULT_MAX_STEPS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = steps;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load and start at `addr`.
    #[must_use]
    pub const fn with_origin(mut self, addr: u16) -> Self {
        self.load_addr = addr;
        self.entry_addr = addr;
        self
    }

    /// `tms9900-trace -l <load> -e <entry> -w <wp> -n <steps> -S <image>`.
    #[must_use]
    pub fn command(&self, image: &Path) -> Command {
        let mut cmd = Command::new(&self.simulator);
        cmd.arg("-l")
            .arg(format!("0x{:04X}", self.load_addr))
            .arg("-e")
            .arg(format!("0x{:04X}", self.entry_addr))
            .arg("-w")
            .arg(format!("0x{:04X}", self.workspace))
            .arg("-n")
            .arg(self.max_steps.to_string())
            .arg("-S")
            .arg(image);
        cmd
    }
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// CPU reached `IDLE`.
    Idle,
    /// Explicit stop condition.
    Stop,
    /// Step budget exhausted inside the simulator.
    StepLimit,
    /// Harness wall-clock limit hit; the simulator was killed.
    Timeout,
    /// Simulator exited non-zero or could not be started.
    Error,
    /// No summary line in the output.
    Unknown,
    /// Any other tag the simulator reported.
    Other(String),
}

impl Halt {
    /// Parse a simulator halt tag (case-insensitive).
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "idle" => Self::Idle,
            "stop" => Self::Stop,
            "step_limit" => Self::StepLimit,
            "timeout" => Self::Timeout,
            "error" => Self::Error,
            "unknown" => Self::Unknown,
            _ => Self::Other(tag.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Stop => "stop",
            Self::StepLimit => "step_limit",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Unknown => "unknown",
            Self::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for Halt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Halt {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of one simulator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub halt: Halt,
    pub steps: u64,
    pub cycles: u64,
    pub error: Option<String>,
}

impl RunResult {
    /// Killed at the wall-clock limit: the whole budget is charged.
    #[must_use]
    pub const fn timeout(budget: u64) -> Self {
        Self {
            halt: Halt::Timeout,
            steps: budget,
            cycles: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            halt: Halt::Error,
            steps: 0,
            cycles: 0,
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            halt: Halt::Unknown,
            steps: 0,
            cycles: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn from_summary(summary: SimSummary) -> Self {
        Self {
            halt: Halt::parse(&summary.halt),
            steps: summary.steps,
            cycles: summary.clk,
            error: summary.error,
        }
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

/// Interpret the simulator's exit status and output.
#[must_use]
pub fn interpret(output: TimedOutput, budget: u64) -> RunResult {
    match output {
        TimedOutput::TimedOut { .. } => RunResult::timeout(budget),
        TimedOutput::Finished {
            status,
            stdout,
            stderr,
        } => {
            let mut combined = stdout;
            if !stderr.is_empty() {
                if !combined.is_empty() && !combined.ends_with('\n') {
                    combined.push('\n');
                }
                combined.push_str(&stderr);
            }
            if !status.success() {
                return RunResult::error(format!(
                    "simulator {status}\n{}",
                    tail(&combined, ERROR_TAIL_LINES)
                ));
            }
            find_summary(&combined).map_or_else(RunResult::unknown, RunResult::from_summary)
        }
    }
}

/// Run an image on the simulator.
///
/// Never fails: timeouts, crashes, unparseable output and a missing
/// simulator are all folded into the returned [`RunResult`].
pub fn run_image(config: &SimConfig, image: &Path) -> RunResult {
    let mut cmd = config.command(image);
    debug!(image = %image.display(), steps = config.max_steps, "simulating");

    let start = Instant::now();
    let output = run_with_timeout(&mut cmd, config.timeout);
    crate::metrics::record_simulation(start.elapsed());

    let result = match output {
        Ok(output) => interpret(output, config.max_steps),
        Err(e) => RunResult::error(format!(
            "failed to run {}: {e}",
            config.simulator.display()
        )),
    };
    match result.halt {
        Halt::Timeout => warn!(image = %image.display(), "simulator timed out after {:?}", config.timeout),
        Halt::Error => warn!(image = %image.display(), "simulator failed"),
        _ => debug!(halt = %result.halt, steps = result.steps, cycles = result.cycles, "simulated"),
    }
    result
}
