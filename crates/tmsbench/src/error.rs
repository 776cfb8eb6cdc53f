use std::path::PathBuf;

use thiserror::Error;

/// Environment problems detected before any benchmark runs.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("{tool} not found at {}", path.display())]
    ToolNotFound { tool: &'static str, path: PathBuf },
    #[error("unknown benchmark: {name}")]
    UnknownBenchmark { name: String },
}

/// Failure to produce an artifact for one (benchmark, opt) pair.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("build failed: {diagnostics}")]
    Failed { diagnostics: String },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Failure of an inspection tool (size, objdump, objcopy, linker).
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Harness errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
