//! Artifact builder - drives the benchmark Makefile.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::BuildError;

/// Compiler optimization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
    Os,
}

impl OptLevel {
    /// Levels the suite runs when none are requested.
    pub const SUITE_DEFAULT: &'static [Self] = &[Self::O0, Self::O1, Self::O2];

    /// Bare level as passed to `make OPT=`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::O0 => "0",
            Self::O1 => "1",
            Self::O2 => "2",
            Self::O3 => "3",
            Self::Os => "s",
        }
    }

    /// Report label and build directory name (`O2`).
    #[must_use]
    pub fn tag(self) -> String {
        format!("O{}", self.as_str())
    }

    /// Compiler flag (`-O2`).
    #[must_use]
    pub fn flag(self) -> String {
        format!("-O{}", self.as_str())
    }
}

impl std::fmt::Display for OptLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "O{}", self.as_str())
    }
}

impl serde::Serialize for OptLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Built outputs for one (benchmark, opt) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Raw loadable image for the simulator.
    pub image: PathBuf,
    /// Linked ELF carrying section metadata.
    pub elf: PathBuf,
}

/// Where the benchmark Makefile lives and where it writes.
///
/// Artifacts land in `<bench_dir>/build/O<level>/<name>.{bin,elf}` and are
/// left in place between runs.
#[derive(Debug, Clone)]
pub struct BuildLayout {
    pub bench_dir: PathBuf,
    pub make: PathBuf,
}

impl BuildLayout {
    pub fn new(bench_dir: impl Into<PathBuf>) -> Self {
        Self {
            bench_dir: bench_dir.into(),
            make: PathBuf::from("make"),
        }
    }

    /// Benchmark directory inside a project checkout.
    #[must_use]
    pub fn for_root(root: &Path) -> Self {
        Self::new(root.join("tests").join("benchmarks"))
    }

    #[must_use]
    pub fn with_make(mut self, make: impl Into<PathBuf>) -> Self {
        self.make = make.into();
        self
    }

    #[must_use]
    pub fn build_dir(&self, opt: OptLevel) -> PathBuf {
        self.bench_dir.join("build").join(opt.tag())
    }

    #[must_use]
    pub fn artifact(&self, bench: &str, opt: OptLevel) -> Artifact {
        let dir = self.build_dir(opt);
        Artifact {
            image: dir.join(format!("{bench}.bin")),
            elf: dir.join(format!("{bench}.elf")),
        }
    }

    /// The `make` invocation for one pair.
    #[must_use]
    pub fn make_command(&self, bench: &str, opt: OptLevel) -> Command {
        let mut cmd = Command::new(&self.make);
        cmd.arg("-C")
            .arg(&self.bench_dir)
            .arg(bench)
            .arg(format!("OPT={}", opt.as_str()));
        cmd
    }

    /// Build one benchmark at one level.
    ///
    /// Make's stdout is discarded; its stderr becomes the diagnostic text of
    /// [`BuildError::Failed`] when the build exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Spawn`] if `make` cannot start and
    /// [`BuildError::Failed`] with its stderr on a non-zero exit.
    pub fn build(&self, bench: &str, opt: OptLevel) -> Result<Artifact, BuildError> {
        let mut cmd = self.make_command(bench, opt);
        debug!(bench, opt = %opt, "building");
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| BuildError::Spawn {
                program: self.make.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            let diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BuildError::Failed { diagnostics });
        }
        Ok(self.artifact(bench, opt))
    }
}
