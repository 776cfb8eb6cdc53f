//! External tool discovery.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SetupError;

/// Environment variable overriding the simulator path.
pub const SIMULATOR_ENV: &str = "TMS9900_TRACE";
/// Environment variable overriding the LLVM `bin` directory.
pub const LLVM_BIN_ENV: &str = "TMS9900_LLVM_BIN";
/// Environment variable overriding the project root.
pub const ROOT_ENV: &str = "TMS9900_ROOT";

/// An external program the harness drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Clang,
    Lld,
    Objcopy,
    Size,
    Objdump,
    Simulator,
}

impl Tool {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clang => "clang",
            Self::Lld => "ld.lld",
            Self::Objcopy => "llvm-objcopy",
            Self::Size => "llvm-size",
            Self::Objdump => "llvm-objdump",
            Self::Simulator => "tms9900-trace",
        }
    }
}

/// Locations of the compiler toolchain and simulator.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Directory holding `clang`, `ld.lld` and the LLVM binutils.
    pub llvm_bin: PathBuf,
    /// Cycle-accurate simulator executable.
    pub simulator: PathBuf,
}

impl Toolchain {
    pub fn new(llvm_bin: impl Into<PathBuf>, simulator: impl Into<PathBuf>) -> Self {
        Self {
            llvm_bin: llvm_bin.into(),
            simulator: simulator.into(),
        }
    }

    /// Resolve a tool to its path.
    #[must_use]
    pub fn path(&self, tool: Tool) -> PathBuf {
        match tool {
            Tool::Simulator => self.simulator.clone(),
            _ => self.llvm_bin.join(tool.name()),
        }
    }

    /// Check that every listed tool exists.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::ToolNotFound`] for the first missing tool.
    pub fn require(&self, tools: &[Tool]) -> Result<(), SetupError> {
        for &tool in tools {
            let path = self.path(tool);
            if !path.exists() {
                return Err(SetupError::ToolNotFound {
                    tool: tool.name(),
                    path,
                });
            }
        }
        Ok(())
    }
}

/// Default LLVM build directory inside a checkout.
#[must_use]
pub fn default_llvm_bin(root: &Path) -> PathBuf {
    root.join("llvm-project").join("build").join("bin")
}

/// Default simulator location (`~/personal/ti99/tms9900-trace/build`).
#[must_use]
pub fn default_simulator() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join("personal/ti99/tms9900-trace/build/tms9900-trace")
}

/// Find the project root directory (git root or cwd).
#[must_use]
pub fn find_project_root() -> PathBuf {
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
    {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                return PathBuf::from(path.trim());
            }
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
