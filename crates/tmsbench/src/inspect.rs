//! Static inspection of built artifacts (section sizes, disassembly).

use std::path::Path;
use std::process::Command;

use tmsbench_scrape::{InstructionProfile, parse_text_size};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::process::capture;
use crate::toolchain::{Tool, Toolchain};

/// `.text` size of an artifact via `llvm-size -A`.
///
/// A missing `.text` row and a failing size tool both yield 0; the suite
/// reports size as a metric, not a correctness condition.
pub fn code_size(size_tool: &Path, artifact: &Path) -> u64 {
    match capture(Command::new(size_tool).arg("-A").arg(artifact)) {
        Ok(out) => parse_text_size(&out),
        Err(e) => {
            warn!(artifact = %artifact.display(), "size query failed: {e}");
            0
        }
    }
}

/// Static profile of one built variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// `.text` bytes.
    pub text_size: u64,
    pub profile: InstructionProfile,
    /// Raw image bytes, when the variant produced one.
    pub bin_size: Option<u64>,
}

impl Inspection {
    #[must_use]
    pub fn with_bin_size(mut self, size: u64) -> Self {
        self.bin_size = Some(size);
        self
    }
}

/// Size table and disassembly profile of an object or ELF.
///
/// # Errors
///
/// Returns a [`ToolError`] if `llvm-size` or `llvm-objdump` fails.
pub fn inspect(toolchain: &Toolchain, artifact: &Path) -> Result<Inspection, ToolError> {
    let size_out = capture(
        Command::new(toolchain.path(Tool::Size))
            .arg("--format=SysV")
            .arg("-A")
            .arg(artifact),
    )?;
    let disasm = capture(
        Command::new(toolchain.path(Tool::Objdump))
            .arg("-d")
            .arg(artifact),
    )?;

    let inspection = Inspection {
        text_size: parse_text_size(&size_out),
        profile: InstructionProfile::from_disassembly(&disasm),
        bin_size: None,
    };
    debug!(
        artifact = %artifact.display(),
        text = inspection.text_size,
        instructions = inspection.profile.instructions,
        "inspected"
    );
    Ok(inspection)
}
