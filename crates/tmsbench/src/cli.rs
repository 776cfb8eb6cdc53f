//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tmsbench::OptLevel;
use tmsbench::compare::DEFAULT_PASS_FLAG;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for environment/setup errors.
pub const EXIT_SETUP: i32 = 2;

#[derive(Parser)]
#[command(name = "tmsbench")]
#[command(about = "TMS9900 compiler benchmark harness")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets tmsbench=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    /// Compiler checkout root (default: git top-level, else cwd)
    #[arg(long, global = true, env = "TMS9900_ROOT")]
    pub root: Option<PathBuf>,

    /// Directory holding clang, ld.lld and the llvm-* tools
    #[arg(long, global = true, env = "TMS9900_LLVM_BIN")]
    pub llvm_bin: Option<PathBuf>,

    /// Simulator executable
    #[arg(long, global = true, env = "TMS9900_TRACE")]
    pub simulator: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and run the benchmark suite
    Suite {
        /// Optimization levels (repeatable; default 0, 1, 2)
        #[arg(short = 'O', long = "opt", value_enum)]
        opts: Vec<OptArg>,

        /// Benchmarks to run (repeatable; default all)
        #[arg(short, long = "bench", value_name = "NAME")]
        benches: Vec<String>,

        /// Emit CSV instead of a table (same as --format csv)
        #[arg(long)]
        csv: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "table", conflicts_with = "csv")]
        format: FormatArg,

        /// Simulator step budget per run
        #[arg(long, default_value_t = tmsbench::sim::DEFAULT_MAX_STEPS)]
        max_steps: u64,

        /// Wall-clock limit per simulator run, in seconds
        #[arg(long, default_value = "60", value_name = "SECS")]
        timeout: u64,
    },

    /// Compare one build with a compiler pass disabled and enabled
    Compare {
        /// Optimization level
        #[arg(short = 'O', long, value_enum, default_value = "2")]
        opt: OptArg,

        /// Build the cartridge example instead of the microbenchmark
        #[arg(long)]
        cart: bool,

        /// Backend option that disables the pass under test
        #[arg(long, default_value = DEFAULT_PASS_FLAG)]
        pass_flag: String,

        /// Directory for build outputs (default: <tmp>/peephole_bench)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Also run both cartridge images and diff cycle counts
        #[arg(long, requires = "cart")]
        simulate: bool,

        /// Simulator step budget per run
        #[arg(long, default_value_t = tmsbench::sim::DEFAULT_MAX_STEPS)]
        max_steps: u64,

        /// Load and entry address of the cartridge image
        #[arg(long, default_value = "0x6000", value_parser = parse_addr)]
        origin: u16,
    },

    /// List registered benchmarks
    List,
}

/// Parse a 16-bit address in hex (`0x6000`) or decimal.
fn parse_addr(s: &str) -> Result<u16, String> {
    let parsed = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .map_or_else(|| s.parse::<u16>(), |hex| u16::from_str_radix(hex, 16));
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

// ============================================================================
// Argument types with conversions
// ============================================================================

/// Optimization level argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OptArg {
    #[value(name = "0", alias = "O0")]
    O0,
    #[value(name = "1", alias = "O1")]
    O1,
    #[value(name = "2", alias = "O2")]
    O2,
    #[value(name = "3", alias = "O3")]
    O3,
    #[value(name = "s", alias = "Os")]
    Os,
}

impl From<OptArg> for OptLevel {
    fn from(arg: OptArg) -> Self {
        match arg {
            OptArg::O0 => Self::O0,
            OptArg::O1 => Self::O1,
            OptArg::O2 => Self::O2,
            OptArg::O3 => Self::O3,
            OptArg::Os => Self::Os,
        }
    }
}

/// Suite report format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Progress lines, then an aligned table
    #[default]
    Table,
    /// CSV on stdout
    Csv,
    /// Pretty JSON on stdout
    Json,
}
