//! Command implementations.
//!
//! Each submodule handles one CLI subcommand.

mod compare;
mod list;
mod suite;

use std::path::PathBuf;

use tmsbench::Toolchain;
use tmsbench::toolchain::{default_llvm_bin, default_simulator, find_project_root};

use crate::cli::{Cli, Commands, FormatArg};

/// Resolved checkout root and tool locations.
pub struct Context {
    pub root: PathBuf,
    pub toolchain: Toolchain,
}

impl Context {
    fn from_cli(cli: &Cli) -> Self {
        let root = cli.root.clone().unwrap_or_else(find_project_root);
        let llvm_bin = cli
            .llvm_bin
            .clone()
            .unwrap_or_else(|| default_llvm_bin(&root));
        let simulator = cli.simulator.clone().unwrap_or_else(default_simulator);
        Self {
            root,
            toolchain: Toolchain::new(llvm_bin, simulator),
        }
    }
}

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Suite {
            opts,
            benches,
            csv,
            format,
            max_steps,
            timeout,
        } => {
            let format = if *csv { FormatArg::Csv } else { *format };
            suite::cmd_suite(
                &Context::from_cli(cli),
                opts,
                benches,
                format,
                *max_steps,
                *timeout,
                cli.silent,
            )
        }
        Commands::Compare {
            opt,
            cart,
            pass_flag,
            out_dir,
            simulate,
            max_steps,
            origin,
        } => compare::cmd_compare(
            &Context::from_cli(cli),
            &compare::CompareArgs {
                opt: (*opt).into(),
                cart: *cart,
                pass_flag,
                out_dir: out_dir.as_deref(),
                simulate: *simulate,
                max_steps: *max_steps,
                origin: *origin,
            },
        ),
        Commands::List => list::cmd_list(),
    }
}
