//! `suite` - build, run and report every (benchmark, opt) pair.

use std::time::Duration;

use tmsbench::registry::{available_names, resolve_benchmarks};
use tmsbench::report::{progress_line, render_csv, render_json, render_table, summary_line};
use tmsbench::{
    BenchmarkInfo, BuildLayout, MetricsRecord, OptLevel, SimConfig, SuiteObserver, SuiteSummary,
    Tool, ToolchainBackend, run_suite,
};

use super::Context;
use crate::cli::{EXIT_FAILURE, EXIT_SETUP, FormatArg, OptArg};
use crate::terminal::{self, Spinner};

/// Spinner while a pair builds and runs, one progress line per finished pair.
struct ProgressObserver {
    spinner: Option<Spinner>,
    quiet: bool,
}

impl SuiteObserver for ProgressObserver {
    fn pair_started(&mut self, bench: &BenchmarkInfo, opt: OptLevel) {
        if self.quiet {
            return;
        }
        let message = format!("{} {}", bench.name, opt.flag());
        if let Some(spinner) = &self.spinner {
            spinner.set_message(message);
        } else {
            self.spinner = Some(Spinner::new(message));
        }
    }

    fn pair_finished(&mut self, record: &MetricsRecord) {
        if let Some(spinner) = &self.spinner {
            spinner.println(&progress_line(record));
        }
    }
}

pub fn cmd_suite(
    ctx: &Context,
    opts: &[OptArg],
    benches: &[String],
    format: FormatArg,
    max_steps: u64,
    timeout_secs: u64,
    silent: bool,
) -> i32 {
    let benches = match resolve_benchmarks(benches) {
        Ok(benches) => benches,
        Err(e) => {
            terminal::error(&e.to_string());
            terminal::dim(&format!("Available: {}", available_names()));
            return EXIT_SETUP;
        }
    };
    if let Err(e) = ctx.toolchain.require(&[Tool::Clang, Tool::Simulator]) {
        terminal::error(&e.to_string());
        return EXIT_SETUP;
    }

    let opts: Vec<OptLevel> = if opts.is_empty() {
        OptLevel::SUITE_DEFAULT.to_vec()
    } else {
        opts.iter().map(|&o| o.into()).collect()
    };

    let backend = ToolchainBackend {
        layout: BuildLayout::for_root(&ctx.root),
        size_tool: ctx.toolchain.path(Tool::Size),
        sim: SimConfig::new(ctx.toolchain.path(Tool::Simulator))
            .with_max_steps(max_steps)
            .with_timeout(Duration::from_secs(timeout_secs)),
    };

    let records = if format == FormatArg::Table {
        let mut observer = ProgressObserver {
            spinner: None,
            quiet: silent,
        };
        let records = run_suite(&backend, &benches, &opts, &mut observer);
        if let Some(spinner) = &observer.spinner {
            spinner.finish_and_clear();
        }
        records
    } else {
        run_suite(&backend, &benches, &opts, &mut ())
    };

    match format {
        FormatArg::Table => print!("{}", render_table(&records)),
        FormatArg::Csv => print!("{}", render_csv(&records)),
        FormatArg::Json => match render_json(&records) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                terminal::error(&format!("failed to encode results: {e}"));
                return EXIT_FAILURE;
            }
        },
    }

    let summary = SuiteSummary::from_records(&records);
    if summary.all_passed() {
        terminal::success(&summary_line(&summary));
    } else {
        terminal::warning(&summary_line(&summary));
    }
    summary.exit_code()
}
