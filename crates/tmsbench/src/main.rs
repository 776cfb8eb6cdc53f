//! tmsbench CLI - TMS9900 compiler benchmark harness

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;

use cli::Cli;

fn default_directive(cli: &Cli) -> Directive {
    let level = if cli.verbose {
        "tmsbench=debug"
    } else if cli.silent {
        "tmsbench=error"
    } else {
        "tmsbench=warn"
    };
    level
        .parse()
        .unwrap_or_else(|_| tracing::Level::WARN.into())
}

fn main() {
    let cli = Cli::parse();

    // Initialize metrics recorder if enabled
    let metrics_handle = if cli.metrics {
        tmsbench::metrics::CliRecorder::new().install()
    } else {
        None
    };
    tmsbench::metrics::init();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive(&cli)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let exit_code = commands::run_command(&cli);

    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
