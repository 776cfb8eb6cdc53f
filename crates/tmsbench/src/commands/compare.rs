//! `compare` - pass on/off experiment.

use std::path::Path;

use tmsbench::report::render_comparison;
use tmsbench::{CompareTarget, OptLevel, PassExperiment, SimConfig, Tool, compute_deltas};

use super::Context;
use crate::cli::{EXIT_FAILURE, EXIT_SETUP, EXIT_SUCCESS};
use crate::terminal::{self, Spinner};

pub struct CompareArgs<'a> {
    pub opt: OptLevel,
    pub cart: bool,
    pub pass_flag: &'a str,
    pub out_dir: Option<&'a Path>,
    pub simulate: bool,
    pub max_steps: u64,
    pub origin: u16,
}

pub fn cmd_compare(ctx: &Context, args: &CompareArgs<'_>) -> i32 {
    let target = if args.cart {
        CompareTarget::cart(&ctx.root)
    } else {
        CompareTarget::microbench(&ctx.root)
    };
    if !target.source().exists() {
        terminal::error(&format!("source not found: {}", target.source().display()));
        return EXIT_SETUP;
    }

    let mut tools = target.required_tools().to_vec();
    if args.simulate {
        tools.push(Tool::Simulator);
    }
    if let Err(e) = ctx.toolchain.require(&tools) {
        terminal::error(&e.to_string());
        return EXIT_SETUP;
    }

    let mut experiment = PassExperiment::new(ctx.toolchain.clone(), target, args.opt)
        .with_pass_flag(args.pass_flag);
    if let Some(dir) = args.out_dir {
        experiment = experiment.with_out_dir(dir);
    }
    let sim = args.simulate.then(|| {
        SimConfig::new(ctx.toolchain.path(Tool::Simulator))
            .with_max_steps(args.max_steps)
            .with_origin(args.origin)
    });

    terminal::info(&format!(
        "{} at {} with and without {}",
        experiment.target.source().display(),
        args.opt.flag(),
        args.pass_flag
    ));
    let spinner = Spinner::new("building variants");
    let result = experiment.run(sim.as_ref());
    spinner.finish_and_clear();

    match result {
        Ok(comparison) => {
            let deltas = compute_deltas(&comparison);
            print!("{}", render_comparison(&comparison, &deltas));
            EXIT_SUCCESS
        }
        Err(e) => {
            terminal::error(&format!("comparison failed: {e}"));
            EXIT_FAILURE
        }
    }
}
