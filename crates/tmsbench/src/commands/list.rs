//! `list` - registered benchmarks.

use tmsbench::BENCHMARKS;
use tmsbench::report::Table;

use crate::cli::EXIT_SUCCESS;

pub fn cmd_list() -> i32 {
    let mut table = Table::new(&["Benchmark", "Halt", "Description"]);
    for bench in BENCHMARKS {
        table.add_row(vec![
            bench.name.to_string(),
            bench.halt.as_str().to_string(),
            bench.description.to_string(),
        ]);
    }
    print!("{}", table.render());
    EXIT_SUCCESS
}
