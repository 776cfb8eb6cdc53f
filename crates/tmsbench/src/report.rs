//! Rendering of suite records and pass comparisons.

use std::fmt::Write as _;

use crate::compare::{Comparison, Delta, Measured};
use crate::suite::{MetricsRecord, SuiteSummary};

/// CSV header, one row per record follows.
pub const CSV_HEADER: &str = "benchmark,opt,status,code_bytes,steps,cycles";

/// Column alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// Fixed-width text table.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    alignments: Vec<Alignment>,
}

impl Table {
    #[must_use]
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: Vec::new(),
            alignments: vec![Alignment::Left; headers.len()],
        }
    }

    #[must_use]
    pub fn with_alignments(mut self, alignments: Vec<Alignment>) -> Self {
        self.alignments = alignments;
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn write_row(&self, out: &mut String, cells: &[String], widths: &[usize]) {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            let w = widths.get(i).copied().unwrap_or(0);
            if i > 0 {
                line.push_str("  ");
            }
            match self.alignments.get(i).copied().unwrap_or_default() {
                Alignment::Left => {
                    let _ = write!(line, "{cell:<w$}");
                }
                Alignment::Right => {
                    let _ = write!(line, "{cell:>w$}");
                }
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    /// Header, a dash rule, then the rows.
    #[must_use]
    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(String::len).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let mut out = String::new();
        self.write_row(&mut out, &self.headers, &widths);
        let rule = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
        out.push_str(&"-".repeat(rule));
        out.push('\n');
        for row in &self.rows {
            self.write_row(&mut out, row, &widths);
        }
        out
    }
}

/// Aligned result table.
#[must_use]
pub fn render_table(records: &[MetricsRecord]) -> String {
    let mut table = Table::new(&["Benchmark", "Opt", "Status", "Code", "Steps", "Cycles"])
        .with_alignments(vec![
            Alignment::Left,
            Alignment::Left,
            Alignment::Left,
            Alignment::Right,
            Alignment::Right,
            Alignment::Right,
        ]);
    for r in records {
        table.add_row(vec![
            r.bench.clone(),
            r.opt.tag(),
            r.status.to_string(),
            format!("{}B", r.code_size),
            r.steps.to_string(),
            r.cycles.to_string(),
        ]);
    }
    table.render()
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV with [`CSV_HEADER`]; `opt` is the level label (`O0`, `Os`).
#[must_use]
pub fn render_csv(records: &[MetricsRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in records {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_field(&r.bench),
            r.opt.tag(),
            csv_field(r.status.as_str()),
            r.code_size,
            r.steps,
            r.cycles
        );
    }
    out
}

/// Pretty-printed JSON array of records.
///
/// # Errors
///
/// Returns an error if a record fails to serialize.
pub fn render_json(records: &[MetricsRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// `[+] fib -O0: PASS (128B, 1234 steps, 5678 cycles)`.
#[must_use]
pub fn progress_line(record: &MetricsRecord) -> String {
    let marker = if record.status.is_pass() { '+' } else { '-' };
    let mut line = format!(
        "[{marker}] {} {}: {} ({}B, {} steps, {} cycles)",
        record.bench,
        record.opt.flag(),
        record.status,
        record.code_size,
        record.steps,
        record.cycles
    );
    if let Some(error) = &record.error {
        if let Some(first) = error.lines().find(|l| !l.trim().is_empty()) {
            let _ = write!(line, " - {}", first.trim());
        }
    }
    line
}

/// `k/n passed`.
#[must_use]
pub fn summary_line(summary: &SuiteSummary) -> String {
    summary.to_string()
}

/// Static profile (and run, if any) of one comparison side.
#[must_use]
pub fn render_inspection(label: &str, measured: &Measured) -> String {
    let inspection = &measured.inspection;
    let profile = &inspection.profile;

    let mut out = format!("{label}:\n");
    let _ = writeln!(out, "  .text size:        {} bytes", inspection.text_size);
    if let Some(bin) = inspection.bin_size {
        let _ = writeln!(out, "  image size:        {bin} bytes");
    }
    let _ = writeln!(out, "  instructions:      {}", profile.instructions);
    let _ = writeln!(out, "  word *R+ operands: {}", profile.post_increment.word);
    let _ = writeln!(out, "  byte *R+ operands: {}", profile.post_increment.byte);
    let mnemonics: Vec<String> = profile
        .watched()
        .map(|(m, n)| format!("{m}={n}"))
        .collect();
    let _ = writeln!(out, "  mnemonics:         {}", mnemonics.join(" "));
    if let Some(run) = &measured.run {
        let _ = writeln!(
            out,
            "  run:               {} ({} steps, {} cycles)",
            run.halt, run.steps, run.cycles
        );
    }
    out
}

fn render_delta(delta: &Delta) -> String {
    let mut line = format!("{} delta: {:+}", delta.label, delta.absolute());
    if let Some(unit) = delta.unit {
        line.push(' ');
        line.push_str(unit);
    }
    if let Some(pct) = delta.percent() {
        let _ = write!(line, " ({pct:+.2}%)");
    }
    line
}

/// One line per delta; the percentage is omitted for a zero baseline.
#[must_use]
pub fn render_deltas(deltas: &[Delta]) -> String {
    deltas.iter().fold(String::new(), |mut out, d| {
        out.push_str(&render_delta(d));
        out.push('\n');
        out
    })
}

/// Both sides followed by their deltas.
#[must_use]
pub fn render_comparison(comparison: &Comparison, deltas: &[Delta]) -> String {
    let mut out = render_inspection("pass off", &comparison.off);
    out.push('\n');
    out.push_str(&render_inspection("pass on", &comparison.on));
    out.push('\n');
    out.push_str(&render_deltas(deltas));
    if let Some((off, on)) = comparison.run_statuses() {
        if !comparison.cycles_comparable() {
            let _ = writeln!(
                out,
                "cycle delta: invalid (pass off run {off}, pass on run {on})"
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::OptLevel;
    use crate::inspect::Inspection;
    use crate::sim::{Halt, RunResult};
    use crate::status::RunStatus;
    use tmsbench_scrape::InstructionProfile;

    fn record(bench: &str, opt: OptLevel, status: RunStatus) -> MetricsRecord {
        MetricsRecord {
            bench: bench.to_string(),
            opt,
            status,
            code_size: 128,
            steps: 1234,
            cycles: 5678,
            halt: Some(Halt::Idle),
            error: None,
        }
    }

    #[test]
    fn test_progress_line() {
        let r = record("fib", OptLevel::O0, RunStatus::Pass);
        assert_eq!(
            progress_line(&r),
            "[+] fib -O0: PASS (128B, 1234 steps, 5678 cycles)"
        );
    }

    #[test]
    fn test_progress_line_failure_appends_error() {
        let mut r = MetricsRecord::build_failure("sieve", OptLevel::O2, "\nundefined symbol: foo\n");
        r.code_size = 0;
        assert_eq!(
            progress_line(&r),
            "[-] sieve -O2: BUILD_FAIL (0B, 0 steps, 0 cycles) - undefined symbol: foo"
        );
    }

    #[test]
    fn test_render_csv() {
        let records = [
            record("fib", OptLevel::O0, RunStatus::Pass),
            record("fib", OptLevel::Os, RunStatus::Limit),
        ];
        assert_eq!(
            render_csv(&records),
            "benchmark,opt,status,code_bytes,steps,cycles\n\
             fib,O0,PASS,128,1234,5678\n\
             fib,Os,LIMIT,128,1234,5678\n"
        );
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[record("fib", OptLevel::O2, RunStatus::Pass)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Benchmark"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("fib"));
        assert!(lines[2].contains("O2"));
        assert!(lines[2].ends_with("5678"));
    }

    #[test]
    fn test_table_right_alignment() {
        let mut table = Table::new(&["a", "n"]).with_alignments(vec![Alignment::Left, Alignment::Right]);
        table.add_row(vec!["x".into(), "7".into()]);
        table.add_row(vec!["long".into(), "1000".into()]);
        assert_eq!(table.render(), "a        n\n----------\nx        7\nlong  1000\n");
    }

    #[test]
    fn test_render_json() {
        let mut r = record("fib", OptLevel::O1, RunStatus::Pass);
        r.halt = None;
        let json = render_json(&[r]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["bench"], "fib");
        assert_eq!(value[0]["opt"], "O1");
        assert_eq!(value[0]["status"], "PASS");
        assert_eq!(value[0]["cycles"], 5678);
        assert!(value[0].get("halt").is_none());
        assert!(value[0].get("error").is_none());
    }

    #[test]
    fn test_summary_line() {
        let records = [
            record("fib", OptLevel::O0, RunStatus::Pass),
            record("fib", OptLevel::O1, RunStatus::Timeout),
        ];
        assert_eq!(summary_line(&SuiteSummary::from_records(&records)), "1/2 passed");
    }

    #[test]
    fn test_render_deltas() {
        let deltas = [
            Delta::new("size", Some("bytes"), 90, 100),
            Delta::new("instruction", None, 45, 40),
            Delta::new("word *R+", None, 3, 0),
        ];
        assert_eq!(
            render_deltas(&deltas),
            "size delta: -10 bytes (-10.00%)\n\
             instruction delta: +5 (+12.50%)\n\
             word *R+ delta: +3\n"
        );
    }

    #[test]
    fn test_render_comparison_flags_failed_runs() {
        let measured = |run: RunResult| Measured {
            inspection: Inspection {
                text_size: 8,
                profile: InstructionProfile::default(),
                bin_size: None,
            },
            run: Some(run),
        };
        let comparison = Comparison {
            off: measured(RunResult::timeout(5_000_000)),
            on: measured(RunResult {
                halt: Halt::Idle,
                steps: 40,
                cycles: 800,
                error: None,
            }),
        };
        let deltas = crate::compare::compute_deltas(&comparison);
        let text = render_comparison(&comparison, &deltas);
        assert!(!text.contains("cycle delta: +"));
        assert!(text.contains("cycle delta: invalid (pass off run TIMEOUT, pass on run PASS)"));
    }

    #[test]
    fn test_render_inspection() {
        let measured = Measured {
            inspection: Inspection {
                text_size: 42,
                profile: InstructionProfile::from_disassembly("0: cc b1  MOV  *R1+, *R2+\n"),
                bin_size: Some(64),
            },
            run: Some(RunResult {
                halt: Halt::Idle,
                steps: 10,
                cycles: 140,
                error: None,
            }),
        };
        let text = render_inspection("pass on", &measured);
        assert!(text.starts_with("pass on:\n"));
        assert!(text.contains(".text size:        42 bytes"));
        assert!(text.contains("image size:        64 bytes"));
        assert!(text.contains("word *R+ operands: 1"));
        assert!(text.contains("MOV=1"));
        assert!(text.contains("idle (10 steps, 140 cycles)"));
    }
}
