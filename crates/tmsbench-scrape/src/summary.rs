//! Simulator summary lines (`tms9900-trace -S`).

use serde::Deserialize;

fn unknown_halt() -> String {
    "unknown".to_string()
}

/// Machine-readable run summary printed as the last JSON line of a trace.
///
/// Only the fields the harness consumes are modelled; anything else the
/// simulator adds is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimSummary {
    /// Terminal condition tag (`idle`, `stop`, `step_limit`, ...).
    #[serde(default = "unknown_halt")]
    pub halt: String,
    /// Instructions executed.
    #[serde(default)]
    pub steps: u64,
    /// Cycles consumed.
    #[serde(default)]
    pub clk: u64,
    #[serde(default)]
    pub error: Option<String>,
}

impl SimSummary {
    /// Parse one line as a summary object.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }
}

/// Find the summary in a simulator's combined output.
///
/// Scans from the last line backward, so any amount of trace or diagnostic
/// text may precede the summary. A `{` line that is not valid JSON is passed
/// over and the scan continues upward.
#[must_use]
pub fn find_summary(output: &str) -> Option<SimSummary> {
    output.lines().rev().find_map(SimSummary::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_after_trace() {
        let out = "\
0000  0200 LI   R0,>0010        R0=0010
0004  0580 INC  R0              R0=0011
{\"halt\":\"idle\",\"steps\":1234,\"clk\":5678,\"pc\":\"0x0040\"}
";
        let summary = find_summary(out).unwrap();
        assert_eq!(summary.halt, "idle");
        assert_eq!(summary.steps, 1234);
        assert_eq!(summary.clk, 5678);
        assert_eq!(summary.error, None);
    }

    #[test]
    fn test_last_summary_wins() {
        let out = "{\"halt\":\"stop\",\"steps\":1,\"clk\":2}\n{\"halt\":\"idle\",\"steps\":3,\"clk\":4}\n";
        assert_eq!(find_summary(out).unwrap().halt, "idle");
    }

    #[test]
    fn test_malformed_brace_line_skipped() {
        let out = "{\"halt\":\"idle\",\"steps\":10,\"clk\":20}\n{ not json\n";
        let summary = find_summary(out).unwrap();
        assert_eq!(summary.steps, 10);
    }

    #[test]
    fn test_missing_fields_default() {
        let summary = find_summary("  {\"error\":\"bad opcode\"}  ").unwrap();
        assert_eq!(summary.halt, "unknown");
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.clk, 0);
        assert_eq!(summary.error.as_deref(), Some("bad opcode"));
    }

    #[test]
    fn test_no_summary() {
        assert_eq!(find_summary(""), None);
        assert_eq!(find_summary("loaded 512 bytes\nhalted\n"), None);
        assert_eq!(find_summary("halt: {\"halt\":\"idle\"}"), None);
    }
}
