//! Outcome classifier - maps terminal conditions to report statuses.

use std::fmt;

use crate::sim::Halt;

/// Status shown in the report for one (benchmark, opt) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// Reached the idle halt.
    Pass,
    /// Explicit stop or step budget exhausted.
    Limit,
    Timeout,
    Error,
    Unknown,
    BuildFail,
    /// Unrecognized terminal condition, uppercased.
    Other(String),
}

impl RunStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pass => "PASS",
            Self::Limit => "LIMIT",
            Self::Timeout => "TIMEOUT",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
            Self::BuildFail => "BUILD_FAIL",
            Self::Other(tag) => tag,
        }
    }

    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for RunStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classify a terminal condition.
///
/// `stop` and `step_limit` both report as `LIMIT`; the raw [`Halt`] stays on
/// the record for anyone who needs to tell them apart.
#[must_use]
pub fn classify(halt: &Halt) -> RunStatus {
    match halt {
        Halt::Idle => RunStatus::Pass,
        Halt::Stop | Halt::StepLimit => RunStatus::Limit,
        Halt::Timeout => RunStatus::Timeout,
        Halt::Error => RunStatus::Error,
        Halt::Unknown => RunStatus::Unknown,
        Halt::Other(tag) => RunStatus::Other(tag.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governed_outcomes() {
        assert_eq!(classify(&Halt::Idle), RunStatus::Pass);
        assert_eq!(classify(&Halt::Stop), RunStatus::Limit);
        assert_eq!(classify(&Halt::StepLimit), RunStatus::Limit);
    }

    #[test]
    fn test_harness_outcomes() {
        assert_eq!(classify(&Halt::Timeout).to_string(), "TIMEOUT");
        assert_eq!(classify(&Halt::Error).to_string(), "ERROR");
        assert_eq!(classify(&Halt::Unknown).to_string(), "UNKNOWN");
        assert_eq!(RunStatus::BuildFail.to_string(), "BUILD_FAIL");
    }

    #[test]
    fn test_passthrough_uppercased() {
        let status = classify(&Halt::parse("illegal_opcode"));
        assert_eq!(status, RunStatus::Other("ILLEGAL_OPCODE".to_string()));
        assert_eq!(status.to_string(), "ILLEGAL_OPCODE");
        assert!(!status.is_pass());
    }

    #[test]
    fn test_tags_from_summary() {
        for (tag, expected) in [
            ("idle", "PASS"),
            ("stop", "LIMIT"),
            ("step_limit", "LIMIT"),
            ("breakpoint", "BREAKPOINT"),
        ] {
            assert_eq!(classify(&Halt::parse(tag)).as_str(), expected, "tag {tag}");
        }
    }

    #[test]
    fn test_serialize_as_string() {
        assert_eq!(serde_json::to_string(&RunStatus::Limit).unwrap(), "\"LIMIT\"");
    }
}
