//! Benchmark registry - the fixed set of suite programs.

use crate::error::SetupError;

/// How a benchmark signals success to the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltSemantics {
    /// Executes `IDLE` after verifying its result.
    Idle,
    /// Stops through some other terminal condition.
    Stop,
}

impl HaltSemantics {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Stop => "stop",
        }
    }
}

/// Benchmark metadata.
#[derive(Debug)]
pub struct BenchmarkInfo {
    /// Benchmark name (used in CLI, make targets and artifact paths).
    pub name: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Expected terminal condition on success.
    pub halt: HaltSemantics,
}

/// All registered benchmarks, in suite order.
/// Sources live in `tests/benchmarks/{name}.c`.
pub const BENCHMARKS: &[BenchmarkInfo] = &[
    BenchmarkInfo {
        name: "fib",
        description: "First 16 Fibonacci numbers (16-bit add loop)",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "bubble_sort",
        description: "Bubble sort of 16 signed words",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "deep_recursion",
        description: "Recursive sum_down(64)",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "crc32",
        description: "Bitwise CRC32 over a 32-byte buffer",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "q7_8_matmul",
        description: "Q7.8 fixed-point 2x2 matrix multiply",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "json_parse",
        description: "Minimal JSON tokenizer",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "string_torture",
        description: "String library routines",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "float_torture",
        description: "Soft-float arithmetic and conversions",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "bitops_torture",
        description: "Popcount, bswap, rotates and CLZ/CTZ builtins",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "vertex3d",
        description: "Fixed-point 3D vertex transform",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "huffman",
        description: "Huffman encode/decode round trip",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "long_torture",
        description: "32-bit arithmetic lowering on a 16-bit CPU",
        halt: HaltSemantics::Idle,
    },
    BenchmarkInfo {
        name: "heap4",
        description: "FreeRTOS heap_4-style allocator",
        halt: HaltSemantics::Idle,
    },
];

/// Find benchmark by name.
#[must_use]
pub fn find_benchmark(name: &str) -> Option<&'static BenchmarkInfo> {
    BENCHMARKS.iter().find(|b| b.name == name)
}

/// Resolve requested names against the registry, preserving request order.
///
/// An empty request selects the whole registry.
///
/// # Errors
///
/// Returns [`SetupError::UnknownBenchmark`] for the first unregistered name.
pub fn resolve_benchmarks<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<&'static BenchmarkInfo>, SetupError> {
    if names.is_empty() {
        return Ok(BENCHMARKS.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            find_benchmark(name.as_ref()).ok_or_else(|| SetupError::UnknownBenchmark {
                name: name.as_ref().to_string(),
            })
        })
        .collect()
}

/// Comma-separated list of registered names, for usage messages.
#[must_use]
pub fn available_names() -> String {
    BENCHMARKS
        .iter()
        .map(|b| b.name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_unique() {
        for (i, a) in BENCHMARKS.iter().enumerate() {
            for b in &BENCHMARKS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_resolve_all_when_empty() {
        let all = resolve_benchmarks::<&str>(&[]).unwrap();
        assert_eq!(all.len(), BENCHMARKS.len());
        assert_eq!(all[0].name, "fib");
    }

    #[test]
    fn test_resolve_preserves_order() {
        let picked = resolve_benchmarks(&["crc32", "fib"]).unwrap();
        let names: Vec<_> = picked.iter().map(|b| b.name).collect();
        assert_eq!(names, ["crc32", "fib"]);
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve_benchmarks(&["fib", "dhrystone"]).unwrap_err();
        assert!(matches!(err, SetupError::UnknownBenchmark { ref name } if name == "dhrystone"));
        assert_eq!(err.to_string(), "unknown benchmark: dhrystone");
    }
}
