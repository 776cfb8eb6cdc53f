//! Suite pipeline through the real backend, with fake make, size and
//! simulator scripts.

#![cfg(unix)]


use std::path::{Path, PathBuf};

use tempfile::TempDir;
use test_utils::{serial, write_script};
use tmsbench::registry::resolve_benchmarks;
use tmsbench::report::summary_line;
use tmsbench::{
    BuildLayout, Halt, OptLevel, RunStatus, SimConfig, SuiteSummary, ToolchainBackend, run_suite,
};

const LAST_ARG: &str = r#"for a in "$@"; do last="$a"; done"#;

/// `make -C <dir> <bench> OPT=<v>` writing `build/O<v>/<bench>.{elf,bin}`.
const FAKE_MAKE: &str = r#"dir="$2"
bench="$3"
opt="${4#OPT=}"
mkdir -p "$dir/build/O$opt"
: > "$dir/build/O$opt/$bench.elf"
: > "$dir/build/O$opt/$bench.bin""#;

struct Fixture {
    _tmp: TempDir,
    markers: PathBuf,
    backend: ToolchainBackend,
}

/// Size and simulator scripts answer only for the expected artifact kind and
/// leave a marker file per invocation.
fn fixture(make_body: &str) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let markers = root.join("markers");
    std::fs::create_dir(&markers).unwrap();
    let bench_dir = root.join("tests").join("benchmarks");
    std::fs::create_dir_all(&bench_dir).unwrap();

    let make = write_script(root, "make", make_body);
    let size = write_script(
        root,
        "llvm-size",
        &format!(
            r#"touch "{m}/size"
{LAST_ARG}
case "$last" in
  *.elf) echo "section size addr"; echo ".text 64 0" ;;
esac"#,
            m = markers.display()
        ),
    );
    let sim = write_script(
        root,
        "tms9900-trace",
        &format!(
            r#"touch "{m}/simulated"
{LAST_ARG}
case "$last" in
  */O0/*.bin) echo '{{"halt":"idle","steps":300,"clk":4200}}' ;;
  *.bin) echo '{{"halt":"idle","steps":200,"clk":2800}}' ;;
  *) echo "not an image: $last" >&2; exit 1 ;;
esac"#,
            m = markers.display()
        ),
    );

    Fixture {
        backend: ToolchainBackend {
            layout: BuildLayout::new(&bench_dir).with_make(make),
            size_tool: size,
            sim: SimConfig::new(sim),
        },
        markers,
        _tmp: tmp,
    }
}

fn marked(markers: &Path, name: &str) -> bool {
    markers.join(name).exists()
}

#[test]
fn builds_sizes_and_runs_each_pair() {
    let _guard = serial();
    let fx = fixture(FAKE_MAKE);
    let benches = resolve_benchmarks(&["fib"]).unwrap();
    let records = run_suite(&fx.backend, &benches, &[OptLevel::O0, OptLevel::O2], &mut ());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].opt, OptLevel::O0);
    assert_eq!(records[1].opt, OptLevel::O2);
    for record in &records {
        assert_eq!(record.bench, "fib");
        assert_eq!(record.status, RunStatus::Pass);
        assert_eq!(record.halt, Some(Halt::Idle));
        // size tool only answers for the .elf
        assert_eq!(record.code_size, 64);
    }
    // simulator only answers for the .bin under the right build dir
    assert_eq!((records[0].steps, records[0].cycles), (300, 4200));
    assert_eq!((records[1].steps, records[1].cycles), (200, 2800));

    let artifact = fx.backend.layout.artifact("fib", OptLevel::O2);
    assert!(artifact.elf.exists());
    assert!(artifact.image.exists());

    let summary = SuiteSummary::from_records(&records);
    assert_eq!(summary_line(&summary), "2/2 passed");
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn failing_make_short_circuits_the_pair() {
    let _guard = serial();
    let fx = fixture("echo 'fib.c:12: error: use of undeclared identifier' >&2\nexit 2");
    let benches = resolve_benchmarks(&["fib"]).unwrap();
    let records = run_suite(&fx.backend, &benches, &[OptLevel::O0, OptLevel::O2], &mut ());

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.status, RunStatus::BuildFail);
        assert_eq!((record.code_size, record.steps, record.cycles), (0, 0, 0));
        assert!(record.halt.is_none());
        assert!(
            record
                .error
                .as_deref()
                .unwrap()
                .contains("use of undeclared identifier")
        );
    }
    assert!(!marked(&fx.markers, "size"));
    assert!(!marked(&fx.markers, "simulated"));

    let summary = SuiteSummary::from_records(&records);
    assert_eq!(summary_line(&summary), "0/2 passed");
    assert_eq!(summary.exit_code(), 1);
}
