//! Pass on/off comparison: build one source twice, differing only in
//! whether a single compiler pass runs, and diff the results.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::build::OptLevel;
use crate::error::Result;
use crate::inspect::{self, Inspection};
use crate::process::capture;
use crate::sim::{self, RunResult, SimConfig};
use crate::status::{RunStatus, classify};
use crate::toolchain::{Tool, Toolchain};

/// Backend option disabling the peephole pass.
pub const DEFAULT_PASS_FLAG: &str = "-tms9900-disable-peephole";

/// Sections copied into a cartridge image, in load order.
pub const CART_SECTIONS: &[&str] = &[".cart_header", ".cart_entry", ".text", ".rodata", ".data"];

const TARGET_TRIPLE: &str = "--target=tms9900";

/// Which side of the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Pass disabled (the baseline).
    Off,
    /// Pass enabled (compiler default).
    On,
}

impl Variant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }
}

/// What gets built.
#[derive(Debug, Clone)]
pub enum CompareTarget {
    /// A single translation unit compiled to an object file.
    Microbench { source: PathBuf },
    /// A cartridge program linked with its startup code into a raw image.
    Cart { dir: PathBuf, source: PathBuf },
}

impl CompareTarget {
    /// `tests/peephole_bench.c` in a checkout.
    #[must_use]
    pub fn microbench(root: &Path) -> Self {
        Self::Microbench {
            source: root.join("tests").join("peephole_bench.c"),
        }
    }

    /// `cart_example/ball2.c` in a checkout.
    #[must_use]
    pub fn cart(root: &Path) -> Self {
        let dir = root.join("cart_example");
        Self::Cart {
            source: dir.join("ball2.c"),
            dir,
        }
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        match self {
            Self::Microbench { source } | Self::Cart { source, .. } => source,
        }
    }

    fn stem(&self) -> String {
        self.source()
            .file_stem()
            .map_or_else(|| "bench".to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// Tools this target needs.
    #[must_use]
    pub const fn required_tools(&self) -> &'static [Tool] {
        match self {
            Self::Microbench { .. } => &[Tool::Clang, Tool::Size, Tool::Objdump],
            Self::Cart { .. } => &[
                Tool::Clang,
                Tool::Lld,
                Tool::Objcopy,
                Tool::Size,
                Tool::Objdump,
            ],
        }
    }
}

/// Outputs of one variant build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltVariant {
    /// Object or ELF to inspect.
    pub inspect: PathBuf,
    /// Raw image, for targets that produce one.
    pub image: Option<PathBuf>,
}

/// Measurements of one variant.
#[derive(Debug, Clone)]
pub struct Measured {
    pub inspection: Inspection,
    pub run: Option<RunResult>,
}

/// Both sides of a finished experiment.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub off: Measured,
    pub on: Measured,
}

impl Comparison {
    /// Run statuses as `(off, on)`, when both variants were simulated.
    #[must_use]
    pub fn run_statuses(&self) -> Option<(RunStatus, RunStatus)> {
        match (&self.off.run, &self.on.run) {
            (Some(off), Some(on)) => Some((classify(&off.halt), classify(&on.halt))),
            _ => None,
        }
    }

    /// Cycle counts are only measurements when both runs reached the idle halt.
    #[must_use]
    pub fn cycles_comparable(&self) -> bool {
        self.run_statuses()
            .is_some_and(|(off, on)| off.is_pass() && on.is_pass())
    }
}

/// One compiled experiment definition.
#[derive(Debug, Clone)]
pub struct PassExperiment {
    pub toolchain: Toolchain,
    pub target: CompareTarget,
    pub opt: OptLevel,
    /// `-mllvm` option that disables the pass under test.
    pub pass_flag: String,
    pub out_dir: PathBuf,
}

impl PassExperiment {
    pub fn new(toolchain: Toolchain, target: CompareTarget, opt: OptLevel) -> Self {
        Self {
            toolchain,
            target,
            opt,
            pass_flag: DEFAULT_PASS_FLAG.to_string(),
            out_dir: std::env::temp_dir().join("peephole_bench"),
        }
    }

    #[must_use]
    pub fn with_pass_flag(mut self, flag: impl Into<String>) -> Self {
        self.pass_flag = flag.into();
        self
    }

    #[must_use]
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    fn work_dir(&self) -> PathBuf {
        match self.target {
            CompareTarget::Microbench { .. } => self.out_dir.clone(),
            CompareTarget::Cart { .. } => self.out_dir.join(self.target.stem()),
        }
    }

    fn output(&self, variant: Variant, ext: &str) -> PathBuf {
        self.work_dir().join(format!(
            "{}_{}_{}.{ext}",
            self.target.stem(),
            self.opt.as_str(),
            variant.as_str()
        ))
    }

    /// Compile the source for one variant.
    ///
    /// Both variants get identical arguments apart from the output path;
    /// `Off` additionally passes `-mllvm <pass_flag>`.
    #[must_use]
    pub fn compile_command(&self, variant: Variant) -> Command {
        let mut cmd = Command::new(self.toolchain.path(Tool::Clang));
        cmd.arg(TARGET_TRIPLE)
            .arg(self.opt.flag())
            .arg("-fno-builtin")
            .arg("-ffreestanding");
        if matches!(self.target, CompareTarget::Cart { .. }) {
            cmd.arg("-Wno-main-return-type");
        }
        cmd.arg("-c")
            .arg(self.target.source())
            .arg("-o")
            .arg(self.output(variant, "o"));
        if variant == Variant::Off {
            cmd.arg("-mllvm").arg(&self.pass_flag);
        }
        cmd
    }

    /// Build one variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created or any
    /// toolchain step fails.
    pub fn build(&self, variant: Variant) -> Result<BuiltVariant> {
        let work = self.work_dir();
        std::fs::create_dir_all(&work)?;
        debug!(variant = variant.as_str(), dir = %work.display(), "building variant");

        capture(&mut self.compile_command(variant))?;
        let obj = self.output(variant, "o");

        let CompareTarget::Cart { dir, .. } = &self.target else {
            return Ok(BuiltVariant {
                inspect: obj,
                image: None,
            });
        };

        let crt = work.join(format!("crt0_{}.o", variant.as_str()));
        let elf = self.output(variant, "elf");
        let bin = self.output(variant, "bin");

        capture(
            Command::new(self.toolchain.path(Tool::Clang))
                .arg(TARGET_TRIPLE)
                .arg("-c")
                .arg(dir.join("crt0.s"))
                .arg("-o")
                .arg(&crt),
        )?;
        capture(
            Command::new(self.toolchain.path(Tool::Lld))
                .arg("-T")
                .arg(dir.join("cart.ld"))
                .arg(&crt)
                .arg(&obj)
                .arg("-o")
                .arg(&elf),
        )?;
        let mut objcopy = Command::new(self.toolchain.path(Tool::Objcopy));
        objcopy.arg("-O").arg("binary");
        for section in CART_SECTIONS {
            objcopy.arg(format!("--only-section={section}"));
        }
        capture(objcopy.arg(&elf).arg(&bin))?;

        Ok(BuiltVariant {
            inspect: elf,
            image: Some(bin),
        })
    }

    /// Inspect a built variant and optionally run its image.
    ///
    /// # Errors
    ///
    /// Returns an error if inspection fails or the image cannot be read.
    pub fn measure(&self, built: &BuiltVariant, sim: Option<&SimConfig>) -> Result<Measured> {
        let mut inspection = inspect::inspect(&self.toolchain, &built.inspect)?;
        if let Some(image) = &built.image {
            inspection = inspection.with_bin_size(std::fs::metadata(image)?.len());
        }
        let run = match (sim, &built.image) {
            (Some(config), Some(image)) => Some(sim::run_image(config, image)),
            _ => None,
        };
        Ok(Measured { inspection, run })
    }

    /// Build and measure the baseline first, then the pass-enabled variant.
    ///
    /// # Errors
    ///
    /// Returns the first build or inspection error.
    pub fn run(&self, sim: Option<&SimConfig>) -> Result<Comparison> {
        info!(
            source = %self.target.source().display(),
            opt = %self.opt,
            flag = %self.pass_flag,
            "comparing pass on/off"
        );
        let off = self.build(Variant::Off)?;
        let on = self.build(Variant::On)?;
        Ok(Comparison {
            off: self.measure(&off, sim)?,
            on: self.measure(&on, sim)?,
        })
    }
}

/// Change in one metric from the baseline to the pass-enabled build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub label: &'static str,
    /// Unit suffix for the absolute value, if any.
    pub unit: Option<&'static str>,
    pub on: u64,
    pub off: u64,
}

impl Delta {
    #[must_use]
    pub const fn new(label: &'static str, unit: Option<&'static str>, on: u64, off: u64) -> Self {
        Self {
            label,
            unit,
            on,
            off,
        }
    }

    /// `on - off`.
    #[must_use]
    pub fn absolute(&self) -> i128 {
        i128::from(self.on) - i128::from(self.off)
    }

    /// `100 * (on - off) / off`, or `None` for a zero baseline.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        if self.off == 0 {
            return None;
        }
        Some(self.absolute() as f64 * 100.0 / self.off as f64)
    }
}

/// Deltas for every metric measured on both sides.
#[must_use]
pub fn compute_deltas(comparison: &Comparison) -> Vec<Delta> {
    let off = &comparison.off.inspection;
    let on = &comparison.on.inspection;

    let mut deltas = vec![
        Delta::new("size", Some("bytes"), on.text_size, off.text_size),
        Delta::new(
            "instruction",
            None,
            on.profile.instructions,
            off.profile.instructions,
        ),
        Delta::new(
            "word *R+",
            None,
            on.profile.post_increment.word,
            off.profile.post_increment.word,
        ),
        Delta::new(
            "byte *R+",
            None,
            on.profile.post_increment.byte,
            off.profile.post_increment.byte,
        ),
    ];
    if let (Some(on_bin), Some(off_bin)) = (on.bin_size, off.bin_size) {
        deltas.push(Delta::new("bin size", Some("bytes"), on_bin, off_bin));
    }
    if let (Some(on_run), Some(off_run)) = (&comparison.on.run, &comparison.off.run) {
        if comparison.cycles_comparable() {
            deltas.push(Delta::new("cycle", Some("cycles"), on_run.cycles, off_run.cycles));
        }
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Halt;
    use tmsbench_scrape::InstructionProfile;

    fn experiment(target: CompareTarget) -> PassExperiment {
        PassExperiment::new(
            Toolchain::new("/llvm/bin", "/sim/tms9900-trace"),
            target,
            OptLevel::O2,
        )
        .with_out_dir("/tmp/pb")
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn inspection(text: u64, listing: &str, bin: Option<u64>) -> Inspection {
        Inspection {
            text_size: text,
            profile: InstructionProfile::from_disassembly(listing),
            bin_size: bin,
        }
    }

    #[test]
    fn test_variants_differ_only_in_pass_flag() {
        let exp = experiment(CompareTarget::microbench(Path::new("/src")));
        let on = args(&exp.compile_command(Variant::On));
        let off = args(&exp.compile_command(Variant::Off));

        assert_eq!(
            on,
            [
                "--target=tms9900",
                "-O2",
                "-fno-builtin",
                "-ffreestanding",
                "-c",
                "/src/tests/peephole_bench.c",
                "-o",
                "/tmp/pb/peephole_bench_2_on.o",
            ]
        );
        assert_eq!(off.len(), on.len() + 2);
        assert_eq!(&off[..6], &on[..6]);
        assert_eq!(off[7], "/tmp/pb/peephole_bench_2_off.o");
        assert_eq!(&off[8..], ["-mllvm", DEFAULT_PASS_FLAG]);
    }

    #[test]
    fn test_cart_compile_command() {
        let exp = experiment(CompareTarget::cart(Path::new("/src")))
            .with_pass_flag("-tms9900-disable-foo");
        let off = args(&exp.compile_command(Variant::Off));
        assert!(off.contains(&"-Wno-main-return-type".to_string()));
        assert!(off.contains(&"/src/cart_example/ball2.c".to_string()));
        assert!(off.contains(&"/tmp/pb/ball2/ball2_2_off.o".to_string()));
        assert_eq!(off.last().unwrap(), "-tms9900-disable-foo");
    }

    #[test]
    fn test_required_tools() {
        let micro = CompareTarget::microbench(Path::new("/src"));
        assert!(!micro.required_tools().contains(&Tool::Lld));
        let cart = CompareTarget::cart(Path::new("/src"));
        assert!(cart.required_tools().contains(&Tool::Objcopy));
    }

    #[test]
    fn test_delta_percent() {
        let delta = Delta::new("size", Some("bytes"), 90, 100);
        assert_eq!(delta.absolute(), -10);
        assert_eq!(delta.percent(), Some(-10.0));

        let grew = Delta::new("size", Some("bytes"), 3, 2);
        assert_eq!(grew.percent(), Some(50.0));
    }

    #[test]
    fn test_delta_zero_baseline() {
        let delta = Delta::new("word *R+", None, 4, 0);
        assert_eq!(delta.absolute(), 4);
        assert_eq!(delta.percent(), None);
    }

    #[test]
    fn test_compute_deltas() {
        let off_listing = "0: c1 01  MOV  R1, R4\n2: 05 c1  INCT R1\n4: 04 c3  CLR  R3\n";
        let on_listing = "0: cc b1  MOV  *R1+, *R2+\n";
        let comparison = Comparison {
            off: Measured {
                inspection: inspection(100, off_listing, None),
                run: None,
            },
            on: Measured {
                inspection: inspection(96, on_listing, None),
                run: None,
            },
        };
        let deltas = compute_deltas(&comparison);
        let labels: Vec<_> = deltas.iter().map(|d| d.label).collect();
        assert_eq!(labels, ["size", "instruction", "word *R+", "byte *R+"]);
        assert_eq!(deltas[0].absolute(), -4);
        assert_eq!(deltas[1].absolute(), -2);
        assert_eq!(deltas[2].absolute(), 1);
        assert_eq!(deltas[2].percent(), None);
    }

    #[test]
    fn test_failed_run_has_no_cycle_delta() {
        let comparison = Comparison {
            off: Measured {
                inspection: inspection(10, "", Some(512)),
                run: Some(RunResult::timeout(5_000_000)),
            },
            on: Measured {
                inspection: inspection(8, "", Some(508)),
                run: Some(RunResult {
                    halt: Halt::Idle,
                    steps: 40,
                    cycles: 800,
                    error: None,
                }),
            },
        };
        assert!(!comparison.cycles_comparable());
        assert_eq!(
            comparison.run_statuses(),
            Some((RunStatus::Timeout, RunStatus::Pass))
        );
        let deltas = compute_deltas(&comparison);
        assert!(deltas.iter().all(|d| d.label != "cycle"));
        assert_eq!(deltas.last().unwrap().label, "bin size");
    }

    #[test]
    fn test_compute_deltas_with_image_and_run() {
        let run = |cycles| RunResult {
            halt: Halt::Idle,
            cycles,
            ..RunResult::unknown()
        };
        let comparison = Comparison {
            off: Measured {
                inspection: inspection(10, "", Some(512)),
                run: Some(run(1000)),
            },
            on: Measured {
                inspection: inspection(8, "", Some(508)),
                run: Some(run(900)),
            },
        };
        let deltas = compute_deltas(&comparison);
        assert_eq!(deltas.len(), 6);
        assert_eq!(deltas[4].label, "bin size");
        assert_eq!(deltas[4].absolute(), -4);
        assert_eq!(deltas[5].label, "cycle");
        assert_eq!(deltas[5].percent(), Some(-10.0));
    }
}
