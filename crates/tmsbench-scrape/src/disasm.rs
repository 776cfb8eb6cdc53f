//! Disassembly listings (`llvm-objdump -d`).

use std::sync::OnceLock;

use regex::Regex;
use rustc_hash::FxHashMap;

/// Mnemonics tracked individually in an [`InstructionProfile`].
pub const WATCHED_MNEMONICS: &[&str] = &[
    "AI", "INC", "INCT", "DEC", "DECT", "CLR", "XOR", "MOV", "MOVB",
];

/// Format I/II instructions operating on bytes rather than words.
const BYTE_MNEMONICS: &[&str] = &["MOVB", "AB", "SB", "CB", "SOCB", "SZCB"];

static LINE_PATTERN: OnceLock<Regex> = OnceLock::new();
static POST_INC_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Operand width class of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    Word,
    Byte,
}

impl AccessWidth {
    /// Width class for a mnemonic.
    #[must_use]
    pub fn of(mnemonic: &str) -> Self {
        if BYTE_MNEMONICS.contains(&mnemonic) {
            Self::Byte
        } else {
            Self::Word
        }
    }
}

/// A decoded instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisasmLine<'a> {
    /// Address as printed (hex, no prefix).
    pub address: &'a str,
    pub mnemonic: &'a str,
    pub operands: &'a str,
}

impl<'a> DisasmLine<'a> {
    /// Parse `<address>: <hex bytes>  <MNEMONIC> <operands>`.
    ///
    /// Section headers, symbol labels, blank lines and anything else that
    /// does not carry encoded bytes followed by an upper-case mnemonic
    /// return `None`.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let pattern = LINE_PATTERN.get_or_init(|| {
            Regex::new(r"^\s*([0-9a-f]+):\s+(?:[0-9a-f]{2} )+\s+([A-Z]+)\b(.*)$").unwrap()
        });
        let caps = pattern.captures(line)?;
        Some(Self {
            address: caps.get(1)?.as_str(),
            mnemonic: caps.get(2)?.as_str(),
            operands: caps.get(3).map_or("", |m| m.as_str().trim()),
        })
    }

    /// Whether an operand is a register-indirect auto-increment (`*Rn+`).
    #[must_use]
    pub fn is_post_increment(&self) -> bool {
        let pattern = POST_INC_PATTERN.get_or_init(|| Regex::new(r"\*R\d+\+").unwrap());
        pattern.is_match(self.operands)
    }

    #[must_use]
    pub fn width(&self) -> AccessWidth {
        AccessWidth::of(self.mnemonic)
    }
}

/// Post-increment addressing occurrences by operand width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostIncrement {
    pub word: u64,
    pub byte: u64,
}

/// Instruction statistics for one disassembly listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionProfile {
    /// Total decoded instructions.
    pub instructions: u64,
    mnemonics: FxHashMap<&'static str, u64>,
    pub post_increment: PostIncrement,
}

impl Default for InstructionProfile {
    fn default() -> Self {
        Self {
            instructions: 0,
            mnemonics: WATCHED_MNEMONICS.iter().map(|&m| (m, 0)).collect(),
            post_increment: PostIncrement::default(),
        }
    }
}

impl InstructionProfile {
    /// Build a profile from a full `objdump -d` listing.
    #[must_use]
    pub fn from_disassembly(output: &str) -> Self {
        let mut profile = Self::default();
        for line in output.lines().filter_map(DisasmLine::parse) {
            profile.record(&line);
        }
        profile
    }

    /// Account for one decoded instruction.
    pub fn record(&mut self, line: &DisasmLine<'_>) {
        self.instructions += 1;
        if let Some(count) = self.mnemonics.get_mut(line.mnemonic) {
            *count += 1;
        }
        if line.is_post_increment() {
            match line.width() {
                AccessWidth::Word => self.post_increment.word += 1,
                AccessWidth::Byte => self.post_increment.byte += 1,
            }
        }
    }

    /// Occurrences of a watched mnemonic (0 for mnemonics not on the list).
    #[must_use]
    pub fn count(&self, mnemonic: &str) -> u64 {
        self.mnemonics.get(mnemonic).copied().unwrap_or(0)
    }

    /// Watched mnemonic counts in watch-list order.
    pub fn watched(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        WATCHED_MNEMONICS.iter().map(|&m| (m, self.count(m)))
    }
}
