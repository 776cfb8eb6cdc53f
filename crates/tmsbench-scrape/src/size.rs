//! Section size tables (`llvm-size -A` / SysV format).

/// Name of the code section.
pub const TEXT_SECTION: &str = ".text";

/// One row of a section size table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSize {
    pub name: String,
    pub size: u64,
}

impl SectionSize {
    /// Parse a row of the form `<name> <decimal size> ...`.
    ///
    /// Header rows (`section size addr`) and the trailing `Total` row either
    /// fail the numeric check or carry no section name and are rejected.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?;
        let size = parts.next()?.parse::<u64>().ok()?;
        Some(Self {
            name: name.to_string(),
            size,
        })
    }
}

/// Parse every section row in a size table.
#[must_use]
pub fn parse_sections(output: &str) -> Vec<SectionSize> {
    output.lines().filter_map(SectionSize::parse).collect()
}

/// Size of the first row named `section`, if any.
#[must_use]
pub fn parse_section_size(output: &str, section: &str) -> Option<u64> {
    output
        .lines()
        .filter_map(SectionSize::parse)
        .find(|s| s.name == section)
        .map(|s| s.size)
}

/// Size of the code section; 0 when the table has no `.text` row.
#[must_use]
pub fn parse_text_size(output: &str) -> u64 {
    parse_section_size(output, TEXT_SECTION).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSV: &str = "\
fib.elf  :
section      size    addr
.text         128       0
.rodata        32     128
.data           4   61440
.bss           36   61444
Total         200
";

    #[test]
    fn test_text_row_with_extra_columns() {
        let out = ".text        128     0     0    128   80";
        assert_eq!(parse_text_size(out), 128);
    }

    #[test]
    fn test_sysv_table() {
        assert_eq!(parse_text_size(SYSV), 128);
        assert_eq!(parse_section_size(SYSV, ".bss"), Some(36));
        assert_eq!(parse_section_size(SYSV, ".cart_header"), None);

        let names: Vec<_> = parse_sections(SYSV).into_iter().map(|s| s.name).collect();
        assert_eq!(names, [".text", ".rodata", ".data", ".bss", "Total"]);
    }

    #[test]
    fn test_missing_text_is_zero() {
        assert_eq!(parse_text_size(".data 4 0\n"), 0);
        assert_eq!(parse_text_size(""), 0);
    }

    #[test]
    fn test_non_decimal_size_skipped() {
        assert_eq!(SectionSize::parse(".text 0x80 0"), None);
        assert_eq!(SectionSize::parse(".text"), None);
    }
}
