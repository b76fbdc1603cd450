//! Lookup tables and reference data needed for encoding: bit capacity and
//! error correction block structure per symbol configuration, remainder bit
//! counts, and the version selector built on top of them.

use crate::config::{ECCLevel, MicroMode, QrOptions, Size, SymbolConfig};
use crate::error::{QrError, QrResult};
use crate::segment::Segment;

use std::collections::HashMap;

use lazy_static::lazy_static;

///////////////////////////////////////////////////////////////////////////////////////////////////

/// Definition of a block of data + ECC bytes
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct BlockDef {
    pub num_blocks: u32,     // the number of occurrences of this block type
    pub codewords: u32,      // total number of codewords in this block
    pub data_codewords: u32, // of those codewords, how many carry data (as opposed to ecc)
}

impl BlockDef {
    pub const fn new(num_blocks: u32, words_total: u32, words: u32) -> BlockDef {
        BlockDef {
            num_blocks,
            codewords: words_total,
            data_codewords: words,
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct SymbolCapacity {
    pub data_bits: u32, // how many data bits?

    pub block_def1: BlockDef, // block definition for distributing the data over multiple blocks
    pub block_def2: BlockDef, // secondary block definition, null for some sizes
}

impl SymbolCapacity {
    pub const fn new(
        bits: u32,
        num_blocks1: u32,
        block_size1: u32,
        block_data_words1: u32,
        num_blocks2: u32,
        block_size2: u32,
        block_data_words2: u32,
    ) -> SymbolCapacity {
        SymbolCapacity {
            data_bits: bits,
            block_def1: BlockDef::new(num_blocks1, block_size1, block_data_words1),
            block_def2: BlockDef::new(num_blocks2, block_size2, block_data_words2),
        }
    }

    /// compute and return the total number of codewords for this symbol
    pub fn codewords(&self) -> u32 {
        self.block_def1.num_blocks * self.block_def1.codewords
            + self.block_def2.num_blocks * self.block_def2.codewords
    }

    /// compute and return the number of data codewords for this symbol
    pub fn data_codewords(&self) -> u32 {
        self.block_def1.num_blocks * self.block_def1.data_codewords
            + self.block_def2.num_blocks * self.block_def2.data_codewords
    }

    /// compute and return the number of ecc codewords for this symbol
    pub fn ecc_words(&self) -> u32 {
        self.codewords() - self.data_codewords()
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////

// Number of error correction codewords per block, indexed by level (L,M,Q,H)
// and version, from table 9 in ISO/IEC 18004:2015. Index 0 is unused.
#[rustfmt::skip]
static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [-1,  7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
     30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30], // L
    [-1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
     28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28], // M
    [-1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
     30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30], // Q
    [-1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
     30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30], // H
];

// Number of error correction blocks, same indexing.
#[rustfmt::skip]
static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [-1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13,
     14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25], // L
    [-1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21, 23,
     25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49], // M
    [-1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
     34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68], // Q
    [-1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
     37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81], // H
];

/// Number of modules available for codewords in a standard symbol, i.e. the
/// symbol area minus every function pattern and format/version region.
fn num_raw_data_modules(version: u8) -> u32 {
    let v = u32::from(version);
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let numalign = v / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    result
}

/// Derives the capacity entry of a standard version from the two flat
/// per-level tables. Group 1 holds the shorter blocks, group 2 (when
/// present) blocks exactly one codeword longer.
fn standard_capacity(version: u8, ecc: ECCLevel) -> SymbolCapacity {
    let level = ecc as usize;
    let v = usize::from(version);
    let total = num_raw_data_modules(version) / 8;
    let ecc_per_block = ECC_CODEWORDS_PER_BLOCK[level][v] as u32;
    let num_blocks = NUM_ERROR_CORRECTION_BLOCKS[level][v] as u32;
    let data = total - ecc_per_block * num_blocks;
    let short_data = data / num_blocks;
    let long_blocks = data % num_blocks;
    let short_blocks = num_blocks - long_blocks;
    SymbolCapacity::new(
        data * 8,
        short_blocks,
        short_data + ecc_per_block,
        short_data,
        long_blocks,
        short_data + 1 + ecc_per_block,
        short_data + 1,
    )
}

macro_rules! micro_capacity_rows {
    {$table:ident;
     $($version:expr, $ecc:expr, $bits:expr; ($block_size:expr, $data_size:expr);)*} => {
        $(
            $table.insert(
                SymbolConfig::new(Size::Micro($version), $ecc),
                SymbolCapacity::new($bits, 1, $block_size, $data_size, 0, 0, 0),
            );
        )*
    }
}

lazy_static! {
    /// Combination of table 7 in ISO/IEC 18004:2015 section 7.4.10 and
    /// table 9 in section 7.5.1. Micro rows are transcribed; standard rows
    /// derive from the flat tables above.
    pub static ref SYMBOL_CAPACITY_TABLE: HashMap<SymbolConfig, SymbolCapacity> = {
        let mut table = HashMap::new();
        micro_capacity_rows! {
            table;
            1, ECCLevel::L,  20; ( 5,  3);
            2, ECCLevel::L,  40; (10,  5);
            2, ECCLevel::M,  32; (10,  4);
            3, ECCLevel::L,  84; (17, 11);
            3, ECCLevel::M,  68; (17,  9);
            4, ECCLevel::L, 128; (24, 16);
            4, ECCLevel::M, 112; (24, 14);
            4, ECCLevel::Q,  80; (24, 10);
        }
        for version in 1..=40 {
            for ecc in [ECCLevel::L, ECCLevel::M, ECCLevel::Q, ECCLevel::H] {
                table.insert(
                    SymbolConfig::new(Size::Standard(version), ecc),
                    standard_capacity(version, ecc),
                );
            }
        }
        table
    };
}

///////////////////////////////////////////////////////////////////////////////////////////////////

/// Indexes into the static capacity table. A miss means the level does not
/// exist for that symbol (or the version is out of range).
pub fn lookup_capacity(size: Size, ecc: ECCLevel) -> QrResult<SymbolCapacity> {
    SYMBOL_CAPACITY_TABLE
        .get(&SymbolConfig::new(size, ecc))
        .copied()
        .ok_or_else(|| {
            QrError::invalid_version(format!("no capacity entry for version {size}-{ecc}"))
        })
}

/// Number of zero bits following the final codeword in the data region.
pub fn remainder_bits(size: Size) -> u32 {
    match size {
        Size::Micro(_) => 0,
        Size::Standard(v) => match v {
            2..=6 => 7,
            14..=20 | 28..=34 => 3,
            21..=27 => 4,
            _ => 0,
        },
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////

/// Total bits the segment list occupies in the given symbol, headers
/// included (terminator excluded; it may be truncated to fit). Fails when a
/// segment's mode is unavailable there, its length overflows the count
/// indicator, or an ECI header would be needed in a micro symbol.
fn required_bits(segments: &[Segment], size: Size, eci: bool) -> QrResult<u32> {
    let mut total: u32 = 0;
    for segment in segments {
        let mode = segment.mode();
        let count_bits = mode.num_char_count_bits(size).ok_or_else(|| {
            QrError::invalid_mode(format!("mode {mode:?} is not available in version {size}"))
        })?;
        let count = segment.char_count() as u32;
        if count >= 1 << count_bits {
            return Err(QrError::data_overflow(format!(
                "{count} characters exceed the {count_bits}-bit count indicator of version {size}"
            )));
        }
        if eci && segment.needs_eci() {
            if size.is_micro() {
                return Err(QrError::invalid_encoding(format!(
                    "micro symbol {size} cannot carry an ECI header"
                )));
            }
            // 4-bit ECI mode + one-byte assignment (all supported charsets)
            total += 12;
        }
        total += size.mode_bits() + count_bits + segment.bit_len();
    }
    Ok(total)
}

fn candidate_sizes(options: &QrOptions) -> Vec<Size> {
    let micro = (1..=4).map(Size::Micro);
    let standard = (1..=40).map(Size::Standard);
    match options.micro {
        MicroMode::Require => micro.collect(),
        MicroMode::Forbid => standard.collect(),
        MicroMode::Either => micro.chain(standard).collect(),
    }
}

/// Returns the smallest permitted version (and the error level after
/// optional boosting) whose data capacity holds the segment list.
pub fn find_version(segments: &[Segment], options: &QrOptions) -> QrResult<(Size, ECCLevel)> {
    let eci = options.eci;
    let base_level = options.error_level.unwrap_or(ECCLevel::L);

    if let Some(size) = options.version {
        size.validate()?;
        match options.micro {
            MicroMode::Require if !size.is_micro() => {
                return Err(QrError::invalid_version(format!(
                    "version {size} conflicts with the required micro symbol"
                )));
            }
            MicroMode::Forbid if size.is_micro() => {
                return Err(QrError::invalid_version(format!(
                    "micro version {size} conflicts with the micro prohibition"
                )));
            }
            _ => {}
        }
        if !size.supports_level(base_level) {
            return Err(QrError::invalid_error_level(format!(
                "error level {base_level} is not available in version {size}"
            )));
        }
        let required = required_bits(segments, size, eci)?;
        if required > lookup_capacity(size, base_level)?.data_bits {
            return Err(QrError::data_overflow(format!(
                "{required} bits exceed the capacity of version {size}-{base_level}"
            )));
        }
        let level = boost_level(size, base_level, required, options);
        return Ok((size, level));
    }

    if options.micro == MicroMode::Require && base_level == ECCLevel::H {
        return Err(QrError::invalid_error_level(
            "error level H is not available in micro symbols",
        ));
    }
    if options.micro == MicroMode::Require && eci && segments.iter().any(Segment::needs_eci) {
        return Err(QrError::invalid_encoding(
            "micro symbols cannot carry an ECI header",
        ));
    }

    for size in candidate_sizes(options) {
        if !size.supports_level(base_level) {
            continue;
        }
        let Ok(required) = required_bits(segments, size, eci) else {
            continue;
        };
        let Ok(capacity) = lookup_capacity(size, base_level) else {
            continue;
        };
        if required <= capacity.data_bits {
            let level = boost_level(size, base_level, required, options);
            return Ok((size, level));
        }
    }
    Err(QrError::data_overflow(
        "no permitted version can hold the data",
    ))
}

/// Raises the error level as long as the chosen version still fits,
/// skipping level/version combinations that do not exist.
fn boost_level(size: Size, base: ECCLevel, required: u32, options: &QrOptions) -> ECCLevel {
    if !options.boost_enabled() {
        return base;
    }
    let mut level = base;
    while let Some(next) = level.stronger() {
        if !size.supports_level(next) {
            break;
        }
        match lookup_capacity(size, next) {
            Ok(capacity) if required <= capacity.data_bits => level = next,
            _ => break,
        }
    }
    level
}

///////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Encoding;
    use crate::segment::build_segments;

    #[test]
    fn test_table1() {
        assert_eq!(lookup_capacity(Size::Micro(3), ECCLevel::M).unwrap().data_codewords(), 9);
        assert_eq!(lookup_capacity(Size::Standard(1), ECCLevel::Q).unwrap().ecc_words(), 13);
        assert_eq!(lookup_capacity(Size::Standard(1), ECCLevel::L).unwrap().data_bits, 152);
        assert!(lookup_capacity(Size::Micro(2), ECCLevel::Q).is_err());
        assert!(lookup_capacity(Size::Standard(41), ECCLevel::L).is_err());
    }

    #[test]
    fn test_table2() {
        // check for all entries of a single size that all LMQH levels return
        // the same number of total codewords, and that it matches the raw
        // module count. If this fails, there is a transcription error.
        for i in 1..=40 {
            let expected = num_raw_data_modules(i) / 8;
            for l in [ECCLevel::L, ECCLevel::M, ECCLevel::Q, ECCLevel::H] {
                let n = lookup_capacity(Size::Standard(i), l).unwrap().codewords();
                assert_eq!(n, expected, "Error in total codewords number for symbol {i}-{l}");
            }
        }
    }

    #[test]
    fn test_table3() {
        // check that all entries with two block sizes have the following
        // property: the second block size (resp. data size) is exactly one
        // unit larger than the first block size (resp. data size).
        for (sym, cap) in SYMBOL_CAPACITY_TABLE.iter() {
            if cap.block_def2.num_blocks != 0 {
                assert_eq!(cap.block_def1.codewords + 1, cap.block_def2.codewords,
                           "Error in codewords numbers for symbol {sym:?}");
                assert_eq!(cap.block_def1.data_codewords + 1, cap.block_def2.data_codewords,
                           "Error in codewords numbers for symbol {sym:?}");
            }
        }
    }

    #[test]
    fn test_table4() {
        // the number of data bits is exactly 8 times the number of data
        // words for standard symbols, minus the 4-bit tail for M1/M3
        for i in 1..=40 {
            for l in [ECCLevel::L, ECCLevel::M, ECCLevel::Q, ECCLevel::H] {
                let cap = lookup_capacity(Size::Standard(i), l).unwrap();
                assert_eq!(cap.data_codewords() * 8, cap.data_bits,
                           "Error in num data bits of symbol {i}, level {l:?}");
            }
        }
        for (v, l) in [(1, ECCLevel::L), (3, ECCLevel::L), (3, ECCLevel::M)] {
            let cap = lookup_capacity(Size::Micro(v), l).unwrap();
            assert_eq!(cap.data_codewords() * 8 - 4, cap.data_bits);
        }
    }

    #[test]
    fn test_known_block_splits() {
        // spot checks against table 9 of the standard
        let cap = lookup_capacity(Size::Standard(5), ECCLevel::Q).unwrap();
        assert_eq!(cap.block_def1, BlockDef::new(2, 33, 15));
        assert_eq!(cap.block_def2, BlockDef::new(2, 34, 16));
        let cap = lookup_capacity(Size::Standard(7), ECCLevel::H).unwrap();
        assert_eq!(cap.block_def1, BlockDef::new(4, 39, 13));
        assert_eq!(cap.block_def2, BlockDef::new(1, 40, 14));
        let cap = lookup_capacity(Size::Standard(40), ECCLevel::L).unwrap();
        assert_eq!(cap.data_codewords(), 2956);
    }

    #[test]
    fn test_remainder_bits() {
        assert_eq!(remainder_bits(Size::Standard(1)), 0);
        assert_eq!(remainder_bits(Size::Standard(2)), 7);
        assert_eq!(remainder_bits(Size::Standard(7)), 0);
        assert_eq!(remainder_bits(Size::Standard(14)), 3);
        assert_eq!(remainder_bits(Size::Standard(21)), 4);
        assert_eq!(remainder_bits(Size::Standard(28)), 3);
        assert_eq!(remainder_bits(Size::Standard(35)), 0);
        assert_eq!(remainder_bits(Size::Micro(3)), 0);
    }

    #[test]
    fn test_find_version_regular() {
        let segments = build_segments("HELLO WORLD", None, None).unwrap();
        let options = QrOptions::new()
            .micro(MicroMode::Forbid)
            .error_level(ECCLevel::Q)
            .boost_error(false);
        let (size, level) = find_version(&segments, &options).unwrap();
        assert_eq!(size, Size::Standard(1));
        assert_eq!(level, ECCLevel::Q);
    }

    #[test]
    fn test_find_version_prefers_micro() {
        let segments = build_segments("01234567", None, None).unwrap();
        let (size, level) = find_version(&segments, &QrOptions::new()).unwrap();
        // 8 digits overflow M1's 3-bit count indicator, M2 fits and boosts to M
        assert_eq!(size, Size::Micro(2));
        assert_eq!(level, ECCLevel::M);
    }

    #[test]
    fn test_boost_keeps_version() {
        let segments = build_segments("01234567", None, None).unwrap();
        let options = QrOptions::new().micro(MicroMode::Forbid);
        let (size, level) = find_version(&segments, &options).unwrap();
        assert_eq!(size, Size::Standard(1));
        assert_eq!(level, ECCLevel::H);
    }

    #[test]
    fn test_forced_version_overflow() {
        let segments = build_segments(&"9".repeat(100), None, None).unwrap();
        let options = QrOptions::new().version(Size::Standard(1)).error_level(ECCLevel::H);
        let err = find_version(&segments, &options).unwrap_err();
        assert!(matches!(err, QrError::DataOverflow(_)));
    }

    #[test]
    fn test_micro_level_restrictions() {
        let segments = build_segments("123", None, None).unwrap();
        let options = QrOptions::new().micro(MicroMode::Require).error_level(ECCLevel::H);
        let err = find_version(&segments, &options).unwrap_err();
        assert!(matches!(err, QrError::InvalidErrorLevel(_)));
    }

    #[test]
    fn test_kanji_skips_small_micro() {
        let segments = build_segments("点", Some(Encoding::Kanji), None).unwrap();
        let options = QrOptions::new().micro(MicroMode::Require).boost_error(false);
        let (size, _) = find_version(&segments, &options).unwrap();
        assert_eq!(size, Size::Micro(3));
        // pinned to M2, kanji is genuinely unavailable
        let options = QrOptions::new().version(Size::Micro(2));
        let err = find_version(&segments, &options).unwrap_err();
        assert!(matches!(err, QrError::InvalidMode(_)));
    }

    #[test]
    fn test_capacity_boundary_40l() {
        let segments = build_segments(&"7".repeat(7089), None, None).unwrap();
        let options = QrOptions::new()
            .micro(MicroMode::Forbid)
            .boost_error(false);
        let (size, level) = find_version(&segments, &options).unwrap();
        assert_eq!(size, Size::Standard(40));
        assert_eq!(level, ECCLevel::L);

        let segments = build_segments(&"7".repeat(7090), None, None).unwrap();
        let err = find_version(&segments, &options).unwrap_err();
        assert!(matches!(err, QrError::DataOverflow(_)));
    }
}
