//! Symbol configuration types: version (size), error correction level,
//! encoding mode and the option record accepted by [`crate::encode`].

use crate::error::{QrError, QrResult};

use std::fmt;

/// Data encoding mode of a segment.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum Encoding {
    Numeric,      // only digits [0-9]
    Alphanumeric, // digits, capital letters and nine other chars [0-9A-Z $%*+-./:]
    Bytes,        // ISO8859-1 encoded or otherwise (7.3.5)
    Kanji,        // Shift JIS X 0208 double-byte characters
    Hanzi,        // GB2312 double-byte characters (GB/T 18284)
}

impl Encoding {
    /// Mode indicator value for standard-size symbols (4 bits).
    pub fn indicator(self) -> u32 {
        match self {
            Encoding::Numeric => 0b0001,
            Encoding::Alphanumeric => 0b0010,
            Encoding::Bytes => 0b0100,
            Encoding::Kanji => 0b1000,
            Encoding::Hanzi => 0b1101,
        }
    }

    /// Number of bits in the character count indicator for this mode and
    /// symbol size. `None` when the mode is not available in that symbol.
    pub fn num_char_count_bits(self, size: Size) -> Option<u32> {
        match size {
            Size::Micro(1) => match self {
                Encoding::Numeric => Some(3),
                _ => None,
            },
            Size::Micro(2) => match self {
                Encoding::Numeric => Some(4),
                Encoding::Alphanumeric => Some(3),
                _ => None,
            },
            Size::Micro(3) => match self {
                Encoding::Numeric => Some(5),
                Encoding::Alphanumeric => Some(4),
                Encoding::Bytes => Some(4),
                Encoding::Kanji => Some(3),
                Encoding::Hanzi => None,
            },
            Size::Micro(_) => match self {
                Encoding::Numeric => Some(6),
                Encoding::Alphanumeric => Some(5),
                Encoding::Bytes => Some(5),
                Encoding::Kanji => Some(4),
                Encoding::Hanzi => None,
            },
            Size::Standard(1..=9) => match self {
                Encoding::Numeric => Some(10),
                Encoding::Alphanumeric => Some(9),
                Encoding::Bytes => Some(8),
                Encoding::Kanji | Encoding::Hanzi => Some(8),
            },
            Size::Standard(10..=26) => match self {
                Encoding::Numeric => Some(12),
                Encoding::Alphanumeric => Some(11),
                Encoding::Bytes => Some(16),
                Encoding::Kanji | Encoding::Hanzi => Some(10),
            },
            Size::Standard(_) => match self {
                Encoding::Numeric => Some(14),
                Encoding::Alphanumeric => Some(13),
                Encoding::Bytes => Some(16),
                Encoding::Kanji | Encoding::Hanzi => Some(12),
            },
        }
    }

    /// Exact payload bit count for `char_count` characters in this mode.
    pub fn payload_bits(self, char_count: usize) -> usize {
        match self {
            Encoding::Numeric => char_count / 3 * 10 + [0, 4, 7][char_count % 3],
            Encoding::Alphanumeric => char_count / 2 * 11 + char_count % 2 * 6,
            Encoding::Bytes => char_count * 8,
            Encoding::Kanji | Encoding::Hanzi => char_count * 13,
        }
    }
}

/// Error correction level. Ordered so that `L < M < Q < H` for boosting.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum ECCLevel {
    L, // allows recovery of  7% of the data
    M, // allows recovery of 15% of the data
    Q, // allows recovery of 25% of the data
    H, // allows recovery of 30% of the data
}

impl ECCLevel {
    /// The next stronger level, if any.
    pub fn stronger(self) -> Option<ECCLevel> {
        match self {
            ECCLevel::L => Some(ECCLevel::M),
            ECCLevel::M => Some(ECCLevel::Q),
            ECCLevel::Q => Some(ECCLevel::H),
            ECCLevel::H => None,
        }
    }

    /// Two-bit level code used in the format information:
    /// L=01, M=00, Q=11, H=10.
    pub fn format_bits(self) -> u16 {
        match self {
            ECCLevel::L => 0b01,
            ECCLevel::M => 0b00,
            ECCLevel::Q => 0b11,
            ECCLevel::H => 0b10,
        }
    }
}

impl fmt::Display for ECCLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ECCLevel::L => "L",
            ECCLevel::M => "M",
            ECCLevel::Q => "Q",
            ECCLevel::H => "H",
        })
    }
}

/// Symbol version. `Micro(1..=4)` are the M1..M4 symbols, `Standard(1..=40)`
/// the regular versions.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum Size {
    Micro(u8),
    Standard(u8),
}

impl Size {
    /// Checks the version number is within range.
    pub fn validate(self) -> QrResult<()> {
        match self {
            Size::Micro(1..=4) | Size::Standard(1..=40) => Ok(()),
            _ => Err(QrError::invalid_version(format!(
                "version {} is out of range",
                self
            ))),
        }
    }

    pub fn is_micro(self) -> bool {
        matches!(self, Size::Micro(_))
    }

    /// Side length of the symbol in modules.
    pub fn width(self) -> usize {
        match self {
            Size::Micro(v) => 2 * v as usize + 9,
            Size::Standard(v) => 4 * v as usize + 17,
        }
    }

    /// Number of bits in the mode indicator (0..=3 for micro, 4 for standard).
    pub fn mode_bits(self) -> u32 {
        match self {
            Size::Micro(v) => u32::from(v) - 1,
            Size::Standard(_) => 4,
        }
    }

    /// Length of the terminator sequence in bits.
    pub fn terminator_length(self) -> u32 {
        match self {
            Size::Micro(v) => 2 * u32::from(v) + 1,
            Size::Standard(_) => 4,
        }
    }

    /// Whether the level is at all available for this symbol size. M1 only
    /// carries the detection-only row (represented as `L`), M2/M3 go up to
    /// `M`, M4 up to `Q`; `H` never fits a micro symbol.
    pub fn supports_level(self, ecl: ECCLevel) -> bool {
        match self {
            Size::Micro(1) => ecl == ECCLevel::L,
            Size::Micro(2) | Size::Micro(3) => ecl <= ECCLevel::M,
            Size::Micro(_) => ecl <= ECCLevel::Q,
            Size::Standard(_) => true,
        }
    }

    /// Number of data masks defined for this symbol kind.
    pub fn mask_count(self) -> u8 {
        if self.is_micro() {
            4
        } else {
            8
        }
    }

    /// Parses a version name such as `"7"` or `"M2"`.
    pub fn from_name(name: &str) -> QrResult<Size> {
        let size = if let Some(m) = name.strip_prefix(['M', 'm']) {
            Size::Micro(m.parse().map_err(|_| bad_name(name))?)
        } else {
            Size::Standard(name.parse().map_err(|_| bad_name(name))?)
        };
        size.validate()?;
        Ok(size)
    }
}

fn bad_name(name: &str) -> QrError {
    QrError::invalid_version(format!("unrecognized version name {name:?}"))
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Micro(v) => write!(f, "M{v}"),
            Size::Standard(v) => write!(f, "{v}"),
        }
    }
}

/// Key type for the capacity table: a (size, level) pair.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct SymbolConfig {
    pub size: Size,
    pub ecc: ECCLevel,
}

impl SymbolConfig {
    pub const fn new(size: Size, ecc: ECCLevel) -> SymbolConfig {
        SymbolConfig { size, ecc }
    }
}

/// Whether a micro symbol may, must or must not be produced.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub enum MicroMode {
    Require,
    Forbid,
    #[default]
    Either,
}

/// Options accepted by [`crate::encode`]. Every field has a default;
/// the builder methods override individual fields.
#[derive(Clone, Debug, Default)]
pub struct QrOptions {
    pub(crate) error_level: Option<ECCLevel>,
    pub(crate) version: Option<Size>,
    pub(crate) mode: Option<Encoding>,
    pub(crate) mask: Option<u8>,
    pub(crate) encoding: Option<crate::segment::CharSet>,
    pub(crate) eci: bool,
    pub(crate) micro: MicroMode,
    pub(crate) boost_error: Option<bool>,
}

impl QrOptions {
    pub fn new() -> QrOptions {
        QrOptions::default()
    }

    pub fn error_level(mut self, level: ECCLevel) -> Self {
        self.error_level = Some(level);
        self
    }

    pub fn version(mut self, version: Size) -> Self {
        self.version = Some(version);
        self
    }

    pub fn mode(mut self, mode: Encoding) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn mask(mut self, mask: u8) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn encoding(mut self, charset: crate::segment::CharSet) -> Self {
        self.encoding = Some(charset);
        self
    }

    pub fn eci(mut self, eci: bool) -> Self {
        self.eci = eci;
        self
    }

    pub fn micro(mut self, micro: MicroMode) -> Self {
        self.micro = micro;
        self
    }

    pub fn boost_error(mut self, boost: bool) -> Self {
        self.boost_error = Some(boost);
        self
    }

    pub(crate) fn boost_enabled(&self) -> bool {
        self.boost_error.unwrap_or(true)
    }
}
