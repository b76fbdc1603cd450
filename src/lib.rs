//! QR and Micro QR symbol encoder.
//!
//! Turns textual content into the masked, error-corrected module matrix of
//! a QR symbol, covering the forty standard versions and the four micro
//! variants. The output is the matrix itself plus the chosen version, error
//! correction level, mask and segment list; rendering the matrix to pixels
//! or vector graphics is left to the caller.
//!
//! ```
//! use qr_matrix::{encode, ECCLevel, QrOptions};
//!
//! let symbol = encode("HELLO WORLD", &QrOptions::new().error_level(ECCLevel::Q)).unwrap();
//! for row in symbol.rows() {
//!     for &module in row {
//!         print!("{}", if module == 1 { "##" } else { "  " });
//!     }
//!     println!();
//! }
//! ```

pub mod bitcoding;
pub mod config;
pub mod error;
pub mod rscoding;
pub mod segment;
pub mod serialization;
pub mod tables;

pub use crate::config::{ECCLevel, Encoding, MicroMode, QrOptions, Size};
pub use crate::error::{QrError, QrResult};
pub use crate::segment::{CharSet, Segment};

use crate::serialization::masking::{apply_best_mask, insert_format_info, insert_version_info};
use crate::serialization::{create_qr_canvas, insert_data_payload, Canvas, BIT_BLACK};

/// Encodes `content` into a symbol matrix under the given options.
///
/// The pipeline: segment formation, version/level selection, codeword
/// serialization, Reed-Solomon block construction, matrix painting, mask
/// selection, and finally the format/version information words.
pub fn encode(content: &str, options: &QrOptions) -> QrResult<QrSymbol> {
    if let Some(mask) = options.mask {
        let limit = match (options.version, options.micro) {
            (Some(size), _) => size.mask_count(),
            (None, MicroMode::Require) => 4,
            _ => 8,
        };
        if mask >= limit {
            return Err(QrError::invalid_mask(format!(
                "mask {mask} is out of range (0..{limit})"
            )));
        }
    }

    let segments = segment::build_segments(content, options.mode, options.encoding)?;
    let (size, ecl) = tables::find_version(&segments, options)?;

    let data = bitcoding::serialize_segments(&segments, size, ecl, options.eci)?;
    let (data_bytes, ecc_bytes) = rscoding::construct_codewords(&data, size, ecl)?;

    let mut canvas = create_qr_canvas(size);
    insert_data_payload(&mut canvas, size, &data_bytes, &ecc_bytes);

    let (mask, mut masked_symbol) = apply_best_mask(&canvas, size, options.mask)?;
    insert_format_info(&mut masked_symbol, size, ecl, mask)?;
    insert_version_info(&mut masked_symbol, size);

    Ok(QrSymbol::from_canvas(masked_symbol, size, ecl, mask, segments))
}

/// A finished symbol: the module matrix and the metadata describing how it
/// was produced. Immutable once returned.
#[derive(Debug)]
pub struct QrSymbol {
    modules: Vec<u8>,
    width: usize,
    version: Size,
    error_level: ECCLevel,
    mask: u8,
    segments: Vec<Segment>,
}

impl QrSymbol {
    fn from_canvas(
        canvas: Canvas,
        version: Size,
        error_level: ECCLevel,
        mask: u8,
        segments: Vec<Segment>,
    ) -> QrSymbol {
        let width = canvas.width();
        let modules = canvas
            .cells()
            .iter()
            .map(|&cell| {
                debug_assert!(cell <= 1, "sentinel cell leaked into the finished symbol");
                u8::from(cell == BIT_BLACK)
            })
            .collect();
        QrSymbol {
            modules,
            width,
            version,
            error_level,
            mask,
            segments,
        }
    }

    /// Module side count of the matrix.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark.
    pub fn module(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x] == 1
    }

    /// Rows of the matrix, top to bottom; `1` is dark, `0` is light.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.modules.chunks(self.width)
    }

    pub fn version(&self) -> Size {
        self.version
    }

    /// The version name: `"1"` to `"40"`, or `"M1"` to `"M4"`.
    pub fn version_name(&self) -> String {
        self.version.to_string()
    }

    pub fn is_micro(&self) -> bool {
        self.version.is_micro()
    }

    pub fn error_level(&self) -> ECCLevel {
        self.error_level
    }

    /// Index of the data mask applied to the symbol.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// The segments the content was encoded as, for inspection.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_world_v1q() {
        let options = QrOptions::new()
            .error_level(ECCLevel::Q)
            .version(Size::Standard(1))
            .boost_error(false);
        let symbol = encode("HELLO WORLD", &options).unwrap();
        assert_eq!(symbol.width(), 21);
        assert_eq!(symbol.version_name(), "1");
        assert_eq!(symbol.error_level(), ECCLevel::Q);
        assert!(!symbol.is_micro());
        assert_eq!(symbol.segments().len(), 1);
        assert_eq!(symbol.segments()[0].mode(), Encoding::Alphanumeric);
    }

    #[test]
    fn test_micro_auto_selection() {
        let symbol = encode("HELLO WORLD", &QrOptions::new()).unwrap();
        // 11 alphanumeric chars fit M3 and boost to level M
        assert_eq!(symbol.version(), Size::Micro(3));
        assert_eq!(symbol.error_level(), ECCLevel::M);
        assert_eq!(symbol.width(), 15);
    }

    #[test]
    fn test_all_modules_are_binary() {
        for options in [
            QrOptions::new(),
            QrOptions::new().micro(MicroMode::Forbid),
            QrOptions::new().version(Size::Standard(7)),
        ] {
            let symbol = encode("31415926535897932384626433", &options).unwrap();
            assert_eq!(symbol.rows().count(), symbol.width());
            for row in symbol.rows() {
                assert!(row.iter().all(|&m| m <= 1));
            }
        }
    }

    #[test]
    fn test_mask_range_checked_up_front() {
        let err = encode("1", &QrOptions::new().mask(8)).unwrap_err();
        assert!(matches!(err, QrError::InvalidMask(_)));
        let err = encode("1", &QrOptions::new().micro(MicroMode::Require).mask(5)).unwrap_err();
        assert!(matches!(err, QrError::InvalidMask(_)));
    }
}
