use qr_matrix::tables::lookup_capacity;
use qr_matrix::{
    encode, CharSet, ECCLevel, Encoding, MicroMode, QrError, QrOptions, QrSymbol, Size,
};

/// Reads the main format strip back out of a standard symbol, most
/// significant bit first, and removes the placement mask.
fn read_format_word(symbol: &QrSymbol) -> u16 {
    let coords = [
        (0, 8), (1, 8), (2, 8), (3, 8), (4, 8), (5, 8), (7, 8), (8, 8),
        (8, 7), (8, 5), (8, 4), (8, 3), (8, 2), (8, 1), (8, 0),
    ];
    let mut word = 0u16;
    for (x, y) in coords {
        word = word << 1 | u16::from(symbol.module(x, y));
    }
    word ^ 0x5412
}

#[test]
fn test_standard_symbol_1q() {
    let options = QrOptions::new()
        .error_level(ECCLevel::Q)
        .version(Size::Standard(1))
        .boost_error(false);
    let symbol = encode("HELLO WORLD", &options).unwrap();

    assert_eq!(symbol.width(), 21);
    assert_eq!(symbol.error_level(), ECCLevel::Q);

    // the finder pattern is byte-exact in the top-left corner
    let finder_rows: [[u8; 7]; 7] = [
        [1, 1, 1, 1, 1, 1, 1],
        [1, 0, 0, 0, 0, 0, 1],
        [1, 0, 1, 1, 1, 0, 1],
        [1, 0, 1, 1, 1, 0, 1],
        [1, 0, 1, 1, 1, 0, 1],
        [1, 0, 0, 0, 0, 0, 1],
        [1, 1, 1, 1, 1, 1, 1],
    ];
    for (y, row) in finder_rows.iter().enumerate() {
        for (x, &expected) in row.iter().enumerate() {
            assert_eq!(u8::from(symbol.module(x, y)), expected, "finder mismatch at {x},{y}");
        }
    }
    // separator and timing pattern
    assert!(!symbol.module(7, 7));
    assert!(symbol.module(8, 6));
    assert!(!symbol.module(9, 6));
    assert!(symbol.module(6, 8));
    // dark module above the bottom-left finder
    assert!(symbol.module(8, symbol.width() - 8));

    // the format strip decodes back to the symbol's own level and mask
    let word = read_format_word(&symbol);
    let data = word >> 10;
    assert_eq!(data, (ECCLevel::Q.format_bits() << 3) | u16::from(symbol.mask()));
}

#[test]
fn test_standard_symbol_1m_numeric() {
    let options = QrOptions::new()
        .error_level(ECCLevel::M)
        .version(Size::Standard(1))
        .boost_error(false);
    let symbol = encode("01234567", &options).unwrap();
    assert_eq!(symbol.version_name(), "1");
    assert_eq!(symbol.error_level(), ECCLevel::M);
    assert_eq!(symbol.segments()[0].mode(), Encoding::Numeric);
    let word = read_format_word(&symbol);
    assert_eq!(word >> 10, (ECCLevel::M.format_bits() << 3) | u16::from(symbol.mask()));
}

#[test]
fn test_micro_symbol_m3() {
    let options = QrOptions::new()
        .version(Size::Micro(3))
        .error_level(ECCLevel::M)
        .boost_error(false);
    let symbol = encode("1234567", &options).unwrap();
    assert_eq!(symbol.width(), 15);
    assert!(symbol.is_micro());
    assert_eq!(symbol.version_name(), "M3");
    assert!(symbol.mask() < 4);
    // micro finder sits alone in the top-left corner; the opposite corner
    // belongs to the encoding region, and the timing runs along row 0
    assert!(symbol.module(0, 0));
    assert!(symbol.module(8, 0));
    assert!(!symbol.module(9, 0));
}

#[test]
fn test_version_7_carries_version_info() {
    let options = QrOptions::new().version(Size::Standard(7)).boost_error(false);
    let symbol = encode("VERSION SEVEN", &options).unwrap();
    let width = symbol.width();
    assert_eq!(width, 45);

    // reassemble the 18-bit word from the top-right block and its
    // transposed bottom-left copy
    let mut top_right = 0u32;
    let mut bottom_left = 0u32;
    for i in (0..18).rev() {
        let (x, y) = (width - 11 + i % 3, i / 3);
        top_right = top_right << 1 | u32::from(symbol.module(x, y));
        bottom_left = bottom_left << 1 | u32::from(symbol.module(y, x));
    }
    assert_eq!(top_right, 0x07C94);
    assert_eq!(bottom_left, 0x07C94);
}

#[test]
fn test_encoding_is_deterministic() {
    let options = QrOptions::new().error_level(ECCLevel::L);
    let a = encode("determinism check 123", &options).unwrap();
    let b = encode("determinism check 123", &options).unwrap();
    assert_eq!(a.mask(), b.mask());
    assert_eq!(a.version(), b.version());
    let rows_a: Vec<_> = a.rows().collect();
    let rows_b: Vec<_> = b.rows().collect();
    assert_eq!(rows_a, rows_b);
}

#[test]
fn test_side_length_invariant() {
    for (content, options, expected) in [
        ("1", QrOptions::new().version(Size::Micro(1)), 11),
        ("1", QrOptions::new().version(Size::Micro(4)), 17),
        ("1", QrOptions::new().version(Size::Standard(1)), 21),
        ("1", QrOptions::new().version(Size::Standard(10)), 57),
    ] {
        let symbol = encode(content, &options).unwrap();
        assert_eq!(symbol.width(), expected);
        assert_eq!(symbol.rows().count(), expected);
    }
}

#[test]
fn test_empty_content() {
    let err = encode("", &QrOptions::new()).unwrap_err();
    assert!(matches!(err, QrError::InvalidInput(_)));
}

#[test]
fn test_capacity_boundary() {
    let digits = "8".repeat(7089);
    let options = QrOptions::new().micro(MicroMode::Forbid).boost_error(false);
    let symbol = encode(&digits, &options).unwrap();
    assert_eq!(symbol.version_name(), "40");
    assert_eq!(symbol.error_level(), ECCLevel::L);

    let digits = "8".repeat(7090);
    let err = encode(&digits, &options).unwrap_err();
    assert!(matches!(err, QrError::DataOverflow(_)));
}

#[test]
fn test_forced_numeric_rejects_letters() {
    let options = QrOptions::new().mode(Encoding::Numeric);
    let err = encode("123a", &options).unwrap_err();
    assert!(matches!(err, QrError::InvalidMode(_)));
    // auto detection falls back to byte mode instead
    let symbol = encode("123a", &QrOptions::new()).unwrap();
    assert_eq!(symbol.segments()[0].mode(), Encoding::Bytes);
}

#[test]
fn test_micro_with_level_h() {
    let options = QrOptions::new().micro(MicroMode::Require).error_level(ECCLevel::H);
    let err = encode("123", &options).unwrap_err();
    assert!(matches!(err, QrError::InvalidErrorLevel(_)));
}

#[test]
fn test_kanji_against_m2() {
    let options = QrOptions::new().mode(Encoding::Kanji).version(Size::Micro(2));
    let err = encode("点", &options).unwrap_err();
    assert!(matches!(err, QrError::InvalidMode(_)));
    // M3 accepts kanji
    let options = QrOptions::new().mode(Encoding::Kanji).version(Size::Micro(3));
    let symbol = encode("点", &options).unwrap();
    assert_eq!(symbol.version_name(), "M3");
}

#[test]
fn test_boost_raises_level_but_keeps_version() {
    let filler = "abcdefghij".repeat(16);
    let content = &filler[..155];
    let boosted = encode(content, &QrOptions::new().micro(MicroMode::Forbid)).unwrap();
    let plain = encode(
        content,
        &QrOptions::new().micro(MicroMode::Forbid).boost_error(false),
    )
    .unwrap();
    assert_eq!(boosted.version(), plain.version());
    // the returned level is the strongest that fits the chosen version
    if let Some(stronger) = boosted.error_level().stronger() {
        let required = 4 + 16 + 8 * content.len() as u32;
        if let Ok(cap) = lookup_capacity(boosted.version(), stronger) {
            assert!(cap.data_bits < required);
        }
    }
}

#[test]
fn test_eci_shift_jis() {
    let options = QrOptions::new()
        .mode(Encoding::Bytes)
        .encoding(CharSet::ShiftJis)
        .eci(true)
        .micro(MicroMode::Forbid);
    let symbol = encode("テスト", &options).unwrap();
    assert_eq!(symbol.segments()[0].charset(), Some(CharSet::ShiftJis));

    // an ECI header cannot go into a micro symbol
    let options = QrOptions::new()
        .mode(Encoding::Bytes)
        .encoding(CharSet::ShiftJis)
        .eci(true)
        .micro(MicroMode::Require);
    let err = encode("テスト", &options).unwrap_err();
    assert!(matches!(err, QrError::InvalidEncoding(_)));
}

#[test]
fn test_pinned_mask_is_used() {
    for mask in 0..8 {
        let options = QrOptions::new().micro(MicroMode::Forbid).mask(mask);
        let symbol = encode("PINNED", &options).unwrap();
        assert_eq!(symbol.mask(), mask);
        let word = read_format_word(&symbol);
        assert_eq!(word >> 10 & 0x7, u16::from(mask));
    }
}

#[test]
fn test_hanzi_roundtrip_metadata() {
    let options = QrOptions::new().mode(Encoding::Hanzi).micro(MicroMode::Forbid);
    let symbol = encode("中文", &options).unwrap();
    let segment = &symbol.segments()[0];
    assert_eq!(segment.mode(), Encoding::Hanzi);
    assert_eq!(segment.char_count(), 2);
    assert_eq!(segment.charset(), Some(CharSet::Gb2312));
    assert_eq!(segment.bit_len(), 26);
}
