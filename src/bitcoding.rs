//! Bit-level serialization: mode and character-count indicators, ECI
//! headers, per-mode payload encoders and the terminator/padding step that
//! turns the recorded stream into data codewords.

use crate::config::{ECCLevel, Encoding, Size};
use crate::error::{QrError, QrResult};
use crate::segment::Segment;
use crate::tables::lookup_capacity;

use std::cmp;

use bitstream_io::{BigEndian, BitRecorder, BitWrite, BitWriter};

pub type QrBitRecorder = BitRecorder<u32, BigEndian>;
pub type QrBitWriter<'a> = BitWriter<&'a mut Vec<u8>, BigEndian>;

/// Writes the mode indicator. Micro symbols use shortened indicators (none
/// at all for M1, which only carries numeric data).
pub fn write_mode_indicator(stream: &mut QrBitRecorder, size: Size, mode: Encoding) -> QrResult<()> {
    let unsupported =
        || QrError::invalid_mode(format!("mode {mode:?} is not available in version {size}"));
    match size {
        Size::Micro(1) => {
            if mode != Encoding::Numeric {
                return Err(unsupported());
            }
        }
        Size::Micro(2) => {
            // one bit: 0 => Numeric, 1 => Alphanumeric
            let value = match mode {
                Encoding::Numeric => 0,
                Encoding::Alphanumeric => 1,
                _ => return Err(unsupported()),
            };
            stream.write(1, value as u32).unwrap();
        }
        Size::Micro(_) => {
            let value = match mode {
                Encoding::Numeric => 0b00,
                Encoding::Alphanumeric => 0b01,
                Encoding::Bytes => 0b10,
                Encoding::Kanji => 0b11,
                Encoding::Hanzi => return Err(unsupported()),
            };
            stream.write(size.mode_bits(), value as u32).unwrap();
        }
        Size::Standard(_) => {
            stream.write(4, mode.indicator()).unwrap();
        }
    }
    Ok(())
}

/// Writes the character count indicator. The width depends on both the mode
/// and the symbol version class.
pub fn write_charcount_indicator(
    stream: &mut QrBitRecorder,
    count: u32,
    size: Size,
    mode: Encoding,
) -> QrResult<()> {
    let bits = mode
        .num_char_count_bits(size)
        .ok_or_else(|| {
            QrError::invalid_mode(format!("mode {mode:?} is not available in version {size}"))
        })?;
    if count >= 1 << bits {
        return Err(QrError::data_overflow(format!(
            "{count} characters exceed the {bits}-bit count indicator of version {size}"
        )));
    }
    stream.write(bits, count).unwrap();
    Ok(())
}

/// Write an ECI header to the bitstream, which changes the interpretation
/// of the following encoded message, until another ECI header is encountered.
///
/// `assignment` is a decimal number between 000000 and 999999 specifying
/// the encoding (as defined by the AIM ECI specification). Omitting the
/// header entirely leaves the default interpretation, ISO/IEC 8859-1 for
/// byte mode.
pub fn write_eci_header(stream: &mut QrBitRecorder, assignment: u32) {
    // ECI mode indicator
    stream.write(4, 0b0111_u32).unwrap();
    // depending on value of assignment, encode it as either 1, 2 or 3 bytes
    if assignment < 128 {
        // encode as 0bbbbbbb
        stream.write(1, 0_u32).unwrap();
        stream.write(7, assignment).unwrap();
    } else if assignment < 16384 {
        // encode as 10bbbbbb bbbbbbbb
        stream.write(2, 0b10_u32).unwrap();
        stream.write(14, assignment).unwrap();
    } else {
        // encode as 110bbbbb bbbbbbbb bbbbbbbb
        stream.write(3, 0b110_u32).unwrap();
        stream.write(21, assignment).unwrap();
    }
}

/// Maps a character to its value in the 45-character alphanumeric set, or
/// `None` when it is not part of the set.
pub fn alphanumeric_index(in_char: u8) -> Option<u8> {
    match in_char {
        0x30..=0x39 => Some(in_char - 0x30), // a digit in [0-9] maps to that value
        0x41..=0x5A => Some(in_char - 0x37), // capital letters in [A-Z] map to the next 26 values
        0x20 => Some(36),                    // space
        0x24 => Some(37),                    // dollar $
        0x25 => Some(38),                    // percent %
        0x2A => Some(39),                    // asterisk *
        0x2B => Some(40),                    // plus +
        0x2D => Some(41),                    // minus -
        0x2E => Some(42),                    // period .
        0x2F => Some(43),                    // slash /
        0x3A => Some(44),                    // colon :
        _ => None,
    }
}

/// Encodes digits: triplets become a decimal number between 0 and 999 in
/// 10 bits, a 2-digit tail takes 7 bits, a single digit 4.
pub fn encode_numeric_data(stream: &mut QrBitRecorder, input: &[u8]) -> QrResult<()> {
    let mut i = 0; // 0-index of current digit in triplet
    let mut cur_code: u32 = 0; // current value of triplet
    for &l in input {
        if !l.is_ascii_digit() {
            return Err(QrError::invalid_mode(format!(
                "byte 0x{l:02X} is not a digit"
            )));
        }
        cur_code = cur_code * 10 + u32::from(l - b'0');
        i += 1;
        if i == 3 {
            stream.write(10, cur_code).unwrap();
            i = 0;
            cur_code = 0;
        }
    }
    // potentially encode last incomplete triplet
    if i == 1 {
        stream.write(4, cur_code).unwrap();
    } else if i == 2 {
        stream.write(7, cur_code).unwrap();
    }
    Ok(())
}

/// Encodes alphanumeric characters: pairs become `45·a + b` in 11 bits, a
/// trailing single character takes 6.
pub fn encode_alphanumeric_data(stream: &mut QrBitRecorder, input: &[u8]) -> QrResult<()> {
    let mut i = 0;
    let mut cur_code: u32 = 0;
    for &l in input {
        let value = alphanumeric_index(l).ok_or_else(|| {
            QrError::invalid_mode(format!(
                "byte 0x{l:02X} is not in the alphanumeric character set"
            ))
        })?;
        cur_code = cur_code * 45 + u32::from(value);
        i += 1;
        if i == 2 {
            stream.write(11, cur_code).unwrap();
            i = 0;
            cur_code = 0;
        }
    }
    // potentially write remaining char as 6bit code
    if i == 1 {
        stream.write(6, cur_code).unwrap();
    }
    Ok(())
}

/// Byte data is already charset-encoded, so the bytes go out verbatim.
pub fn encode_byte_data(stream: &mut QrBitRecorder, input: &[u8]) {
    for &l in input {
        stream.write(8, l).unwrap();
    }
}

/// Encodes Shift JIS double-byte characters. Every character is compacted
/// into a 13-bit codeword.
pub fn encode_kanji_data(stream: &mut QrBitRecorder, input: &[u8]) -> QrResult<()> {
    if input.len() % 2 != 0 {
        return Err(QrError::invalid_mode(
            "kanji data must consist of double-byte Shift JIS characters",
        ));
    }
    for p in input.chunks(2) {
        let number = u16::from(p[0]) * 0x100 + u16::from(p[1]);
        let offset = match number {
            0x8140..=0x9FFC => 0x8140,
            0xE040..=0xEBBF => 0xC140,
            _ => {
                return Err(QrError::invalid_mode(format!(
                    "0x{number:04X} is outside the kanji double-byte ranges"
                )))
            }
        };
        let number = number - offset;
        let code = (number >> 8) * 0xC0 + (number & 0xFF);
        stream.write(13, code).unwrap();
    }
    Ok(())
}

/// Encodes GB2312 double-byte characters into 13-bit codewords, the hanzi
/// analogue of the kanji compaction.
pub fn encode_hanzi_data(stream: &mut QrBitRecorder, input: &[u8]) -> QrResult<()> {
    if input.len() % 2 != 0 {
        return Err(QrError::invalid_mode(
            "hanzi data must consist of double-byte GB2312 characters",
        ));
    }
    for p in input.chunks(2) {
        let number = u16::from(p[0]) * 0x100 + u16::from(p[1]);
        let offset = match number {
            0xA1A1..=0xAAFE => 0xA1A1,
            0xB0A1..=0xFAFE => 0xA6A1,
            _ => {
                return Err(QrError::invalid_mode(format!(
                    "0x{number:04X} is outside the GB2312 double-byte ranges"
                )))
            }
        };
        let number = number - offset;
        let code = (number >> 8) * 0x60 + (number & 0xFF);
        stream.write(13, code).unwrap();
    }
    Ok(())
}

/// Serialises the segment list into final data codewords for the chosen
/// symbol: per-segment headers and payload, then terminator and padding.
///
/// ECI headers are only emitted when `eci` is requested and a byte segment
/// carries a non-default charset; micro symbols have no ECI mode.
pub fn serialize_segments(
    segments: &[Segment],
    size: Size,
    ecl: ECCLevel,
    eci: bool,
) -> QrResult<Vec<u8>> {
    let mut stream = QrBitRecorder::new();
    for segment in segments {
        if eci && segment.needs_eci() {
            if size.is_micro() {
                return Err(QrError::invalid_encoding(format!(
                    "micro symbol {size} cannot carry an ECI header"
                )));
            }
            if let Some(charset) = segment.charset() {
                write_eci_header(&mut stream, charset.eci_assignment());
            }
        }
        write_mode_indicator(&mut stream, size, segment.mode())?;
        write_charcount_indicator(&mut stream, segment.char_count() as u32, size, segment.mode())?;
        segment.bits().playback(&mut stream).unwrap();
    }
    finalize_bitstream(&mut stream, size, ecl)
}

/// Takes a recorded sequence of mode segments and finalizes it, returning a
/// sequence of codewords as a byte array. The finalization entails
/// appending a terminator sequence, adding zero bits to byte-align the
/// sequence and adding padding codewords to fill the chosen symbol's
/// capacity exactly.
///
/// For M1 and M3 symbols the returned vector carries the 4-bit final data
/// codeword in the high nibble of its last byte.
pub fn finalize_bitstream(
    stream: &mut QrBitRecorder,
    size: Size,
    ecl: ECCLevel,
) -> QrResult<Vec<u8>> {
    let bit_capacity = lookup_capacity(size, ecl)?.data_bits;
    let half_codeword_tail = matches!(size, Size::Micro(1) | Size::Micro(3));

    // append terminator bits. At most as many zeroes as specified, and at
    // least as many of those as can fit within the symbol capacity.
    {
        let bit_rawdatasize = stream.written();
        if bit_rawdatasize > bit_capacity {
            return Err(QrError::data_overflow(format!(
                "{bit_rawdatasize} data bits exceed the {bit_capacity}-bit capacity of version {size}-{ecl}"
            )));
        }
        let terminator_bits = cmp::min(bit_capacity - bit_rawdatasize, size.terminator_length());
        stream.write(terminator_bits, 0_u32).unwrap();
    }

    // pad with zeroes to next full byte
    {
        let written = stream.written();
        let alignment = written % 8;
        if alignment > 0 {
            // special case: the last codeword in M1 and M3 symbols is only
            // 4 bits; once inside it, pad straight to capacity instead.
            if half_codeword_tail && written + 4 > bit_capacity {
                stream.write(bit_capacity - written, 0_u32).unwrap();
            } else {
                stream.write(8 - alignment, 0_u32).unwrap();
            }
        }
    }

    // pad alternately with the two specified codewords 0b11101100 and
    // 0b00010001 until capacity is filled.
    //
    // The integer division by 8 is exact in all cases: standard capacities
    // and the aligned stream are both multiples of 8, while for M1/M3 the
    // remaining bits are either zero, four, or a multiple of 8 plus four.
    {
        let bits_left = bit_capacity - stream.written();
        let bytes_left = bits_left / 8;
        const PAD_CODEWORDS: [u32; 2] = [0b1110_1100, 0b0001_0001];
        for i in 0..bytes_left {
            stream.write(8, PAD_CODEWORDS[i as usize % 2]).unwrap();
        }
    }

    // the only thing left can be the 4-bit zero codeword closing an M1 or
    // M3 symbol.
    {
        let bits_left = bit_capacity - stream.written();
        if half_codeword_tail && bits_left > 0 {
            debug_assert_eq!(bits_left, 4);
            stream.write(bits_left, 0_u32).unwrap();
        } else {
            debug_assert_eq!(bits_left, 0);
        }
    }
    debug_assert_eq!(stream.written(), bit_capacity);

    // add four more zero bits for M1 and M3 so the playback below returns
    // whole bytes.
    if half_codeword_tail {
        stream.write(4, 0_u32).unwrap();
    }

    // create a bit writer on a vector, play back all bits to it.
    let mut data_codewords: Vec<u8> = Vec::new();
    {
        let mut writer = QrBitWriter::new(&mut data_codewords);
        stream.playback(&mut writer).unwrap();
    }
    Ok(data_codewords)
}
