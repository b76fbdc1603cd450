//! Segment formation: classifying content into an encoding mode, transcoding
//! it into mode-ready bytes and recording the payload bits.

use crate::bitcoding::{self, QrBitRecorder};
use crate::config::Encoding;
use crate::error::{QrError, QrResult};

use std::fmt;
use std::str::FromStr;

/// Character sets supported for byte and hanzi segments.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum CharSet {
    Iso8859_1,
    ShiftJis,
    Utf8,
    Gb2312,
}

impl CharSet {
    /// ECI assignment number declaring this interpretation.
    pub fn eci_assignment(self) -> u32 {
        match self {
            CharSet::Iso8859_1 => 3,
            CharSet::ShiftJis => 20,
            CharSet::Utf8 => 26,
            CharSet::Gb2312 => 29,
        }
    }

    /// Whether byte-mode data in this charset needs an ECI header at all.
    /// ISO-8859-1 is the default interpretation.
    pub fn is_default(self) -> bool {
        self == CharSet::Iso8859_1
    }

    /// Transcodes `content`, or `None` when a character has no
    /// representation in this charset.
    pub fn encode_text(self, content: &str) -> Option<Vec<u8>> {
        match self {
            CharSet::Iso8859_1 => content
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            CharSet::Utf8 => Some(content.as_bytes().to_vec()),
            CharSet::ShiftJis => {
                let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(content);
                (!had_errors).then(|| bytes.into_owned())
            }
            CharSet::Gb2312 => {
                let (bytes, _, had_errors) = encoding_rs::GBK.encode(content);
                (!had_errors).then(|| bytes.into_owned())
            }
        }
    }
}

impl FromStr for CharSet {
    type Err = QrError;

    fn from_str(label: &str) -> QrResult<CharSet> {
        match label.to_ascii_lowercase().replace('_', "-").as_str() {
            "iso-8859-1" | "latin-1" | "latin1" => Ok(CharSet::Iso8859_1),
            "shift-jis" | "shiftjis" | "sjis" => Ok(CharSet::ShiftJis),
            "utf-8" | "utf8" => Ok(CharSet::Utf8),
            "gb2312" | "gbk" => Ok(CharSet::Gb2312),
            _ => Err(QrError::invalid_encoding(format!(
                "unsupported encoding label {label:?}"
            ))),
        }
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CharSet::Iso8859_1 => "iso-8859-1",
            CharSet::ShiftJis => "shift-jis",
            CharSet::Utf8 => "utf-8",
            CharSet::Gb2312 => "gb2312",
        })
    }
}

/// One run of content encoded in a single mode. Holds the mode-ready bytes
/// together with the recorded payload bits (headers are added later, once
/// the symbol version is known).
pub struct Segment {
    mode: Encoding,
    char_count: usize,
    charset: Option<CharSet>,
    raw: Vec<u8>,
    bits: QrBitRecorder,
}

impl Segment {
    /// Builds a segment from textual content in the requested mode. The
    /// charset argument applies to byte mode, where it heads the §4.1
    /// fallback chain.
    pub fn make(content: &str, mode: Encoding, charset: Option<CharSet>) -> QrResult<Segment> {
        match mode {
            Encoding::Numeric | Encoding::Alphanumeric => {
                Segment::from_raw(mode, content.as_bytes().to_vec(), None)
            }
            Encoding::Bytes => {
                let (raw, chosen) = encode_bytes_with_fallback(content, charset)?;
                Segment::from_raw(mode, raw, Some(chosen))
            }
            Encoding::Kanji => {
                let raw = CharSet::ShiftJis.encode_text(content).ok_or_else(|| {
                    QrError::invalid_mode("content is not representable in Shift JIS")
                })?;
                Segment::from_raw(mode, raw, None)
            }
            Encoding::Hanzi => {
                let raw = CharSet::Gb2312.encode_text(content).ok_or_else(|| {
                    QrError::invalid_mode("content is not representable in GB2312")
                })?;
                Segment::from_raw(mode, raw, Some(CharSet::Gb2312))
            }
        }
    }

    /// Builds a segment from mode-ready bytes (ASCII digits for numeric,
    /// the 45-char set for alphanumeric, charset-encoded bytes otherwise).
    fn from_raw(mode: Encoding, raw: Vec<u8>, charset: Option<CharSet>) -> QrResult<Segment> {
        let mut bits = QrBitRecorder::new();
        let char_count = match mode {
            Encoding::Numeric => {
                bitcoding::encode_numeric_data(&mut bits, &raw)?;
                raw.len()
            }
            Encoding::Alphanumeric => {
                bitcoding::encode_alphanumeric_data(&mut bits, &raw)?;
                raw.len()
            }
            Encoding::Bytes => {
                bitcoding::encode_byte_data(&mut bits, &raw);
                raw.len()
            }
            Encoding::Kanji => {
                bitcoding::encode_kanji_data(&mut bits, &raw)?;
                raw.len() / 2
            }
            Encoding::Hanzi => {
                bitcoding::encode_hanzi_data(&mut bits, &raw)?;
                raw.len() / 2
            }
        };
        Ok(Segment {
            mode,
            char_count,
            charset,
            raw,
            bits,
        })
    }

    pub fn mode(&self) -> Encoding {
        self.mode
    }

    /// Character count in mode units: digits, alphanumeric chars, bytes, or
    /// double-byte pairs.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Charset tag, present for byte and hanzi segments.
    pub fn charset(&self) -> Option<CharSet> {
        self.charset
    }

    /// Length of the recorded payload in bits.
    pub fn bit_len(&self) -> u32 {
        self.bits.written()
    }

    /// Whether this byte segment carries a non-default interpretation that
    /// an ECI header would have to declare.
    pub fn needs_eci(&self) -> bool {
        self.mode == Encoding::Bytes && self.charset.is_some_and(|cs| !cs.is_default())
    }

    pub(crate) fn bits(&self) -> &QrBitRecorder {
        &self.bits
    }

    /// Merges `next` into `self` when mode and charset agree. Re-encodes
    /// from the concatenated characters so partial numeric/alphanumeric
    /// groups re-pack into full groups.
    fn merge(self, next: Segment) -> Result<Segment, (Segment, Segment)> {
        if self.mode != next.mode || self.charset != next.charset {
            return Err((self, next));
        }
        let mut raw = self.raw;
        raw.extend_from_slice(&next.raw);
        // from_raw cannot fail here: both inputs already encoded cleanly.
        match Segment::from_raw(self.mode, raw, self.charset) {
            Ok(merged) => Ok(merged),
            Err(_) => unreachable!("merging two valid segments cannot fail"),
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("mode", &self.mode)
            .field("char_count", &self.char_count)
            .field("charset", &self.charset)
            .field("bit_len", &self.bit_len())
            .finish()
    }
}

/// Appends a segment to the list, merging with the tail when mode and
/// charset line up.
pub fn push_segment(segments: &mut Vec<Segment>, segment: Segment) {
    match segments.pop() {
        None => segments.push(segment),
        Some(tail) => match tail.merge(segment) {
            Ok(merged) => segments.push(merged),
            Err((tail, segment)) => {
                segments.push(tail);
                segments.push(segment);
            }
        },
    }
}

/// Picks the densest mode the whole content fits: numeric, then
/// alphanumeric, then kanji (Shift JIS double-byte pairs only), else byte.
pub fn detect_mode(content: &str) -> Encoding {
    if content.bytes().all(|b| b.is_ascii_digit()) {
        return Encoding::Numeric;
    }
    if content.bytes().all(|b| bitcoding::alphanumeric_index(b).is_some()) {
        return Encoding::Alphanumeric;
    }
    if is_kanji_only(content) {
        return Encoding::Kanji;
    }
    Encoding::Bytes
}

fn is_kanji_only(content: &str) -> bool {
    let Some(bytes) = CharSet::ShiftJis.encode_text(content) else {
        return false;
    };
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return false;
    }
    bytes.chunks(2).all(|pair| {
        let code = u16::from(pair[0]) << 8 | u16::from(pair[1]);
        (0x8140..=0x9FFC).contains(&code) || (0xE040..=0xEBBF).contains(&code)
    })
}

fn encode_bytes_with_fallback(
    content: &str,
    preferred: Option<CharSet>,
) -> QrResult<(Vec<u8>, CharSet)> {
    let chain = [CharSet::Iso8859_1, CharSet::ShiftJis, CharSet::Utf8];
    let candidates = preferred.into_iter().chain(chain);
    for charset in candidates {
        if let Some(bytes) = charset.encode_text(content) {
            return Ok((bytes, charset));
        }
    }
    Err(QrError::invalid_content(
        "content is not representable in any supported byte encoding",
    ))
}

/// Produces the segment list for one `encode` call: a single segment in the
/// forced or auto-detected mode, passed through the merge rule.
pub fn build_segments(
    content: &str,
    mode: Option<Encoding>,
    charset: Option<CharSet>,
) -> QrResult<Vec<Segment>> {
    if content.is_empty() {
        return Err(QrError::invalid_input("content must not be empty"));
    }
    let mode = mode.unwrap_or_else(|| detect_mode(content));
    let mut segments = Vec::new();
    push_segment(&mut segments, Segment::make(content, mode, charset)?);
    Ok(segments)
}
