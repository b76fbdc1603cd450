//! Symbol matrix assembly: the module canvas with its construction-time
//! sentinel values, the function patterns, and the zig-zag data placement.

use crate::config::Size;

use std::cmp;

pub mod masking;

/// During the assembly of the module matrix there are sentinel cell values
/// beyond the final black/white, used in the following way:
///   MARKER_ENCODING_REGION: cells of the encoding region not yet carrying
///   a codeword bit (everything the canvas creation did not claim);
///   MARKER_RESERVED: format/version information cells, written only after
///   the mask has been chosen.
pub const BIT_WHITE: u8 = 0;
pub const BIT_BLACK: u8 = 1;
pub const MARKER_ENCODING_REGION: u8 = 100;
pub const MARKER_RESERVED: u8 = 101;

/// Square module matrix under construction, row-major, no quiet zone.
#[derive(Clone)]
pub struct Canvas {
    width: usize,
    cells: Vec<u8>,
}

impl Canvas {
    fn new(width: usize) -> Canvas {
        Canvas {
            width,
            cells: vec![MARKER_ENCODING_REGION; width * width],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Cell value at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.cells[y * self.width + x] = value;
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == BIT_BLACK
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

/// Paints a finder pattern centred at `(cx, cy)` together with its white
/// separator ring, clipped to the canvas. The concentric rings fall out of
/// the chebyshev distance to the centre: dark core and dark ring at
/// distances {0,1,3}, white at {2,4}.
fn draw_finder_pattern(canvas: &mut Canvas, cx: i32, cy: i32) {
    let width = canvas.width() as i32;
    for dy in -4..=4 {
        for dx in -4..=4 {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= width || y >= width {
                continue;
            }
            let r = cmp::max(dx.abs(), dy.abs());
            let value = if r < 2 || r == 3 { BIT_BLACK } else { BIT_WHITE };
            canvas.set(x as usize, y as usize, value);
        }
    }
}

/// Paints a 5×5 alignment pattern centred at `(cx, cy)`: dark at even
/// chebyshev distance from the centre.
fn draw_alignment_pattern(canvas: &mut Canvas, cx: usize, cy: usize) {
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let r = cmp::max(dx.abs(), dy.abs());
            let value = if r % 2 == 0 { BIT_BLACK } else { BIT_WHITE };
            canvas.set((cx as i32 + dx) as usize, (cy as i32 + dy) as usize, value);
        }
    }
}

/// Creates a vector with alignment coordinates, i.e. the numbers from the
/// row of table E.1 in Annex E.
pub fn create_alignment_pattern_coord_list(version: u8) -> Vec<i32> {
    let size = version;
    let mut row = Vec::new();
    row.push(6);
    if size >= 2 && size < 7 {
        row.push((size as i32 - 2) * 4 + 18);
    } else if size >= 7 && size < 14 {
        row.push((size as i32 - 7) * 2 + 22);
        row.push((size as i32 - 7) * 4 + 38);
    } else if size >= 14 && size < 21 {
        let a = ((size as i32 - 14) / 3) * 4 + 26;
        let b = (size as i32 - 14) * 4 + 66;
        row.push(a);
        row.push((a + b) / 2);
        row.push(b);
    } else if size >= 21 && size < 28 {
        let b = ((size as i32 - 21) / 2) * 4 + 50;
        let d = (size as i32 - 21) * 4 + 94;
        row.push(match size {
            21 => 28,
            22 => 26,
            23 => 30,
            24 => 28,
            25 => 32,
            26 => 30,
            27 => 34,
            _ => unreachable!(),
        });
        row.push(b);
        row.push((b + d) / 2);
        row.push(d);
    } else if size >= 28 && size < 35 {
        row.extend_from_slice(match size {
            28 => &[26, 50, 74, 98, 122],
            29 => &[30, 54, 78, 102, 126],
            30 => &[26, 52, 78, 104, 130],
            31 => &[30, 56, 82, 108, 134],
            32 => &[34, 60, 86, 112, 138],
            33 => &[30, 58, 86, 114, 142],
            34 => &[34, 62, 90, 118, 146],
            _ => unreachable!(),
        });
    } else if size >= 35 && size <= 40 {
        row.extend_from_slice(match size {
            35 => &[30, 54, 78, 102, 126, 150],
            36 => &[24, 50, 76, 102, 128, 154],
            37 => &[28, 54, 80, 106, 132, 158],
            38 => &[32, 58, 84, 110, 136, 162],
            39 => &[26, 54, 82, 110, 138, 166],
            40 => &[30, 58, 86, 114, 142, 170],
            _ => unreachable!(),
        });
    }
    row
}

/// Creates a vector with alignment coordinate pairs (x,y) from the entries
/// returned by create_alignment_pattern_coord_list, leaving out the three
/// positions covered by finder patterns.
fn get_alignment_pattern_points(version: u8) -> Vec<(i32, i32)> {
    let coords = create_alignment_pattern_coord_list(version);
    let last_coord_index = coords.len() - 1;
    let mut points = Vec::new();
    for (i, &s) in coords.iter().enumerate() {
        for (j, &t) in coords.iter().enumerate() {
            if (i == 0 && j == 0)
                || (i == 0 && j == last_coord_index)
                || (i == last_coord_index && j == 0)
            {
                continue;
            }
            points.push((s, t));
        }
    }
    points
}

fn create_standard_qr_canvas(version: u8) -> Canvas {
    let width = Size::Standard(version).width();
    let mut canvas = Canvas::new(width);

    // three finder patterns with their separators
    draw_finder_pattern(&mut canvas, 3, 3);
    draw_finder_pattern(&mut canvas, width as i32 - 4, 3);
    draw_finder_pattern(&mut canvas, 3, width as i32 - 4);

    // timing patterns along row and column 6, between the finders
    for i in 8..width - 8 {
        let value = if i % 2 == 0 { BIT_BLACK } else { BIT_WHITE };
        canvas.set(i, 6, value);
        canvas.set(6, i, value);
    }

    // alignment patterns only for version >= 2
    if version >= 2 {
        for (x, y) in get_alignment_pattern_points(version) {
            draw_alignment_pattern(&mut canvas, x as usize, y as usize);
        }
    }

    // the dark module above the bottom-left finder
    canvas.set(8, width - 8, BIT_BLACK);

    // reserve both format information strips
    for x in 0..=5 {
        canvas.set(x, 8, MARKER_RESERVED);
    }
    canvas.set(7, 8, MARKER_RESERVED);
    canvas.set(8, 8, MARKER_RESERVED);
    canvas.set(8, 7, MARKER_RESERVED);
    for y in 0..=5 {
        canvas.set(8, y, MARKER_RESERVED);
    }
    for i in 0..8 {
        canvas.set(width - 1 - i, 8, MARKER_RESERVED);
    }
    for i in 0..7 {
        canvas.set(8, width - 1 - i, MARKER_RESERVED);
    }

    // reserve the two version information blocks for versions >= 7
    if version >= 7 {
        for i in 0..18 {
            let x = width - 11 + i % 3;
            let y = i / 3;
            canvas.set(x, y, MARKER_RESERVED);
            canvas.set(y, x, MARKER_RESERVED);
        }
    }

    canvas
}

fn create_micro_qr_canvas(version: u8) -> Canvas {
    let width = Size::Micro(version).width();
    let mut canvas = Canvas::new(width);

    // single finder pattern in the top-left corner
    draw_finder_pattern(&mut canvas, 3, 3);

    // timing patterns along row and column 0, up to the symbol edge
    for i in 8..width {
        let value = if i % 2 == 0 { BIT_BLACK } else { BIT_WHITE };
        canvas.set(i, 0, value);
        canvas.set(0, i, value);
    }

    // reserve the single format information strip
    for y in 1..=8 {
        canvas.set(8, y, MARKER_RESERVED);
    }
    for x in 1..=7 {
        canvas.set(x, 8, MARKER_RESERVED);
    }

    canvas
}

/// Returns a canvas with all the basic furnishings of a symbol: finder,
/// timing and alignment patterns, the dark module, and the reserved
/// format/version regions. Everything else is the encoding region.
pub fn create_qr_canvas(size: Size) -> Canvas {
    match size {
        Size::Micro(v) => create_micro_qr_canvas(v),
        Size::Standard(v) => create_standard_qr_canvas(v),
    }
}

/// Iterator over the placement bit sequence: the data codewords (cut to
/// their exact bit count, which trims the filler nibble of M1/M3), then
/// the check codewords, MSB first.
struct PlacementBits<'a> {
    data: &'a [u8],
    data_bits: usize,
    ecc: &'a [u8],
    index: usize,
}

impl Iterator for PlacementBits<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let bit = |bytes: &[u8], i: usize| (bytes[i / 8] >> (7 - i % 8)) & 1;
        let i = self.index;
        self.index += 1;
        if i < self.data_bits {
            Some(bit(self.data, i))
        } else if i < self.data_bits + self.ecc.len() * 8 {
            Some(bit(self.ecc, i - self.data_bits))
        } else {
            None
        }
    }
}

/// Walks the encoding region in the standard order — two-column strips from
/// the right edge, zig-zagging upward first, skipping the timing column of
/// standard symbols — and fills every free cell with the next codeword bit.
/// Cells past the end of the stream become the zero remainder bits.
pub fn insert_data_payload(canvas: &mut Canvas, size: Size, data: &[u8], ecc: &[u8]) {
    let data_bits = if matches!(size, Size::Micro(1) | Size::Micro(3)) {
        data.len() * 8 - 4
    } else {
        data.len() * 8
    };
    let mut bits = PlacementBits {
        data,
        data_bits,
        ecc,
        index: 0,
    };

    let width = canvas.width();
    let mut right = width as i32 - 1;
    let mut strip = 0;
    while right >= 1 {
        if !size.is_micro() && right == 6 {
            right = 5;
        }
        for vert in 0..width {
            let y = if strip % 2 == 0 { width - 1 - vert } else { vert };
            for j in 0..2 {
                let x = (right - j) as usize;
                if canvas.get(x, y) == MARKER_ENCODING_REGION {
                    let bit = bits.next().unwrap_or(BIT_WHITE);
                    canvas.set(x, y, bit);
                }
            }
        }
        right -= 2;
        strip += 1;
    }
}
