//! Reed-Solomon error correction over GF(2⁸) with the primitive polynomial
//! 0x11D: block splitting per the capacity table, check-word generation by
//! polynomial division in the log domain, and block interleaving.

use crate::config::{ECCLevel, Size};
use crate::error::{QrError, QrResult};
use crate::tables::{lookup_capacity, BlockDef};

use lazy_static::lazy_static;

const GF_PRIM: u16 = 0x11D; // x^8 + x^4 + x^3 + x^2 + 1

struct GaloisTables {
    exp: [u8; 512], // doubled so products of two logs index without wrapping
    log: [u8; 256],
}

lazy_static! {
    static ref GF: GaloisTables = {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255 {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= GF_PRIM;
            }
        }
        for i in 255..512 {
            exp[i] = exp[i - 255];
        }
        GaloisTables { exp, log }
    };
}

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        0
    } else {
        GF.exp[GF.log[a as usize] as usize + GF.log[b as usize] as usize]
    }
}

/// Coefficients of the degree-`r` generator polynomial
/// `(x − α⁰)(x − α¹)…(x − α^{r−1})` below the (implicit, monic) leading
/// term, highest degree first, in the log domain.
fn generator_poly_log(degree: usize) -> Vec<u8> {
    let mut coeffs = vec![0u8; degree - 1];
    coeffs.push(1); // start off with the monomial x^0
    let mut root: u8 = 1;
    for _ in 0..degree {
        for j in 0..degree {
            coeffs[j] = gf_mul(coeffs[j], root);
            if j + 1 < degree {
                coeffs[j] ^= coeffs[j + 1];
            }
        }
        root = gf_mul(root, 0x02);
    }
    coeffs
        .into_iter()
        .map(|c| {
            // generator coefficients are products of distinct powers of α
            // and never vanish
            debug_assert!(c != 0);
            GF.log[c as usize]
        })
        .collect()
}

/// Remainder of `data·x^r` divided by the generator: the `r` check bytes
/// appended to a block.
fn rs_remainder(data: &[u8], gen_log: &[u8]) -> Vec<u8> {
    let r = gen_log.len();
    let mut rem = vec![0u8; r];
    for &c in data {
        let factor = c ^ rem[0];
        rem.rotate_left(1);
        rem[r - 1] = 0;
        if factor != 0 {
            let log_factor = GF.log[factor as usize] as usize;
            for j in 0..r {
                rem[j] ^= GF.exp[log_factor + gen_log[j] as usize];
            }
        }
    }
    rem
}

fn block_lengths(def: BlockDef) -> impl Iterator<Item = usize> {
    (0..def.num_blocks).map(move |_| def.data_codewords as usize)
}

/// Splits the data codewords into RS blocks, computes the check words of
/// every block and interleaves both sequences column-wise. Returns the
/// interleaved data bytes and the interleaved error correction bytes.
pub fn construct_codewords(data: &[u8], size: Size, ecl: ECCLevel) -> QrResult<(Vec<u8>, Vec<u8>)> {
    let capacity = lookup_capacity(size, ecl)?;
    if data.len() != capacity.data_codewords() as usize {
        return Err(QrError::invalid_version(format!(
            "{} data codewords do not match the {} expected by version {size}-{ecl}",
            data.len(),
            capacity.data_codewords()
        )));
    }

    // chop into blocks: group 1 first, then the longer group 2 blocks
    let mut blocks: Vec<&[u8]> = Vec::new();
    let mut offset = 0;
    for len in block_lengths(capacity.block_def1).chain(block_lengths(capacity.block_def2)) {
        blocks.push(&data[offset..offset + len]);
        offset += len;
    }

    // every block in a symbol carries the same number of check words
    let ecc_len = (capacity.block_def1.codewords - capacity.block_def1.data_codewords) as usize;
    let gen_log = generator_poly_log(ecc_len);
    let ecc_blocks: Vec<Vec<u8>> = blocks.iter().map(|b| rs_remainder(b, &gen_log)).collect();

    // column-wise interleave: the i-th byte of every block in order,
    // skipping blocks shorter than i
    let max_data_len = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
    let mut data_out = Vec::with_capacity(data.len());
    for i in 0..max_data_len {
        for block in &blocks {
            if let Some(&byte) = block.get(i) {
                data_out.push(byte);
            }
        }
    }
    let mut ecc_out = Vec::with_capacity(ecc_len * blocks.len());
    for i in 0..ecc_len {
        for block in &ecc_blocks {
            ecc_out.push(block[i]);
        }
    }
    Ok((data_out, ecc_out))
}
