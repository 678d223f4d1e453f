//! Reed–Solomon error correction over GF(256) and block interleaving.
//!
//! The field uses the primitive polynomial x⁸+x⁴+x³+x²+1 (0x11d) with
//! generator α = 2. Both lookup tables are evaluated at compile time.

use crate::capacity::Capacity;
use crate::types::{QrError, QrResult};

const PRIMITIVE: u16 = 0x11d;

const fn build_exp_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        table[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    // α^255 = α^0
    table[255] = 1;
    table
}

const fn build_log_table(exp: &[u8; 256]) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

static EXP_TABLE: [u8; 256] = build_exp_table();
static LOG_TABLE: [u8; 256] = build_log_table(&build_exp_table());

/// α raised to `power`.
pub fn gf_exp(power: usize) -> u8 {
    EXP_TABLE[power % 255]
}

/// Multiplication in GF(256).
pub fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    gf_exp(LOG_TABLE[a as usize] as usize + LOG_TABLE[b as usize] as usize)
}

/// The generator polynomial (x - α⁰)(x - α¹)…(x - α^(degree-1)), highest
/// coefficient first. The leading coefficient is always 1.
pub fn generator_polynomial(degree: usize) -> Vec<u8> {
    let mut poly = vec![1u8];
    for i in 0..degree {
        let root = gf_exp(i);
        let mut next = vec![0u8; poly.len() + 1];
        for (j, &coeff) in poly.iter().enumerate() {
            next[j] ^= coeff;
            next[j + 1] ^= gf_mul(coeff, root);
        }
        poly = next;
    }
    poly
}

/// Computes the `ec_len` error correction codewords of one block: the
/// remainder of `data(x)·x^ec_len` divided by the generator polynomial.
pub fn create_error_correction_code(data: &[u8], ec_len: usize) -> Vec<u8> {
    let generator = generator_polynomial(ec_len);
    let mut remainder = data.to_vec();
    remainder.resize(data.len() + ec_len, 0);

    for i in 0..data.len() {
        let lead = remainder[i];
        if lead == 0 {
            continue;
        }
        for (r, &g) in remainder[i..].iter_mut().zip(generator.iter()) {
            *r ^= gf_mul(g, lead);
        }
    }

    remainder.split_off(data.len())
}

/// Reads one item from each block in turn. Blocks that run out are skipped,
/// so the trailing items of the longer blocks come last.
pub fn interleave<T: Copy, B: AsRef<[T]>>(blocks: &[B]) -> Vec<T> {
    let longest = blocks.iter().map(|b| b.as_ref().len()).max().unwrap_or(0);
    let total = blocks.iter().map(|b| b.as_ref().len()).sum();
    let mut result = Vec::with_capacity(total);
    for i in 0..longest {
        for block in blocks {
            if let Some(&item) = block.as_ref().get(i) {
                result.push(item);
            }
        }
    }
    result
}

/// Splits the data codewords into blocks, computes each block's error
/// correction codewords and interleaves both sequences.
///
/// Returns `(interleaved data, interleaved error correction)`.
///
/// # Errors
///
/// Returns `Err(QrError::CodewordCountMismatch)` if `data` does not hold
/// exactly the data codeword count of `capacity`.
pub fn construct_codewords(data: &[u8], capacity: &Capacity) -> QrResult<(Vec<u8>, Vec<u8>)> {
    if data.len() != capacity.data_codewords {
        return Err(QrError::CodewordCountMismatch {
            actual: data.len(),
            expected: capacity.data_codewords,
        });
    }

    let mut blocks = Vec::with_capacity(capacity.blocks);
    let mut rest = data;
    for len in capacity.block_data_lens() {
        let (block, tail) = rest.split_at(len);
        blocks.push(block);
        rest = tail;
    }

    let ec_blocks: Vec<Vec<u8>> = blocks
        .iter()
        .map(|block| create_error_correction_code(block, capacity.ec_codewords_per_block))
        .collect();

    Ok((interleave(&blocks), interleave(&ec_blocks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EcLevel, Version};

    #[test]
    fn exp_and_log_are_inverse() {
        for x in 1..=255u8 {
            assert_eq!(gf_exp(LOG_TABLE[x as usize] as usize), x);
        }
        assert_eq!(gf_exp(8), 0x1d);
    }

    #[test]
    fn multiplication() {
        assert_eq!(gf_mul(0, 0x53), 0);
        assert_eq!(gf_mul(1, 0x53), 0x53);
        assert_eq!(gf_mul(2, 0x80), 0x1d);
        for a in 1..=255u8 {
            for b in [1u8, 2, 3, 0x8e, 0xff] {
                assert_eq!(gf_mul(a, b), gf_mul(b, a));
            }
        }
    }

    #[test]
    fn generator_of_degree_10() {
        assert_eq!(
            generator_polynomial(10),
            vec![1, 216, 194, 159, 111, 199, 94, 95, 113, 157, 193]
        );
    }

    #[test]
    fn test_poly_mod_1() {
        let res = create_error_correction_code(
            b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11",
            10,
        );
        assert_eq!(&*res, b"\xc4#'w\xeb\xd7\xe7\xe2]\x17");
    }

    #[test]
    fn test_poly_mod_2() {
        let data = [
            0x10, 0x20, 0x0c, 0x56, 0x61, 0x80, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11,
            0xec, 0x11,
        ];
        assert_eq!(
            create_error_correction_code(&data, 10),
            vec![0xa5, 0x24, 0xd4, 0xc1, 0xed, 0x36, 0xc7, 0x87, 0x2c, 0x55]
        );
    }

    #[test]
    fn remainder_is_deterministic() {
        let block = b"upi://pay?pa=alice@examplebank";
        let first = create_error_correction_code(block, 15);
        let second = create_error_correction_code(block, 15);
        assert_eq!(first, second);
        assert_eq!(first.len(), 15);
    }

    #[test]
    fn uneven_interleave() {
        let blocks: [&[u8]; 3] = [&[1, 2], &[3, 4], &[5, 6, 7]];
        assert_eq!(interleave(&blocks), vec![1, 3, 5, 2, 4, 6, 7]);
    }

    #[test]
    fn construct_codewords_counts() {
        let cap = Capacity::lookup(Version::new(5).unwrap(), EcLevel::Q);
        let data: Vec<u8> = (0..cap.data_codewords as u8).collect();
        let (encoded, ec) = construct_codewords(&data, &cap).unwrap();
        assert_eq!(encoded.len(), 62);
        assert_eq!(ec.len(), 4 * 18);
        // First column of the four blocks, then the extra codewords of the
        // two long blocks at the very end.
        assert_eq!(&encoded[..4], &[0, 15, 30, 46]);
        assert_eq!(&encoded[60..], &[45, 61]);
        assert_eq!(encoded.len() + ec.len(), cap.total_codewords);
    }

    #[test]
    fn construct_codewords_rejects_wrong_length() {
        let cap = Capacity::lookup(Version::new(1).unwrap(), EcLevel::L);
        assert_eq!(
            construct_codewords(&[0; 18], &cap),
            Err(QrError::CodewordCountMismatch {
                actual: 18,
                expected: 19,
            })
        );
    }
}
