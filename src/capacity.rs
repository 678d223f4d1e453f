//! Fixed codeword and block tables of ISO/IEC 18004.

use crate::types::{EcLevel, Mode, QrError, QrResult, Version};

/// Codeword budget of one (version, error correction level) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    version: Version,
    ec_level: EcLevel,
    /// Total codewords in the symbol, data and error correction together.
    pub total_codewords: usize,
    /// Codewords available for the data bitstream.
    pub data_codewords: usize,
    /// Error correction codewords appended to every block.
    pub ec_codewords_per_block: usize,
    /// Number of error correction blocks.
    pub blocks: usize,
    /// Blocks that carry one data codeword less than the rest. They come first.
    pub short_blocks: usize,
    /// Data codewords in each short block.
    pub short_block_data_len: usize,
}

impl Capacity {
    pub fn lookup(version: Version, ec_level: EcLevel) -> Self {
        let total_codewords = TOTAL_CODEWORDS[(version.number() - 1) as usize] as usize;
        let ec_codewords_per_block = version.fetch(ec_level, &EC_CODEWORDS_PER_BLOCK) as usize;
        let blocks = version.fetch(ec_level, &NUM_BLOCKS) as usize;
        let short_blocks = blocks - total_codewords % blocks;
        let short_block_data_len = total_codewords / blocks - ec_codewords_per_block;
        Self {
            version,
            ec_level,
            total_codewords,
            data_codewords: total_codewords - ec_codewords_per_block * blocks,
            ec_codewords_per_block,
            blocks,
            short_blocks,
            short_block_data_len,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn ec_level(&self) -> EcLevel {
        self.ec_level
    }

    pub fn data_bits(&self) -> usize {
        self.data_codewords * 8
    }

    /// Data codewords of every block, in block order.
    pub fn block_data_lens(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.blocks).map(move |i| {
            if i < self.short_blocks {
                self.short_block_data_len
            } else {
                self.short_block_data_len + 1
            }
        })
    }

    /// The largest payload, in bytes, that a single BYTE mode segment can
    /// carry.
    pub fn max_byte_payload(&self) -> usize {
        let length_bits = Mode::Byte.length_bits_count(self.version);
        let by_capacity = (self.data_bits() - 4 - length_bits) / 8;
        by_capacity.min((1 << length_bits) - 1)
    }

    /// Checks that `needed` data bits fit into this capacity.
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::CapacityExceeded)` when they do not.
    pub fn ensure_fits(&self, needed: usize) -> QrResult<()> {
        if needed > self.data_bits() {
            Err(QrError::CapacityExceeded {
                needed,
                capacity: self.data_bits(),
            })
        } else {
            Ok(())
        }
    }
}

/// Modules left over after all codewords are placed.
pub fn remainder_bits(version: Version) -> usize {
    REMAINDER_BITS[(version.number() - 1) as usize] as usize
}

/// Row/column centers of the alignment patterns.
pub fn alignment_pattern_positions(version: Version) -> &'static [u8] {
    ALIGNMENT_PATTERN_POSITIONS[(version.number() - 1) as usize]
}

// ISO/IEC 18004:2006 Table 1.
static TOTAL_CODEWORDS: [u16; 40] = [
    26, 44, 70, 100, 134, 172, 196, 242, 292, 346, 404, 466, 532, 581, 655, 733, 815, 901, 991,
    1085, 1156, 1258, 1364, 1474, 1588, 1706, 1828, 1921, 2051, 2185, 2323, 2465, 2611, 2761,
    2876, 3034, 3196, 3362, 3532, 3706,
];

static REMAINDER_BITS: [u8; 40] = [
    0, 7, 7, 7, 7, 7, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 3, 3, 3, 3,
    3, 3, 3, 0, 0, 0, 0, 0, 0,
];

// ISO/IEC 18004:2006 Table 9, [L, M, Q, H].
static EC_CODEWORDS_PER_BLOCK: [[u8; 4]; 40] = [
    [7, 10, 13, 17],
    [10, 16, 22, 28],
    [15, 26, 18, 22],
    [20, 18, 26, 16],
    [26, 24, 18, 22],
    [18, 16, 24, 28],
    [20, 18, 18, 26],
    [24, 22, 22, 26],
    [30, 22, 20, 24],
    [18, 26, 24, 28],
    [20, 30, 28, 24],
    [24, 22, 26, 28],
    [26, 22, 24, 22],
    [30, 24, 20, 24],
    [22, 24, 30, 24],
    [24, 28, 24, 30],
    [28, 28, 28, 28],
    [30, 26, 28, 28],
    [28, 26, 26, 26],
    [28, 26, 30, 28],
    [28, 26, 28, 30],
    [28, 28, 30, 24],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [26, 28, 30, 30],
    [28, 28, 28, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
];

static NUM_BLOCKS: [[u8; 4]; 40] = [
    [1, 1, 1, 1],
    [1, 1, 1, 1],
    [1, 1, 2, 2],
    [1, 2, 2, 4],
    [1, 2, 4, 4],
    [2, 4, 4, 4],
    [2, 4, 6, 5],
    [2, 4, 6, 6],
    [2, 5, 8, 8],
    [4, 5, 8, 8],
    [4, 5, 8, 11],
    [4, 8, 10, 11],
    [4, 9, 12, 16],
    [4, 9, 16, 16],
    [6, 10, 12, 18],
    [6, 10, 17, 16],
    [6, 11, 16, 19],
    [6, 13, 18, 21],
    [7, 14, 21, 25],
    [8, 16, 20, 25],
    [8, 17, 23, 25],
    [9, 17, 23, 34],
    [9, 18, 25, 30],
    [10, 20, 27, 32],
    [12, 21, 29, 35],
    [12, 23, 34, 37],
    [12, 25, 34, 40],
    [13, 26, 35, 42],
    [14, 28, 38, 45],
    [15, 29, 40, 48],
    [16, 31, 43, 51],
    [17, 33, 45, 54],
    [18, 35, 48, 57],
    [19, 37, 51, 60],
    [19, 38, 53, 63],
    [20, 40, 56, 66],
    [21, 43, 59, 70],
    [22, 45, 62, 74],
    [24, 47, 65, 77],
    [25, 49, 68, 81],
];

// ISO/IEC 18004:2006 Annex E.
static ALIGNMENT_PATTERN_POSITIONS: [&[u8]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    // Data capacity in bits, ISO/IEC 18004:2006 Table 7.
    static DATA_LENGTHS: [[usize; 4]; 40] = [
        [152, 128, 104, 72],
        [272, 224, 176, 128],
        [440, 352, 272, 208],
        [640, 512, 384, 288],
        [864, 688, 496, 368],
        [1088, 864, 608, 480],
        [1248, 992, 704, 528],
        [1552, 1232, 880, 688],
        [1856, 1456, 1056, 800],
        [2192, 1728, 1232, 976],
        [2592, 2032, 1440, 1120],
        [2960, 2320, 1648, 1264],
        [3424, 2672, 1952, 1440],
        [3688, 2920, 2088, 1576],
        [4184, 3320, 2360, 1784],
        [4712, 3624, 2600, 2024],
        [5176, 4056, 2936, 2264],
        [5768, 4504, 3176, 2504],
        [6360, 5016, 3560, 2728],
        [6888, 5352, 3880, 3080],
        [7456, 5712, 4096, 3248],
        [8048, 6256, 4544, 3536],
        [8752, 6880, 4912, 3712],
        [9392, 7312, 5312, 4112],
        [10208, 8000, 5744, 4304],
        [10960, 8496, 6032, 4768],
        [11744, 9024, 6464, 5024],
        [12248, 9544, 6968, 5288],
        [13048, 10136, 7288, 5608],
        [13880, 10984, 7880, 5960],
        [14744, 11640, 8264, 6344],
        [15640, 12328, 8920, 6760],
        [16568, 13048, 9368, 7208],
        [17528, 13800, 9848, 7688],
        [18448, 14496, 10288, 7888],
        [19472, 15312, 10832, 8432],
        [20528, 15936, 11408, 8768],
        [21616, 16816, 12016, 9136],
        [22496, 17728, 12656, 9776],
        [23648, 18672, 13328, 10208],
    ];

    #[test]
    fn data_codewords_match_table_7() {
        for version in Version::all() {
            for ec_level in EcLevel::ALL {
                let cap = Capacity::lookup(version, ec_level);
                assert_eq!(
                    cap.data_bits(),
                    version.fetch(ec_level, &DATA_LENGTHS),
                    "{version}-{ec_level}"
                );
            }
        }
    }

    #[test]
    fn total_codewords_fill_the_symbol() {
        for version in Version::all() {
            let w = version.width();
            let positions = alignment_pattern_positions(version).len();
            let alignments = if positions == 0 {
                0
            } else {
                positions * positions - 3
            };
            // Finders with separators and format info, timing, alignment, dark module.
            let mut function = 3 * 64 + 31 + 2 * (w - 16) + 25 * alignments;
            if positions > 2 {
                // Alignment patterns on the timing lines share modules with them.
                function -= 10 * (positions - 2);
            }
            if version.has_version_info() {
                function += 36;
            }
            let free = w * w - function;
            let cap = Capacity::lookup(version, EcLevel::L);
            assert_eq!(
                free,
                cap.total_codewords * 8 + remainder_bits(version),
                "version {version}"
            );
        }
    }

    #[test]
    fn blocks_partition_the_data() {
        for version in Version::all() {
            for ec_level in EcLevel::ALL {
                let cap = Capacity::lookup(version, ec_level);
                let sum: usize = cap.block_data_lens().sum();
                assert_eq!(sum, cap.data_codewords);
                assert!(cap.short_blocks >= 1 && cap.short_blocks <= cap.blocks);
            }
        }
    }

    #[test]
    fn version_5_q_has_two_groups() {
        let cap = Capacity::lookup(v(5), EcLevel::Q);
        assert_eq!(cap.blocks, 4);
        assert_eq!(cap.ec_codewords_per_block, 18);
        assert_eq!(cap.block_data_lens().collect::<Vec<_>>(), vec![15, 15, 16, 16]);
    }

    #[test]
    fn byte_payload_limits() {
        assert_eq!(Capacity::lookup(v(1), EcLevel::H).max_byte_payload(), 7);
        assert_eq!(Capacity::lookup(v(1), EcLevel::L).max_byte_payload(), 17);
        assert_eq!(Capacity::lookup(v(3), EcLevel::L).max_byte_payload(), 53);
        assert_eq!(Capacity::lookup(v(40), EcLevel::L).max_byte_payload(), 2953);
    }

    #[test]
    fn ensure_fits_reports_capacity() {
        let cap = Capacity::lookup(v(1), EcLevel::M);
        assert_eq!(cap.ensure_fits(128), Ok(()));
        assert_eq!(
            cap.ensure_fits(129),
            Err(QrError::CapacityExceeded {
                needed: 129,
                capacity: 128,
            })
        );
    }
}
