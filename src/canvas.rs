//! The `canvas` module puts raw codewords into a QR code matrix.
//!
//! Construction happens in three passes: function patterns are stamped first,
//! codewords are then placed in the zig-zag order into every module left
//! unset, and finally the best of the eight mask patterns is applied together
//! with the matching format information.

use tracing::{debug, error};

use crate::capacity::{alignment_pattern_positions, remainder_bits, Capacity};
use crate::types::{Color, EcLevel, QrError, QrResult, Version};

/// The state of one module while the matrix is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    /// Not yet assigned.
    Unset,
    /// Part of a function pattern or reserved area. Never masked.
    Function(Color),
    /// Carries a data, error correction or remainder bit. Subject to masking.
    Data(Color),
}

impl Module {
    /// The color of the module; unset modules read as light.
    pub fn color(self) -> Color {
        match self {
            Module::Unset => Color::Light,
            Module::Function(c) | Module::Data(c) => c,
        }
    }

    pub fn is_function(self) -> bool {
        matches!(self, Module::Function(_))
    }
}

/// One of the eight data mask patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub const ALL: [MaskPattern; 8] = [
        MaskPattern(0),
        MaskPattern(1),
        MaskPattern(2),
        MaskPattern(3),
        MaskPattern(4),
        MaskPattern(5),
        MaskPattern(6),
        MaskPattern(7),
    ];

    /// # Errors
    ///
    /// Returns `Err(QrError::InvalidParameters)` for values above 7.
    pub fn new(index: u8) -> QrResult<Self> {
        if index < 8 {
            Ok(MaskPattern(index))
        } else {
            Err(QrError::InvalidParameters("mask pattern must be between 0 and 7"))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Whether the data module at column `x`, row `y` gets inverted.
    pub fn applies(self, x: usize, y: usize) -> bool {
        let (i, j) = (y, x);
        match self.0 {
            0 => (i + j) % 2 == 0,
            1 => i % 2 == 0,
            2 => j % 3 == 0,
            3 => (i + j) % 3 == 0,
            4 => (i / 2 + j / 3) % 2 == 0,
            5 => (i * j) % 2 + (i * j) % 3 == 0,
            6 => ((i * j) % 2 + (i * j) % 3) % 2 == 0,
            _ => ((i + j) % 2 + (i * j) % 3) % 2 == 0,
        }
    }
}

/// The 15-bit format information word: error correction level and mask,
/// BCH(15,5) coded and XOR-ed with 0x5412.
pub fn format_info_bits(ec_level: EcLevel, mask: MaskPattern) -> u16 {
    let data = ec_level.format_bits() << 3 | u16::from(mask.index());
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    (data << 10 | rem) ^ 0x5412
}

/// The 18-bit version information word, BCH(18,6) coded.
pub fn version_info_bits(version: Version) -> u32 {
    let data = u32::from(version.number());
    let mut rem = data;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
    }
    data << 12 | rem
}

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// 1:1:3:1:1 finder-like run with four light modules on one side.
const FINDER_LIKE: [[bool; 11]; 2] = [
    [true, false, true, true, true, false, true, false, false, false, false],
    [false, false, false, false, true, false, true, true, true, false, true],
];

#[derive(Clone, Debug)]
pub struct Canvas {
    width: usize,
    version: Version,
    ec_level: EcLevel,
    modules: Vec<Module>,
}

impl Canvas {
    /// Constructs a new canvas big enough for a QR code of the given version.
    pub fn new(version: Version, ec_level: EcLevel) -> Self {
        let width = version.width();
        Self {
            width,
            version,
            ec_level,
            modules: vec![Module::Unset; width * width],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Obtains the module at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Module {
        self.modules[y * self.width + x]
    }

    fn put(&mut self, x: usize, y: usize, color: Color) {
        self.modules[y * self.width + x] = Module::Function(color);
    }

    /// Converts the canvas into a row-major list of colors.
    pub fn into_colors(self) -> Vec<Color> {
        self.modules.into_iter().map(Module::color).collect()
    }

    /// Draws all function patterns and reserves the format and version
    /// information areas.
    pub fn draw_all_functional_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
        self.draw_format_info(MaskPattern(0));
        self.draw_version_info();
    }
}

//------------------------------------------------------------------------------
// Finder patterns

impl Canvas {
    /// A 7×7 finder centered on (`cx`, `cy`) with its light separator, clipped
    /// to the symbol.
    fn draw_finder_pattern_at(&mut self, cx: isize, cy: isize) {
        let w = self.width as isize;
        for dy in -4..=4isize {
            for dx in -4..=4isize {
                let (x, y) = (cx + dx, cy + dy);
                if !(0..w).contains(&x) || !(0..w).contains(&y) {
                    continue;
                }
                let ring = dx.abs().max(dy.abs());
                let color = Color::from(ring != 2 && ring != 4);
                self.put(x as usize, y as usize, color);
            }
        }
    }

    fn draw_finder_patterns(&mut self) {
        let far = self.width as isize - 4;
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(far, 3);
        self.draw_finder_pattern_at(3, far);
    }
}

//------------------------------------------------------------------------------
// Timing and alignment patterns

impl Canvas {
    fn draw_timing_patterns(&mut self) {
        for i in 8..self.width - 8 {
            let color = Color::from(i % 2 == 0);
            self.put(i, 6, color);
            self.put(6, i, color);
        }
    }

    fn draw_alignment_pattern_at(&mut self, cx: usize, cy: usize) {
        for y in cy - 2..=cy + 2 {
            for x in cx - 2..=cx + 2 {
                let ring = x.abs_diff(cx).max(y.abs_diff(cy));
                self.put(x, y, Color::from(ring != 1));
            }
        }
    }

    fn draw_alignment_patterns(&mut self) {
        let positions = alignment_pattern_positions(self.version);
        let last = positions.len().saturating_sub(1);
        for (i, &cy) in positions.iter().enumerate() {
            for (j, &cx) in positions.iter().enumerate() {
                // These three would overlap a finder pattern.
                if (i, j) == (0, 0) || (i, j) == (0, last) || (i, j) == (last, 0) {
                    continue;
                }
                self.draw_alignment_pattern_at(cx as usize, cy as usize);
            }
        }
    }
}

//------------------------------------------------------------------------------
// Format and version information

impl Canvas {
    /// Writes both copies of the format information for `mask`, plus the dark
    /// module next to the bottom-left finder.
    pub fn draw_format_info(&mut self, mask: MaskPattern) {
        let bits = format_info_bits(self.ec_level, mask);
        let bit = |i: usize| Color::from((bits >> i) & 1 != 0);
        let w = self.width;

        // Around the top-left finder, skipping the timing row and column.
        for i in 0..6 {
            self.put(8, i, bit(i));
        }
        self.put(8, 7, bit(6));
        self.put(8, 8, bit(7));
        self.put(7, 8, bit(8));
        for i in 9..15 {
            self.put(14 - i, 8, bit(i));
        }

        // Split between the top-right and bottom-left finders.
        for i in 0..8 {
            self.put(w - 1 - i, 8, bit(i));
        }
        for i in 8..15 {
            self.put(8, w - 15 + i, bit(i));
        }

        self.put(8, w - 8, Color::Dark);
    }

    fn draw_version_info(&mut self) {
        if !self.version.has_version_info() {
            return;
        }
        let bits = version_info_bits(self.version);
        for i in 0..18 {
            let color = Color::from((bits >> i) & 1 != 0);
            let a = self.width - 11 + i % 3;
            let b = i / 3;
            self.put(a, b, color);
            self.put(b, a, color);
        }
    }
}

//------------------------------------------------------------------------------
// Data placement

impl Canvas {
    /// Column/row pairs of all unset modules in placement order: two-column
    /// strips from the right edge, alternating upward and downward, skipping
    /// the vertical timing column.
    fn placement_order(&self) -> Vec<(usize, usize)> {
        let w = self.width;
        let mut order = Vec::with_capacity(w * w);
        let mut right = w - 1;
        loop {
            let upward = (right + 1) & 2 == 0;
            for step in 0..w {
                let y = if upward { w - 1 - step } else { step };
                for x in [right, right - 1] {
                    if self.get(x, y) == Module::Unset {
                        order.push((x, y));
                    }
                }
            }
            if right < 3 {
                break;
            }
            right -= 2;
            if right == 6 {
                right = 5;
            }
        }
        order
    }

    /// Places the interleaved data codewords followed by the interleaved
    /// error correction codewords, most significant bit first. Modules left
    /// over become light remainder bits.
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::PlacementMismatch)` if the codewords do not
    /// exactly fill the symbol. That only happens when the tables and the
    /// traversal disagree.
    pub fn draw_data(&mut self, data: &[u8], ec: &[u8]) -> QrResult<()> {
        let expected = Capacity::lookup(self.version, self.ec_level).total_codewords * 8;
        let order = self.placement_order();
        let bits = data
            .iter()
            .chain(ec.iter())
            .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 != 0));

        let mut placed = 0;
        let mut slots = order.iter();
        for (dark, &(x, y)) in bits.zip(slots.by_ref()) {
            self.modules[y * self.width + x] = Module::Data(Color::from(dark));
            placed += 1;
        }
        let mut leftover = 0;
        for &(x, y) in slots {
            self.modules[y * self.width + x] = Module::Data(Color::Light);
            leftover += 1;
        }

        let supplied = (data.len() + ec.len()) * 8;
        if placed != expected || supplied != expected || leftover != remainder_bits(self.version) {
            error!(
                version = self.version.number(),
                placed,
                supplied,
                expected,
                leftover,
                "codeword placement does not match the symbol capacity"
            );
            return Err(QrError::PlacementMismatch {
                placed: supplied.max(placed),
                expected,
            });
        }
        Ok(())
    }
}

//------------------------------------------------------------------------------
// Masking

impl Canvas {
    /// Inverts every data module selected by `mask`. Function modules are left
    /// untouched. Applying the same mask twice restores the original.
    pub fn apply_mask(&mut self, mask: MaskPattern) {
        let w = self.width;
        for y in 0..w {
            for x in 0..w {
                let module = &mut self.modules[y * w + x];
                if let Module::Data(color) = *module {
                    if mask.applies(x, y) {
                        *module = Module::Data(!color);
                    }
                }
            }
        }
    }

    /// Tries all eight masks and keeps the one with the lowest penalty score.
    /// On a tie the lower mask index wins.
    pub fn apply_best_mask(&self) -> (Canvas, MaskPattern) {
        let masked = |mask: MaskPattern| {
            let mut candidate = self.clone();
            candidate.apply_mask(mask);
            candidate.draw_format_info(mask);
            let score = candidate.penalty_score();
            debug!(mask = mask.index(), score, "mask candidate");
            (candidate, mask, score)
        };

        let mut best = masked(MaskPattern(0));
        for mask in &MaskPattern::ALL[1..] {
            let candidate = masked(*mask);
            if candidate.2 < best.2 {
                best = candidate;
            }
        }
        (best.0, best.1)
    }
}

//------------------------------------------------------------------------------
// Penalty scores

impl Canvas {
    fn is_dark(&self, x: usize, y: usize) -> bool {
        self.get(x, y).color() == Color::Dark
    }

    /// Row `i` when `horizontal`, otherwise column `i`.
    fn line(&self, i: usize, horizontal: bool) -> Vec<bool> {
        (0..self.width)
            .map(|k| {
                if horizontal {
                    self.is_dark(k, i)
                } else {
                    self.is_dark(i, k)
                }
            })
            .collect()
    }

    /// N1: runs of five or more same-colored modules in a row or column.
    fn adjacent_penalty(line: &[bool]) -> u32 {
        let mut score = 0;
        let mut run = 0;
        let mut previous = None;
        for &dark in line {
            if previous == Some(dark) {
                run += 1;
            } else {
                run = 1;
                previous = Some(dark);
            }
            if run == 5 {
                score += PENALTY_N1;
            } else if run > 5 {
                score += 1;
            }
        }
        score
    }

    /// N3: 1:1:3:1:1 patterns preceded or followed by four light modules.
    fn finder_like_penalty(line: &[bool]) -> u32 {
        let count = line
            .windows(11)
            .filter(|window| FINDER_LIKE.iter().any(|p| p[..] == **window))
            .count();
        count as u32 * PENALTY_N3
    }

    /// N2: 2×2 blocks of one color.
    fn block_penalty(&self) -> u32 {
        let mut score = 0;
        for y in 0..self.width - 1 {
            for x in 0..self.width - 1 {
                let c = self.is_dark(x, y);
                if c == self.is_dark(x + 1, y)
                    && c == self.is_dark(x, y + 1)
                    && c == self.is_dark(x + 1, y + 1)
                {
                    score += PENALTY_N2;
                }
            }
        }
        score
    }

    /// N4: deviation of the dark ratio from 50%, in steps of 5%.
    fn balance_penalty(&self) -> u32 {
        let total = self.modules.len();
        let dark = self
            .modules
            .iter()
            .filter(|m| m.color() == Color::Dark)
            .count();
        let k = (dark * 20).abs_diff(total * 10) / total;
        k as u32 * PENALTY_N4
    }

    /// The total penalty score of the four ISO/IEC 18004 rules.
    pub fn penalty_score(&self) -> u32 {
        let mut score = self.block_penalty() + self.balance_penalty();
        for i in 0..self.width {
            for horizontal in [true, false] {
                let line = self.line(i, horizontal);
                score += Self::adjacent_penalty(&line) + Self::finder_like_penalty(&line);
            }
        }
        score
    }
}
