//! The `bits` module assembles the data codeword stream of a QR code.
use core::cmp::min;

use crate::capacity::Capacity;
use crate::types::{EcLevel, Mode, QrError, QrResult, Version};

/// Pad codewords appended after the terminator, alternating.
const PADDING_BYTES: [u8; 2] = [0b1110_1100, 0b0001_0001];

/// The `Bits` structure stores the encoded data for a QR code.
pub struct Bits {
    data: Vec<u8>,
    bit_offset: usize,
    capacity: Capacity,
}

impl Bits {
    /// Constructs a new, empty bits structure sized for the given version and
    /// error correction level.
    pub fn new(version: Version, ec_level: EcLevel) -> Self {
        let capacity = Capacity::lookup(version, ec_level);
        Self {
            data: Vec::with_capacity(capacity.data_codewords),
            bit_offset: 0,
            capacity,
        }
    }

    /// Pushes an N-bit big-endian integer to the end of the bits.
    ///
    /// Note: It is up to the developer to ensure that `number` really only is
    /// `n` bit in size. Otherwise the excess bits may stomp on the existing
    /// ones.
    fn push_number(&mut self, n: usize, number: u16) {
        debug_assert!(
            n == 16 || n < 16 && number < (1 << n),
            "{} is too big as a {}-bit number",
            number,
            n
        );

        let b = self.bit_offset + n;
        let last_index = self.data.len().wrapping_sub(1);
        match (self.bit_offset, b) {
            (0, 0..=8) => {
                self.data.push((number << (8 - b)) as u8);
            }
            (0, _) => {
                self.data.push((number >> (b - 8)) as u8);
                self.data.push((number << (16 - b)) as u8);
            }
            (_, 0..=8) => {
                self.data[last_index] |= (number << (8 - b)) as u8;
            }
            (_, 9..=16) => {
                self.data[last_index] |= (number >> (b - 8)) as u8;
                self.data.push((number << (16 - b)) as u8);
            }
            _ => {
                self.data[last_index] |= (number >> (b - 8)) as u8;
                self.data.push((number >> (b - 16)) as u8);
                self.data.push((number << (24 - b)) as u8);
            }
        }
        self.bit_offset = b & 7;
    }

    /// Convert the bits into a bytes vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Total number of bits currently pushed.
    pub fn len(&self) -> usize {
        if self.bit_offset == 0 {
            self.data.len() * 8
        } else {
            (self.data.len() - 1) * 8 + self.bit_offset
        }
    }

    /// Whether there are any bits pushed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The maximum number of bits allowed by the QR code version and error
    /// correction level.
    pub fn max_len(&self) -> usize {
        self.capacity.data_bits()
    }

    /// Version of the QR code.
    pub fn version(&self) -> Version {
        self.capacity.version()
    }

    /// Error correction level the capacity was looked up for.
    pub fn ec_level(&self) -> EcLevel {
        self.capacity.ec_level()
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    /// Encodes 8-bit byte data as a single BYTE mode segment: the mode
    /// indicator, the character count and the bytes, most significant bit
    /// first.
    ///
    /// Nothing is pushed when this fails.
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::PayloadTooLong)` if the length does not fit the
    /// character count field of this version.
    ///
    /// Returns `Err(QrError::CapacityExceeded)` if the segment does not fit
    /// the remaining data capacity.
    pub fn push_byte_data(&mut self, data: &[u8]) -> QrResult<()> {
        let length_bits = Mode::Byte.length_bits_count(self.version());
        if data.len() >= 1 << length_bits {
            return Err(QrError::PayloadTooLong {
                len: data.len(),
                bits: length_bits,
            });
        }
        let needed = self.len() + 4 + length_bits + Mode::Byte.data_bits_count(data.len());
        self.capacity.ensure_fits(needed)?;

        self.push_number(4, Mode::Byte.indicator());
        self.push_number(length_bits, data.len() as u16);
        for b in data {
            self.push_number(8, u16::from(*b));
        }
        Ok(())
    }

    /// Pushes the terminator, pads to a byte boundary and fills the remaining
    /// data codewords with the alternating pad bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::CapacityExceeded)` if more bits were pushed than
    /// the data capacity.
    pub fn push_terminator(&mut self) -> QrResult<()> {
        let data_length = self.max_len();
        self.capacity.ensure_fits(self.len())?;

        let terminator_size = min(4, data_length - self.len());
        if terminator_size > 0 {
            self.push_number(terminator_size, 0);
        }

        // Remaining bits of a partial byte are already zero.
        self.bit_offset = 0;
        let padding_bytes_count = self.capacity.data_codewords.saturating_sub(self.data.len());
        self.data
            .extend(PADDING_BYTES.iter().copied().cycle().take(padding_bytes_count));

        debug_assert_eq!(self.data.len(), self.capacity.data_codewords);
        Ok(())
    }
}

/// Builds the complete data codeword sequence of a BYTE mode payload.
///
///     use upiqr::bits::encode_bytes;
///     use upiqr::{EcLevel, Version};
///
///     let bits = encode_bytes(b"upi", Version::new(1).unwrap(), EcLevel::L).unwrap();
///     assert_eq!(bits.into_bytes().len(), 19);
///
/// # Errors
///
/// See [`Bits::push_byte_data`].
pub fn encode_bytes(data: &[u8], version: Version, ec_level: EcLevel) -> QrResult<Bits> {
    let mut bits = Bits::new(version, ec_level);
    bits.push_byte_data(data)?;
    bits.push_terminator()?;
    Ok(bits)
}
