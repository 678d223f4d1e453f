use core::fmt::{self, Display, Formatter};
use core::ops::Not;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum QrError {
    /// The payload plus the mode and length header needs more data bits than
    /// the version / error correction level combination can hold.
    #[error("payload needs {needed} data bits but only {capacity} are available")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// The payload length cannot be written into the character count field of
    /// the chosen version.
    #[error("payload of {len} bytes does not fit a {bits}-bit character count")]
    PayloadTooLong { len: usize, bits: usize },

    /// The version, error correction level or mode is not usable.
    #[error("invalid parameters: {0}")]
    InvalidParameters(&'static str),

    /// The number of codeword bits placed into the matrix did not match the
    /// capacity tables. This is a defect in the encoder, not a bad input.
    #[error("placed {placed} codeword bits, expected {expected}")]
    PlacementMismatch { placed: usize, expected: usize },

    /// The assembled data codewords do not match the count the capacity
    /// tables give for the version. Also an encoder defect.
    #[error("assembled {actual} data codewords, expected {expected}")]
    CodewordCountMismatch { actual: usize, expected: usize },
}

/// `QrResult` is a convenient alias for a QR code generation result.
pub type QrResult<T> = Result<T, QrError>;

/// The color of a module.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    /// The module is light colored.
    Light,
    /// The module is dark colored.
    Dark,
}

impl Color {
    /// Selects a value according to color of the module. Equivalent to
    /// `if self != Color::Light { dark } else { light }`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use upiqr::types::Color;
    /// assert_eq!(Color::Light.select(1, 0), 0);
    /// assert_eq!(Color::Dark.select("black", "white"), "black");
    /// ```
    pub fn select<T>(self, dark: T, light: T) -> T {
        match self {
            Color::Light => light,
            Color::Dark => dark,
        }
    }
}

impl From<bool> for Color {
    fn from(dark: bool) -> Self {
        if dark {
            Color::Dark
        } else {
            Color::Light
        }
    }
}

impl Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EcLevel {
    /// Low error correction. Allows up to 7% of wrong blocks.
    #[default]
    L = 0,

    /// Medium error correction. Allows up to 15% of wrong blocks.
    M = 1,

    /// "Quartile" error correction. Allows up to 25% of wrong blocks.
    Q = 2,

    /// High error correction. Allows up to 30% of wrong blocks.
    H = 3,
}

impl EcLevel {
    pub const ALL: [EcLevel; 4] = [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H];

    /// The two bits written into the format information.
    pub fn format_bits(self) -> u16 {
        match self {
            EcLevel::L => 0b01,
            EcLevel::M => 0b00,
            EcLevel::Q => 0b11,
            EcLevel::H => 0b10,
        }
    }
}

impl Display for EcLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::L => write!(f, "L"),
            Self::M => write!(f, "M"),
            Self::Q => write!(f, "Q"),
            Self::H => write!(f, "H"),
        }
    }
}

impl FromStr for EcLevel {
    type Err = QrError;

    fn from_str(s: &str) -> QrResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(EcLevel::L),
            "m" | "medium" => Ok(EcLevel::M),
            "q" | "quartile" => Ok(EcLevel::Q),
            "h" | "high" => Ok(EcLevel::H),
            _ => Err(QrError::InvalidParameters(
                "error correction level must be one of L, M, Q, H",
            )),
        }
    }
}

/// A QR code version. Only holds values between 1 and 40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u8);

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    /// Validates a version number.
    ///
    ///     use upiqr::Version;
    ///
    ///     assert!(Version::new(3).is_ok());
    ///     assert!(Version::new(41).is_err());
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::InvalidParameters)` outside 1..=40.
    pub fn new(number: u8) -> QrResult<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&number) {
            Ok(Version(number))
        } else {
            Err(QrError::InvalidParameters("version must be between 1 and 40"))
        }
    }

    /// All 40 versions in ascending order.
    pub fn all() -> impl Iterator<Item = Version> {
        (Self::MIN.0..=Self::MAX.0).map(Version)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Get the number of "modules" on each size of the QR code, i.e. the width
    pub fn width(self) -> usize {
        self.0 as usize * 4 + 17
    }

    /// Versions 7 and above carry two copies of the 18-bit version block.
    pub fn has_version_info(self) -> bool {
        self.0 >= 7
    }

    /// Obtains an object from a hard-coded table.
    ///
    /// The table must be a 40×4 array. The outer array represents the content
    /// for each version, the inner array the content in each error correction
    /// level, in the order [L, M, Q, H].
    pub fn fetch<T: Copy>(self, ec_level: EcLevel, table: &[[T; 4]; 40]) -> T {
        table[(self.0 - 1) as usize][ec_level as usize]
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
}

impl Mode {
    /// The 4-bit mode indicator.
    pub fn indicator(self) -> u16 {
        match self {
            Mode::Numeric => 0b0001,
            Mode::Alphanumeric => 0b0010,
            Mode::Byte => 0b0100,
            Mode::Kanji => 0b1000,
        }
    }

    /// Computes the number of bits needed to encode the data length.
    ///
    ///     use upiqr::types::Mode;
    ///     use upiqr::Version;
    ///
    ///     assert_eq!(Mode::Byte.length_bits_count(Version::new(9).unwrap()), 8);
    ///     assert_eq!(Mode::Byte.length_bits_count(Version::new(10).unwrap()), 16);
    pub fn length_bits_count(self, version: Version) -> usize {
        match version.number() {
            1..=9 => match self {
                Mode::Numeric => 10,
                Mode::Alphanumeric => 9,
                Mode::Byte | Mode::Kanji => 8,
            },
            10..=26 => match self {
                Mode::Numeric => 12,
                Mode::Alphanumeric => 11,
                Mode::Byte => 16,
                Mode::Kanji => 10,
            },
            _ => match self {
                Mode::Numeric => 14,
                Mode::Alphanumeric => 13,
                Mode::Byte => 16,
                Mode::Kanji => 12,
            },
        }
    }

    /// Computes the number of bits needed to some data of a given raw length.
    ///
    ///     use upiqr::types::Mode;
    ///
    ///     assert_eq!(Mode::Numeric.data_bits_count(7), 24);
    ///
    /// Note that in Kanji mode, the `raw_data_len` is the number of Kanjis,
    /// i.e. half the total size of bytes.
    pub fn data_bits_count(self, raw_data_len: usize) -> usize {
        match self {
            Mode::Numeric => (raw_data_len * 10 + 2) / 3,
            Mode::Alphanumeric => (raw_data_len * 11 + 1) / 2,
            Mode::Byte => raw_data_len * 8,
            Mode::Kanji => raw_data_len * 13,
        }
    }
}
