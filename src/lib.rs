//! UPI payment QR codes
//!
//! This crate provides a byte-mode QR code encoder (versions 1 to 40, all
//! four error correction levels) together with the pieces of a small payment
//! QR app built on top of it: payload construction, display layout, a saved
//! entry store and a headless scene state machine.
//!
//! ```
//! use upiqr::{EcLevel, PaymentRequest, QrCode, Version};
//!
//! // Build the payment URI and encode it at a fixed version.
//! let request = PaymentRequest::new("alice@examplebank", Some("Alice Doe"));
//! let code = QrCode::for_payment(&request, Version::new(3).unwrap(), EcLevel::L).unwrap();
//!
//! assert_eq!(code.size(), 29);
//! let _top_left = code.is_dark(0, 0);
//! ```

pub mod app;
pub mod bits;
pub mod canvas;
pub mod capacity;
pub mod config;
pub mod ec;
pub mod payload;
pub mod raster;
pub mod render;
pub mod store;
pub mod types;

use tracing::debug;

pub use crate::canvas::MaskPattern;
pub use crate::capacity::Capacity;
pub use crate::payload::{PaymentRequest, PaymentUri, UpiId};
pub use crate::types::{Color, EcLevel, Mode, QrError, QrResult, Version};

/// An encoded QR code symbol: a square matrix of dark and light modules.
#[derive(Clone, Debug)]
pub struct QrCode {
    content: Vec<Color>,
    version: Version,
    ec_level: EcLevel,
    mask: MaskPattern,
    width: usize,
}

impl QrCode {
    /// Encodes `data` with an untyped version number and an explicit mode.
    ///
    ///     use upiqr::{EcLevel, Mode, QrCode};
    ///
    ///     let code = QrCode::encode(b"upi://pay?pa=a@b", 2, EcLevel::M, Mode::Byte).unwrap();
    ///     assert_eq!(code.size(), 25);
    ///
    ///     assert!(QrCode::encode(b"x", 41, EcLevel::M, Mode::Byte).is_err());
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::InvalidParameters)` when the version is outside
    /// 1..=40 or the mode is not BYTE, and otherwise the errors of
    /// [`QrCode::with_version`].
    pub fn encode<D: AsRef<[u8]>>(
        data: D,
        version: u8,
        ec_level: EcLevel,
        mode: Mode,
    ) -> QrResult<Self> {
        let version = Version::new(version)?;
        if mode != Mode::Byte {
            return Err(QrError::InvalidParameters("only BYTE mode can be encoded"));
        }
        Self::with_version(data, version, ec_level)
    }

    /// Constructs a new QR code for the given version and error correction
    /// level. The version is never upgraded automatically.
    ///
    ///     use upiqr::{QrCode, Version, EcLevel};
    ///
    ///     let version = Version::new(5).unwrap();
    ///     let code = QrCode::with_version(b"Some data", version, EcLevel::M).unwrap();
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::PayloadTooLong)` if the length does not fit the
    /// character count field, or `Err(QrError::CapacityExceeded)` when the
    /// data is too long for this version and error correction level.
    pub fn with_version<D: AsRef<[u8]>>(
        data: D,
        version: Version,
        ec_level: EcLevel,
    ) -> QrResult<Self> {
        let mut bits = bits::Bits::new(version, ec_level);
        bits.push_byte_data(data.as_ref())?;
        Self::with_bits(bits)
    }

    /// Encodes the `upi://pay` URI of a payment request.
    ///
    /// # Errors
    ///
    /// See [`QrCode::with_version`].
    pub fn for_payment(
        request: &PaymentRequest,
        version: Version,
        ec_level: EcLevel,
    ) -> QrResult<Self> {
        Self::with_version(request.to_uri().to_string(), version, ec_level)
    }

    /// Constructs a new QR code with encoded bits. The terminator and pad
    /// codewords are appended here.
    ///
    /// # Errors
    ///
    /// Returns error if the bits are too long or if codeword placement fails.
    pub fn with_bits(mut bits: bits::Bits) -> QrResult<Self> {
        bits.push_terminator()?;
        let capacity = *bits.capacity();
        let version = capacity.version();
        let ec_level = bits.ec_level();
        let data = bits.into_bytes();
        let (encoded_data, ec_data) = ec::construct_codewords(&data, &capacity)?;

        let mut canvas = canvas::Canvas::new(version, ec_level);
        canvas.draw_all_functional_patterns();
        canvas.draw_data(&encoded_data, &ec_data)?;
        let (canvas, mask) = canvas.apply_best_mask();
        debug!(
            version = version.number(),
            ec_level = %ec_level,
            mask = mask.index(),
            "encoded QR code"
        );
        Ok(Self {
            content: canvas.into_colors(),
            version,
            ec_level,
            mask,
            width: version.width(),
        })
    }

    /// Number of modules per side, without the quiet zone.
    pub fn size(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark.
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is not below [`QrCode::size`].
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        assert!(
            x < self.width && y < self.width,
            "module ({x}, {y}) outside a {0}x{0} symbol",
            self.width
        );
        self.content[y * self.width + x] == Color::Dark
    }

    /// Gets the version of this QR code.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Gets the error correction level of this QR code.
    pub fn error_correction_level(&self) -> EcLevel {
        self.ec_level
    }

    /// The mask pattern chosen during encoding.
    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    pub fn dark_module_count(&self) -> usize {
        self.content.iter().filter(|&&c| c == Color::Dark).count()
    }

    /// Converts the QR code to a vector of colors, row-major.
    pub fn to_colors(&self) -> Vec<Color> {
        self.content.clone()
    }

    /// Converts the QR code to a vector of colors, row-major.
    pub fn into_colors(self) -> Vec<Color> {
        self.content
    }

    /// Converts the QR code into a human-readable string.
    pub fn to_str(&self, dark: char, light: char) -> String {
        let mut s = String::with_capacity((self.width + 1) * self.width);
        for row in self.content.chunks(self.width) {
            for &color in row {
                s.push(color.select(dark, light));
            }
            s.push('\n');
        }
        s
    }
}
