//! Decodes generated symbols with an independent reader.

use image::{GrayImage, Luma};
use upiqr::raster::{rasterize, Layout, PixelSink};
use upiqr::{Capacity, EcLevel, PaymentRequest, QrCode, Version};

const SCALE: usize = 8;
const QUIET_ZONE: usize = 4;

struct Gray(GrayImage);

impl PixelSink for Gray {
    fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize) {
        for py in y..y + height {
            for px in x..x + width {
                self.0.put_pixel(px as u32, py as u32, Luma([0]));
            }
        }
    }
}

fn to_image(code: &QrCode) -> GrayImage {
    let side = (code.size() + 2 * QUIET_ZONE) * SCALE;
    let mut img = Gray(GrayImage::from_pixel(side as u32, side as u32, Luma([255])));
    let layout = Layout {
        module_size: SCALE,
        origin_x: QUIET_ZONE * SCALE,
        origin_y: QUIET_ZONE * SCALE,
        symbol_width: code.size(),
    };
    rasterize(code, &layout, &mut img);
    img.0
}

fn decode(code: &QrCode) -> (usize, u16, String) {
    let mut prepared = rqrr::PreparedImage::prepare(to_image(code));
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one symbol");
    let (meta, content) = grids[0].decode().expect("symbol should decode");
    (meta.version.0, meta.ecc_level, content)
}

fn assert_roundtrip(payload: &str, version: u8, ec_level: EcLevel) {
    let code = QrCode::with_version(payload, Version::new(version).unwrap(), ec_level).unwrap();
    let (decoded_version, ecc, content) = decode(&code);
    assert_eq!(content, payload);
    assert_eq!(decoded_version, version as usize);
    assert_eq!(ecc, ec_level.format_bits());
}

#[test]
fn payment_uri_version_3_low() {
    let request = PaymentRequest::new("alice@examplebank", Some("Alice Doe"));
    let code = QrCode::for_payment(&request, Version::new(3).unwrap(), EcLevel::L).unwrap();
    let (version, ecc, content) = decode(&code);
    assert_eq!(content, "upi://pay?pa=alice@examplebank&pn=Alice%20Doe&cu=INR");
    assert_eq!(version, 3);
    assert_eq!(ecc, EcLevel::L.format_bits());
}

#[test]
fn every_error_correction_level() {
    for ec_level in EcLevel::ALL {
        assert_roundtrip("upi://pay?pa=bob@ybl&pn=Bob&cu=INR", 4, ec_level);
    }
}

#[test]
fn version_info_symbols() {
    let payload = "upi://pay?pa=carol@paytm&pn=Carol%20Example&cu=INR";
    assert_roundtrip(payload, 7, EcLevel::M);
    assert_roundtrip(payload, 10, EcLevel::Q);
}

#[test]
fn multi_block_with_long_payload() {
    let payload: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    assert_roundtrip(&payload, 15, EcLevel::L);
}

#[test]
fn many_alignment_patterns_at_capacity() {
    // 25 has a 5x5 alignment grid, 40 a 7x7 one.
    for (version, ec_level) in [(25, EcLevel::H), (40, EcLevel::L)] {
        let len = Capacity::lookup(Version::new(version).unwrap(), ec_level).max_byte_payload();
        let payload: String = (0..len).map(|i| char::from(b'A' + (i % 26) as u8)).collect();
        assert_roundtrip(&payload, version, ec_level);
    }
}
