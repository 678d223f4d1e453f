use upiqr::canvas::{Canvas, MaskPattern, Module};
use upiqr::{Capacity, Color, EcLevel, Mode, QrCode, QrError, Version};

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

#[test]
fn fills_every_capacity_and_rejects_one_more() {
    for version in Version::all() {
        for ec_level in EcLevel::ALL {
            let max = Capacity::lookup(version, ec_level).max_byte_payload();
            let code = QrCode::with_version(payload(max), version, ec_level)
                .unwrap_or_else(|e| panic!("{version}-{ec_level}: {e}"));
            assert_eq!(code.size(), 4 * version.number() as usize + 17);

            let err = QrCode::with_version(payload(max + 1), version, ec_level).unwrap_err();
            assert!(
                matches!(err, QrError::CapacityExceeded { .. }),
                "{version}-{ec_level}: {err:?}"
            );
        }
    }
}

#[test]
fn version_1_high_boundary() {
    let v1 = Version::new(1).unwrap();
    assert!(QrCode::with_version(b"1234567", v1, EcLevel::H).is_ok());
    assert_eq!(
        QrCode::with_version(b"12345678", v1, EcLevel::H).map(|c| c.size()),
        Err(QrError::CapacityExceeded {
            needed: 76,
            capacity: 72,
        })
    );
}

#[test]
fn deterministic() {
    let data = b"upi://pay?pa=alice@examplebank&pn=Alice%20Doe&cu=INR";
    for version in [3, 8, 22] {
        let a = QrCode::encode(data, version, EcLevel::L, Mode::Byte).unwrap();
        let b = QrCode::encode(data, version, EcLevel::L, Mode::Byte).unwrap();
        assert_eq!(a.mask(), b.mask());
        assert_eq!(a.into_colors(), b.into_colors());
    }
}

#[test]
fn version_information_from_version_7() {
    let v6 = QrCode::with_version("v6", Version::new(6).unwrap(), EcLevel::L).unwrap();
    let v7 = QrCode::with_version("v7", Version::new(7).unwrap(), EcLevel::L).unwrap();

    // Without version blocks the area above the bottom-left finder is data.
    let mut canvas = Canvas::new(Version::new(6).unwrap(), EcLevel::L);
    canvas.draw_all_functional_patterns();
    assert_eq!(canvas.get(0, v6.size() - 11), Module::Unset);

    // 0x07c94 read in placement order: bits 0..18 fill a 3x6 block.
    let bits = 0x07c94u32;
    let w = v7.size();
    for i in 0..18 {
        let dark = (bits >> i) & 1 != 0;
        assert_eq!(v7.is_dark(w - 11 + i % 3, i / 3), dark, "bit {i}");
        assert_eq!(v7.is_dark(i / 3, w - 11 + i % 3), dark, "bit {i}");
    }
}

#[test]
fn function_patterns_survive_masking() {
    for version in [1, 2, 7, 14, 40] {
        let code = QrCode::encode(b"upi", version, EcLevel::M, Mode::Byte).unwrap();
        let w = code.size();
        // Finder centers, separators, timing and the dark module.
        for (x, y) in [(3, 3), (w - 4, 3), (3, w - 4), (8, w - 8)] {
            assert!(code.is_dark(x, y), "v{version} ({x}, {y})");
        }
        for (x, y) in [(7, 7), (w - 8, 7), (7, w - 8), (7, 0), (0, 7)] {
            assert!(!code.is_dark(x, y), "v{version} ({x}, {y})");
        }
        for i in 8..w - 8 {
            assert_eq!(code.is_dark(i, 6), i % 2 == 0);
            assert_eq!(code.is_dark(6, i), i % 2 == 0);
        }
    }
}

#[test]
fn chosen_mask_is_lowest_penalty() {
    let version = Version::new(5).unwrap();
    let code = QrCode::with_version("upi://pay?pa=dan@ybl", version, EcLevel::H).unwrap();

    // Rebuild the unmasked canvas the encoder started from.
    let bits = upiqr::bits::encode_bytes(b"upi://pay?pa=dan@ybl", version, EcLevel::H).unwrap();
    let capacity = *bits.capacity();
    let (data, ec) = upiqr::ec::construct_codewords(&bits.into_bytes(), &capacity).unwrap();
    let mut canvas = Canvas::new(version, EcLevel::H);
    canvas.draw_all_functional_patterns();
    canvas.draw_data(&data, &ec).unwrap();

    let scores: Vec<u32> = MaskPattern::ALL
        .iter()
        .map(|&mask| {
            let mut c = canvas.clone();
            c.apply_mask(mask);
            c.draw_format_info(mask);
            c.penalty_score()
        })
        .collect();
    let best = *scores.iter().min().unwrap();
    let first_best = scores.iter().position(|&s| s == best).unwrap();
    assert_eq!(code.mask().index() as usize, first_best);

    let (chosen, _) = canvas.apply_best_mask();
    let colors: Vec<Color> = chosen.into_colors();
    assert_eq!(colors, code.to_colors());
}

#[test]
fn non_byte_modes_are_rejected() {
    for mode in [Mode::Numeric, Mode::Alphanumeric, Mode::Kanji] {
        assert!(matches!(
            QrCode::encode(b"123", 1, EcLevel::L, mode),
            Err(QrError::InvalidParameters(_))
        ));
    }
}
