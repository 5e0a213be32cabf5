//! Property-based tests for the FITS reader and the display pipeline.
//!
//! The parsers must never panic on arbitrary input; cut levels and
//! coordinate transforms must stay well ordered for any finite image.

use gview::fits::{Card, Header, HeaderValue, encode_fits, parse_fits};
use gview::model::Grid;
use gview::{AstroImage, AutoCutMethod, Viewer};
use proptest::prelude::*;
use std::sync::Arc;

fn finite_pixels() -> impl Strategy<Value = (usize, usize, Vec<f64>)> {
    (1usize..24, 1usize..24).prop_flat_map(|(w, h)| {
        prop::collection::vec(-1.0e6f64..1.0e6, w * h).prop_map(move |data| (w, h, data))
    })
}

proptest! {
    // Parser tests only assert no-panic; random input is almost always Err.
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn card_parse_doesnt_panic(s in "\\PC{0,120}") {
        let _ = Card::parse(&s);
    }

    #[test]
    fn value_card_doesnt_panic(
        key in "[A-Z][A-Z0-9_-]{0,7}",
        value in "\\PC{0,70}",
    ) {
        let _ = Card::parse(&format!("{key:<8}= {value}"));
    }

    #[test]
    fn parse_fits_doesnt_panic(bytes in prop::collection::vec(any::<u8>(), 0..6000)) {
        let _ = parse_fits(&bytes);
    }

    #[test]
    fn truncated_header_doesnt_panic(
        naxis1 in 0i64..5000,
        naxis2 in 0i64..5000,
        bitpix in prop::sample::select(vec![8i64, 16, 32, 64, -32, -64, 7]),
        tail in prop::collection::vec(any::<u8>(), 0..3000),
    ) {
        let mut text = String::new();
        for card in [
            format!("{:<8}= {:>20}", "SIMPLE", "T"),
            format!("{:<8}= {bitpix:>20}", "BITPIX"),
            format!("{:<8}= {:>20}", "NAXIS", 2),
            format!("{:<8}= {naxis1:>20}", "NAXIS1"),
            format!("{:<8}= {naxis2:>20}", "NAXIS2"),
            "END".to_string(),
        ] {
            text.push_str(&format!("{card:<80}"));
        }
        let mut bytes = text.into_bytes();
        bytes.resize(2880, b' ');
        bytes.extend(tail);
        let _ = parse_fits(&bytes);
    }

    #[test]
    fn integer_card_keeps_value(key in "[A-Z]{1,8}", v in any::<i32>()) {
        prop_assume!(!matches!(key.as_str(), "COMMENT" | "HISTORY" | "END"));
        let card = Card::new(key.clone(), HeaderValue::Int(i64::from(v)), None);
        let parsed = Card::parse(&card.to_card_string()).unwrap();
        prop_assert_eq!(parsed.keyword, key);
        prop_assert_eq!(parsed.value.and_then(|v| v.as_i64()), Some(i64::from(v)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn cut_levels_are_ordered((w, h, data) in finite_pixels()) {
        let grid = Grid::new(w, h, data).unwrap();
        for method in [
            AutoCutMethod::ZScale,
            AutoCutMethod::MinMax,
            AutoCutMethod::Histogram,
            AutoCutMethod::Median,
        ] {
            let (lo, hi) = method.calc_cut_levels(&grid);
            prop_assert!(lo <= hi, "{}: {} > {}", method.as_str(), lo, hi);
        }
    }

    #[test]
    fn encoded_image_reads_back((w, h, data) in finite_pixels()) {
        let bytes = encode_fits(&Header::new(), w, h, &data);
        let hdu = parse_fits(&bytes).unwrap();
        prop_assert_eq!((hdu.width, hdu.height), (w, h));
        for (read, written) in hdu.data.iter().zip(&data) {
            // Pixels are stored as 32-bit floats.
            prop_assert!((read - written).abs() <= written.abs() * 1e-6 + 1e-6);
        }
    }

    #[test]
    fn screen_transform_inverts(
        level in -3i32..4,
        x in 0.0f64..63.0,
        y in 0.0f64..63.0,
    ) {
        let image = Arc::new(AstroImage::new(Grid::from_fn(64, 64, |x, y| (x + y) as f64), Header::new()));
        let mut viewer = Viewer::new("prop", 80, 60);
        viewer.set_image(image);
        viewer.zoom_to(level);
        let (sx, sy) = viewer.data_to_screen(x, y, 80, 60);
        let (dx, dy) = viewer.screen_to_data(sx, sy, 80, 60);
        prop_assert!((dx - x).abs() < 1e-6 && (dy - y).abs() < 1e-6);
    }
}
