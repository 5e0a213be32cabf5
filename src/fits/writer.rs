//! FITS image encoding (the `wf` command).

use super::header::{Card, Header, HeaderValue};
use super::padded_len;
use crate::error::{GviewError, Result};
use std::path::Path;

/// Keywords regenerated by the writer rather than copied from the source header.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "SIMPLE", "XTENSION", "BITPIX", "NAXIS", "EXTEND", "PCOUNT", "GCOUNT", "BSCALE", "BZERO",
    "BLANK", "CHECKSUM", "DATASUM", "END",
];

fn is_structural(keyword: &str) -> bool {
    STRUCTURAL_KEYWORDS.contains(&keyword)
        || keyword
            .strip_prefix("NAXIS")
            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
}

/// Encode a 2-D image as a single-HDU FITS file with BITPIX = -32.
#[must_use]
pub fn encode_fits(header: &Header, width: usize, height: usize, data: &[f64]) -> Vec<u8> {
    let mut cards = vec![
        Card::new("SIMPLE", HeaderValue::Logical(true), Some("conforms to FITS standard")),
        Card::new("BITPIX", HeaderValue::Int(-32), Some("array data type")),
        Card::new("NAXIS", HeaderValue::Int(2), Some("number of array dimensions")),
        Card::new("NAXIS1", HeaderValue::Int(width as i64), None),
        Card::new("NAXIS2", HeaderValue::Int(height as i64), None),
    ];
    cards.extend(
        header
            .cards()
            .filter(|c| !is_structural(&c.keyword))
            .cloned(),
    );

    let mut out = Vec::with_capacity(padded_len((cards.len() + 1) * 80) + padded_len(data.len() * 4));
    for card in &cards {
        out.extend_from_slice(card.to_card_string().as_bytes());
    }
    out.extend_from_slice(format!("{:<80}", "END").as_bytes());
    out.resize(padded_len(out.len()), b' ');

    let data_start = out.len();
    for &v in data.iter().take(width * height) {
        out.extend_from_slice(&(v as f32).to_be_bytes());
    }
    out.resize(data_start + padded_len(out.len() - data_start), 0);
    out
}

/// Write a 2-D image to `path`.
pub fn write_fits(path: &Path, header: &Header, width: usize, height: usize, data: &[f64]) -> Result<()> {
    let bytes = encode_fits(header, width, height, data);
    std::fs::write(path, bytes).map_err(|e| GviewError::io(path, e))?;
    tracing::info!("Wrote {}x{} image to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::{BLOCK_LEN, parse_fits};

    #[test]
    fn test_structural_keywords_are_replaced() {
        let mut header = Header::new();
        header.set("BITPIX", HeaderValue::Int(16), None);
        header.set("NAXIS3", HeaderValue::Int(4), None);
        header.set("BZERO", HeaderValue::Float(32768.0), None);
        header.set("OBJECT", HeaderValue::Str("M51".into()), None);
        header.push(Card::commentary("HISTORY", "flat fielded"));

        let bytes = encode_fits(&header, 2, 1, &[1.0, f64::NAN]);
        assert_eq!(bytes.len() % BLOCK_LEN, 0);

        let hdu = parse_fits(&bytes).unwrap();
        assert_eq!(hdu.header.get_i64("BITPIX"), Some(-32));
        assert!(!hdu.header.contains("NAXIS3"));
        assert!(!hdu.header.contains("BZERO"));
        assert_eq!(hdu.header.get_str("OBJECT"), Some("M51"));
        assert!(hdu.header.cards().any(|c| c.display_value() == "flat fielded"));
        assert_eq!(hdu.data[0], 1.0);
        assert!(hdu.data[1].is_nan());
    }

    #[test]
    fn test_write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fits");
        write_fits(&path, &Header::new(), 1, 1, &[42.0]).unwrap();
        let hdu = crate::fits::read_fits(&path).unwrap();
        assert_eq!(hdu.data, vec![42.0]);
    }
}
