//! FITS image decoding.

use super::header::{CARD_LEN, Card, Header, HeaderValue};
use super::{BLOCK_LEN, padded_len};
use crate::error::{ErrorContext, FitsErrorKind, GviewError, Result};
use std::path::Path;

/// The first HDU carrying a 2-D image, decoded to physical values.
#[derive(Debug, Clone)]
pub struct ImageHdu {
    pub header: Header,
    pub width: usize,
    pub height: usize,
    /// Row-major pixels, row 0 is FITS row 1.
    pub data: Vec<f64>,
}

/// Read the first image HDU of a FITS file.
pub fn read_fits(path: &Path) -> Result<ImageHdu> {
    let bytes = std::fs::read(path).map_err(|e| GviewError::io(path, e))?;
    parse_fits(&bytes).with_context(|| format!("reading {}", path.display()))
}

/// Decode the first image HDU from an in-memory FITS file.
///
/// The primary HDU is used when it has at least two axes; otherwise the
/// first `XTENSION = 'IMAGE'` extension is.
pub fn parse_fits(bytes: &[u8]) -> Result<ImageHdu> {
    let mut offset = 0;
    let mut primary = true;

    while offset < bytes.len() {
        let (header, header_len) = parse_header(&bytes[offset..])?;

        if primary && header.get("SIMPLE").and_then(HeaderValue::as_bool) != Some(true) {
            return Err(GviewError::fits("parsing primary HDU", FitsErrorKind::NotFits));
        }

        let bitpix = header.require_i64("BITPIX")?;
        let naxis = header.require_i64("NAXIS")?;
        let axes = (1..=naxis)
            .map(|i| header.require_i64(&format!("NAXIS{i}")))
            .collect::<Result<Vec<_>>>()?;
        let pcount = header.get_i64("PCOUNT").unwrap_or(0);
        let gcount = header.get_i64("GCOUNT").unwrap_or(1);

        let bytes_per_pixel = bytes_per_pixel(bitpix)?;
        let data_len = data_len(bytes_per_pixel, &axes, pcount, gcount)?;
        let data_start = offset + header_len;
        let available = bytes.len().saturating_sub(data_start);

        let is_image = primary
            || header
                .get_str("XTENSION")
                .is_some_and(|x| x.trim().eq_ignore_ascii_case("IMAGE"));

        if is_image && naxis >= 2 && axes[0] > 0 && axes[1] > 0 {
            let width = axes[0] as usize;
            let height = axes[1] as usize;
            let plane_len = width
                .checked_mul(height)
                .and_then(|n| n.checked_mul(bytes_per_pixel))
                .ok_or_else(|| bad_axes(&axes))?;
            if available < plane_len {
                return Err(GviewError::fits(
                    "reading image data",
                    FitsErrorKind::Truncated {
                        expected: plane_len,
                        found: available,
                    },
                ));
            }
            if naxis > 2 {
                tracing::debug!("NAXIS={naxis}, using the first image plane");
            }
            let raw = &bytes[data_start..data_start + plane_len];
            let data = decode_pixels(raw, bitpix, &header);
            return Ok(ImageHdu {
                header,
                width,
                height,
                data,
            });
        }

        if data_len > available {
            return Err(GviewError::fits(
                "skipping HDU data",
                FitsErrorKind::Truncated {
                    expected: data_len,
                    found: available,
                },
            ));
        }
        primary = false;
        offset = data_start + padded_len(data_len);
    }

    Err(GviewError::fits("searching HDUs", FitsErrorKind::NoImage))
}

/// Parse header cards up to END, returning the header and its padded length.
pub fn parse_header(bytes: &[u8]) -> Result<(Header, usize)> {
    let mut header = Header::new();

    for (i, raw) in bytes.chunks(CARD_LEN).enumerate() {
        if raw.len() < CARD_LEN {
            break;
        }
        let text = String::from_utf8_lossy(raw).into_owned();
        if text.starts_with("END") && text[3..].trim().is_empty() {
            return Ok((header, padded_len((i + 1) * CARD_LEN)));
        }
        match Card::parse(&text) {
            Ok(card) => header.push(card),
            Err(e) => {
                tracing::warn!("Keeping malformed card as text: {e}");
                let keyword = text.chars().take(8).collect::<String>();
                header.push(Card::commentary(
                    keyword.trim_end(),
                    text.chars().skip(10).collect::<String>().trim_end(),
                ));
            }
        }
    }

    Err(GviewError::fits("parsing header", FitsErrorKind::MissingEnd))
}

fn bad_axes(axes: &[i64]) -> GviewError {
    GviewError::fits("sizing HDU data", FitsErrorKind::BadAxes(axes.to_vec()))
}

/// `|BITPIX|/8 * GCOUNT * (PCOUNT + NAXIS1 * ... * NAXISn)` in bytes.
fn data_len(bytes_per_pixel: usize, axes: &[i64], pcount: i64, gcount: i64) -> Result<usize> {
    let npix = if axes.is_empty() {
        Some(0)
    } else {
        axes.iter().try_fold(1usize, |acc, &n| {
            usize::try_from(n).ok().and_then(|n| acc.checked_mul(n))
        })
    };
    let pcount = usize::try_from(pcount).ok();
    let gcount = usize::try_from(gcount).ok();
    npix.zip(pcount)
        .and_then(|(npix, pcount)| npix.checked_add(pcount))
        .zip(gcount)
        .and_then(|(n, gcount)| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(bytes_per_pixel))
        .filter(|n| n.checked_add(super::BLOCK_LEN).is_some())
        .ok_or_else(|| bad_axes(axes))
}

fn bytes_per_pixel(bitpix: i64) -> Result<usize> {
    match bitpix {
        8 => Ok(1),
        16 => Ok(2),
        32 | -32 => Ok(4),
        64 | -64 => Ok(8),
        other => Err(GviewError::fits(
            "reading image data",
            FitsErrorKind::UnsupportedBitpix(other),
        )),
    }
}

/// Convert big-endian raw pixels to physical values (BSCALE/BZERO applied,
/// integer BLANK values become NaN).
fn decode_pixels(raw: &[u8], bitpix: i64, header: &Header) -> Vec<f64> {
    let scale = header.get_f64("BSCALE").unwrap_or(1.0);
    let zero = header.get_f64("BZERO").unwrap_or(0.0);
    let blank = header.get_i64("BLANK");

    let physical = |v: i64| -> f64 {
        if blank == Some(v) {
            f64::NAN
        } else {
            (v as f64).mul_add(scale, zero)
        }
    };

    match bitpix {
        8 => raw.iter().map(|&b| physical(i64::from(b))).collect(),
        16 => raw
            .chunks_exact(2)
            .map(|c| physical(i64::from(i16::from_be_bytes([c[0], c[1]]))))
            .collect(),
        32 => raw
            .chunks_exact(4)
            .map(|c| physical(i64::from(i32::from_be_bytes([c[0], c[1], c[2], c[3]]))))
            .collect(),
        64 => raw
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                physical(i64::from_be_bytes(b))
            })
            .collect(),
        -32 => raw
            .chunks_exact(4)
            .map(|c| f64::from(f32::from_be_bytes([c[0], c[1], c[2], c[3]])).mul_add(scale, zero))
            .collect(),
        _ => raw
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                f64::from_be_bytes(b).mul_add(scale, zero)
            })
            .collect(),
    }
}

/// Check whether a byte slice starts like a FITS file.
#[must_use]
pub fn looks_like_fits(bytes: &[u8]) -> bool {
    bytes.len() >= BLOCK_LEN && bytes.starts_with(b"SIMPLE  =")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(cards: &[String]) -> Vec<u8> {
        let mut out = Vec::new();
        for c in cards {
            out.extend_from_slice(format!("{c:<80}").as_bytes());
        }
        out.extend_from_slice(format!("{:<80}", "END").as_bytes());
        out.resize(padded_len(out.len()), b' ');
        out
    }

    fn cards(extra: &[&str]) -> Vec<String> {
        extra.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_int16_with_scaling_and_blank() {
        let mut bytes = block(&cards(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                    2",
            "NAXIS2  =                    2",
            "BSCALE  =                  2.0",
            "BZERO   =                 10.0",
            "BLANK   =                   -1",
        ]));
        let mut data = Vec::new();
        for v in [1i16, 2, -1, 4] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        data.resize(BLOCK_LEN, 0);
        bytes.extend(data);

        let hdu = parse_fits(&bytes).unwrap();
        assert_eq!((hdu.width, hdu.height), (2, 2));
        assert_eq!(hdu.data[0], 12.0);
        assert_eq!(hdu.data[1], 14.0);
        assert!(hdu.data[2].is_nan());
        assert_eq!(hdu.data[3], 18.0);
    }

    #[test]
    fn test_image_extension_used_when_primary_empty() {
        let mut bytes = block(&cards(&[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
            "EXTEND  =                    T",
        ]));
        bytes.extend(block(&cards(&[
            "XTENSION= 'IMAGE   '",
            "BITPIX  =                  -32",
            "NAXIS   =                    2",
            "NAXIS1  =                    3",
            "NAXIS2  =                    1",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "OBJECT  = 'ext'",
        ])));
        let mut data = Vec::new();
        for v in [1.5f32, -2.0, 3.25] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        data.resize(BLOCK_LEN, 0);
        bytes.extend(data);

        let hdu = parse_fits(&bytes).unwrap();
        assert_eq!(hdu.data, vec![1.5, -2.0, 3.25]);
        assert_eq!(hdu.header.get("OBJECT"), Some(&HeaderValue::Str("ext".into())));
    }

    #[test]
    fn test_truncated_data_is_error() {
        let bytes = block(&cards(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   32",
            "NAXIS   =                    2",
            "NAXIS1  =                   10",
            "NAXIS2  =                   10",
        ]));
        let err = parse_fits(&bytes).unwrap_err();
        assert!(matches!(
            err,
            GviewError::Fits {
                source: FitsErrorKind::Truncated { expected: 400, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_huge_axes_are_rejected() {
        let bytes = block(&cards(&[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =           4294967296",
            "NAXIS2  =           4294967296",
        ]));
        let err = parse_fits(&bytes).unwrap_err();
        assert!(matches!(
            err,
            GviewError::Fits {
                source: FitsErrorKind::BadAxes(_),
                ..
            }
        ));
    }

    #[test]
    fn test_negative_axis_is_rejected() {
        let bytes = block(&cards(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                   -4",
            "NAXIS2  =                    4",
        ]));
        assert!(matches!(
            parse_fits(&bytes),
            Err(GviewError::Fits {
                source: FitsErrorKind::BadAxes(_),
                ..
            })
        ));
    }

    #[test]
    fn test_extension_overrunning_file_is_truncated() {
        let bytes = block(&cards(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    1",
            "NAXIS1  =              1000000",
        ]));
        assert!(matches!(
            parse_fits(&bytes),
            Err(GviewError::Fits {
                source: FitsErrorKind::Truncated { expected: 2_000_000, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_not_fits() {
        let bytes = block(&cards(&["XTENSION= 'IMAGE   '"]));
        assert!(matches!(
            parse_fits(&bytes),
            Err(GviewError::Fits {
                source: FitsErrorKind::NotFits,
                ..
            })
        ));
        assert!(!looks_like_fits(b"hello"));
    }

    #[test]
    fn test_missing_end() {
        let bytes = vec![b' '; BLOCK_LEN];
        assert!(matches!(
            parse_header(&bytes),
            Err(GviewError::Fits {
                source: FitsErrorKind::MissingEnd,
                ..
            })
        ));
    }
}
