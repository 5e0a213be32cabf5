//! World coordinate system support (TAN projection only).

use crate::error::{GviewError, Result};
use crate::fits::Header;

/// Which pixel convention a position is given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSystem {
    /// 0-based array indices
    Data,
    /// 1-based FITS pixel coordinates
    Fits,
}

/// Gnomonic (TAN) celestial WCS.
#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    crpix: [f64; 2],
    crval: [f64; 2],
    /// Linear transform in degrees per pixel.
    cd: [[f64; 2]; 2],
}

impl Wcs {
    /// Build a WCS from the CD matrix, PC + CDELT, or CDELT + CROTA2 keywords.
    pub fn from_header(header: &Header) -> Result<Self> {
        let ctype1 = header.get_str("CTYPE1").unwrap_or_default().to_uppercase();
        let ctype2 = header.get_str("CTYPE2").unwrap_or_default().to_uppercase();
        if ctype1.is_empty() || ctype2.is_empty() {
            return Err(GviewError::wcs("no CTYPE1/CTYPE2 keywords"));
        }
        for ctype in [&ctype1, &ctype2] {
            if ctype.len() > 4 && !ctype.ends_with("-TAN") {
                return Err(GviewError::wcs(format!("unsupported projection {ctype:?}")));
            }
        }

        let get = |kw: &str| header.get_f64(kw);
        let crpix = [
            get("CRPIX1").ok_or_else(|| GviewError::wcs("missing CRPIX1"))?,
            get("CRPIX2").ok_or_else(|| GviewError::wcs("missing CRPIX2"))?,
        ];
        let crval = [
            get("CRVAL1").ok_or_else(|| GviewError::wcs("missing CRVAL1"))?,
            get("CRVAL2").ok_or_else(|| GviewError::wcs("missing CRVAL2"))?,
        ];

        let cd = if header.contains("CD1_1") || header.contains("CD2_2") {
            [
                [get("CD1_1").unwrap_or(0.0), get("CD1_2").unwrap_or(0.0)],
                [get("CD2_1").unwrap_or(0.0), get("CD2_2").unwrap_or(0.0)],
            ]
        } else {
            let cdelt1 = get("CDELT1").ok_or_else(|| GviewError::wcs("missing CDELT1 or CD matrix"))?;
            let cdelt2 = get("CDELT2").ok_or_else(|| GviewError::wcs("missing CDELT2 or CD matrix"))?;
            if header.contains("PC1_1") || header.contains("PC2_2") {
                [
                    [
                        cdelt1 * get("PC1_1").unwrap_or(1.0),
                        cdelt1 * get("PC1_2").unwrap_or(0.0),
                    ],
                    [
                        cdelt2 * get("PC2_1").unwrap_or(0.0),
                        cdelt2 * get("PC2_2").unwrap_or(1.0),
                    ],
                ]
            } else {
                let rot = get("CROTA2").unwrap_or(0.0).to_radians();
                let (sin, cos) = rot.sin_cos();
                [[cdelt1 * cos, -cdelt2 * sin], [cdelt1 * sin, cdelt2 * cos]]
            }
        };

        let det = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if det == 0.0 {
            return Err(GviewError::wcs("singular CD matrix"));
        }

        Ok(Self { crpix, crval, cd })
    }

    #[must_use]
    pub const fn cd(&self) -> [[f64; 2]; 2] {
        self.cd
    }

    /// Pixel to (RA, DEC) in degrees.
    #[must_use]
    pub fn pixtoradec(&self, x: f64, y: f64, coords: CoordSystem) -> (f64, f64) {
        let (px, py) = match coords {
            CoordSystem::Fits => (x, y),
            CoordSystem::Data => (x + 1.0, y + 1.0),
        };
        let dx = px - self.crpix[0];
        let dy = py - self.crpix[1];
        let xi = (self.cd[0][0] * dx + self.cd[0][1] * dy).to_radians();
        let eta = (self.cd[1][0] * dx + self.cd[1][1] * dy).to_radians();

        let ra0 = self.crval[0].to_radians();
        let dec0 = self.crval[1].to_radians();
        let denom = dec0.cos() - eta * dec0.sin();
        let ra = ra0 + xi.atan2(denom);
        let dec = (dec0.sin() + eta * dec0.cos()).atan2(xi.hypot(denom));

        (ra.to_degrees().rem_euclid(360.0), dec.to_degrees())
    }

    /// (RA, DEC) in degrees to pixel coordinates.
    #[must_use]
    pub fn radectopix(&self, ra_deg: f64, dec_deg: f64, coords: CoordSystem) -> (f64, f64) {
        let ra = ra_deg.to_radians();
        let dec = dec_deg.to_radians();
        let ra0 = self.crval[0].to_radians();
        let dec0 = self.crval[1].to_radians();
        let dra = ra - ra0;

        let cos_c = dec0.sin() * dec.sin() + dec0.cos() * dec.cos() * dra.cos();
        let xi = (dec.cos() * dra.sin() / cos_c).to_degrees();
        let eta = ((dec0.cos() * dec.sin() - dec0.sin() * dec.cos() * dra.cos()) / cos_c).to_degrees();

        let [[a, b], [c, d]] = self.cd;
        let det = a * d - b * c;
        let dx = (d * xi - b * eta) / det;
        let dy = (-c * xi + a * eta) / det;

        let (px, py) = (self.crpix[0] + dx, self.crpix[1] + dy);
        match coords {
            CoordSystem::Fits => (px, py),
            CoordSystem::Data => (px - 1.0, py - 1.0),
        }
    }
}

/// Format RA/DEC degrees as sexagesimal strings.
#[must_use]
pub fn deg2fmt(ra_deg: f64, dec_deg: f64) -> (String, String) {
    let ms_total = (ra_deg.rem_euclid(360.0) / 15.0 * 3_600_000.0).round() as i64 % (24 * 3_600_000);
    let hours = ms_total / 3_600_000;
    let minutes = ms_total / 60_000 % 60;
    let millis = ms_total % 60_000;
    let ra = format!("{hours:02}:{minutes:02}:{:02}.{:03}", millis / 1000, millis % 1000);

    let sign = if dec_deg < 0.0 { '-' } else { '+' };
    let cs_total = (dec_deg.abs() * 360_000.0).round() as i64;
    let degrees = cs_total / 360_000;
    let arcmin = cs_total / 6000 % 60;
    let centis = cs_total % 6000;
    let dec = format!("{sign}{degrees:02}:{arcmin:02}:{:02}.{:02}", centis / 100, centis % 100);

    (ra, dec)
}

/// Rotation (degrees) and pixel scale (degrees/pixel) of both axes.
pub fn get_xy_rotation_and_scale(header: &Header) -> Result<((f64, f64), (f64, f64))> {
    let [[cd11, cd12], [cd21, cd22]] = Wcs::from_header(header)?.cd();
    let det = cd11 * cd22 - cd12 * cd21;
    let sign = if det < 0.0 { -1.0 } else { 1.0 };

    let cdelt1 = sign * cd11.hypot(cd21);
    let cdelt2 = cd12.hypot(cd22);
    let xrot = (sign * cd21).atan2(sign * cd11).to_degrees();
    let yrot = (-cd12).atan2(cd22).to_degrees();

    Ok(((xrot, yrot), (cdelt1, cdelt2)))
}
