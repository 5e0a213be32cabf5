//! Rasterizing a viewer into an RGB buffer.

use super::Viewer;
use rayon::prelude::*;

/// Row-major RGB pixels, row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 3]>,
}

impl RgbImage {
    #[must_use]
    pub fn filled(width: usize, height: usize, color: [u8; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }
}

impl Viewer {
    /// Render the visible part of the image into a `width` x `height` buffer.
    ///
    /// Nearest-neighbour sampling; FITS row 1 ends up at the bottom. Pixels
    /// off the image or holding NaN get the background color.
    #[must_use]
    pub fn render(&self, width: usize, height: usize) -> RgbImage {
        let mut out = RgbImage::filled(width, height, self.bg);
        let Some(image) = self.image.as_deref() else {
            return out;
        };
        if width == 0 || height == 0 {
            return out;
        }

        let grid = image.grid();
        let (lo, hi) = self.cuts;
        let rgbmap = &self.rgbmap;
        let bg = self.bg;
        out.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, line)| {
                let (_, data_y) = self.screen_to_data(0.0, row as f64 + 0.5, width, height);
                let iy = (data_y + 0.5).floor();
                if iy < 0.0 || iy >= grid.height() as f64 {
                    return;
                }
                for (col, px) in line.iter_mut().enumerate() {
                    let (data_x, _) = self.screen_to_data(col as f64 + 0.5, 0.0, width, height);
                    let ix = (data_x + 0.5).floor();
                    if ix < 0.0 || ix >= grid.width() as f64 {
                        continue;
                    }
                    *px = grid
                        .get(ix as usize, iy as usize)
                        .and_then(|v| rgbmap.get_rgb(v, lo, hi))
                        .unwrap_or(bg);
                }
            });
        out
    }

    /// Colors of the color bar from low to high, `n` samples.
    #[must_use]
    pub fn colorbar(&self, n: usize) -> Vec<[u8; 3]> {
        let last = n.saturating_sub(1).max(1) as f64;
        (0..n)
            .map(|i| self.rgbmap.cmap().color(self.rgbmap.index_of(i as f64 / last)))
            .collect()
    }
}
