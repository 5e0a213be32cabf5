//! Minimal FITS support: header cards, image decoding and writing.
//!
//! Only what the viewer needs is covered: the first HDU with a 2-D image
//! (primary or `IMAGE` extension), integer and floating point BITPIX, and
//! BSCALE/BZERO/BLANK handling. Tables and tile compression are not read.

pub mod header;
mod reader;
mod writer;

pub use header::{Card, Header, HeaderValue};
pub use reader::{ImageHdu, looks_like_fits, parse_fits, parse_header, read_fits};
pub use writer::{encode_fits, write_fits};

/// FITS logical record length.
pub const BLOCK_LEN: usize = 2880;

/// Round a byte count up to a whole number of FITS blocks.
#[must_use]
pub const fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_LEN) * BLOCK_LEN
}
