#![no_main]
use libfuzzer_sys::fuzz_target;

/// Feed arbitrary bytes to the FITS decoder.
///
/// Covers header block parsing, BITPIX/NAXIS validation, extension
/// skipping and data decoding with truncated or oversized payloads.
fuzz_target!(|data: &[u8]| {
    let _ = gview::fits::parse_fits(data);
});
