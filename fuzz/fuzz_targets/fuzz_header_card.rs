#![no_main]
use libfuzzer_sys::fuzz_target;

/// Parse arbitrary 80-column cards.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = gview::fits::Card::parse(s);
    }
});
