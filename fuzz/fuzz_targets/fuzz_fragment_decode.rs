#![no_main]

use blobmark_core::fragment::{decode, decode_body, encode, parse_anchor_id, to_hash};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    // decode must never panic.
    if let Some(range) = decode(text) {
        assert!(range.lo() <= range.hi());
        assert_eq!(decode_body(&text[1..]), Some(range));

        // Re-encoding a decoded range is canonical and decodes to itself.
        let hash = to_hash(range);
        assert_eq!(decode(&hash), Some(range));
        assert_eq!(decode_body(&encode(range)), Some(range));
    }

    if let Some(line) = parse_anchor_id(text) {
        assert!(line.get() >= 1);
    }
});
