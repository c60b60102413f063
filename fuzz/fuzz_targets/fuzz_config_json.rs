#![no_main]

use blobmark_core::BlobmarkConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 8192 {
        return;
    }

    // Parsing must never panic, and anything accepted must validate.
    if let Ok(config) = BlobmarkConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(!config.highlight_class.contains(char::is_whitespace));
    }
});
