#![no_main]

use libfuzzer_sys::fuzz_target;
use xenoscan::ions::SignatureKey;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(key) = SignatureKey::parse(text) {
        // a parsed key must survive its own text form
        let reparsed = SignatureKey::parse(&key.to_string());
        assert_eq!(reparsed.as_ref(), Ok(&key));
        assert_eq!(key.rung_zero().order, 0);
    }
});
