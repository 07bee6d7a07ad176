#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use xenoscan::mzml::MzMLScanReader;

fuzz_target!(|data: &[u8]| {
    // Malformed documents must surface as errors, never as panics
    let mut reader = MzMLScanReader::new(Cursor::new(data));
    for _ in 0..100 {
        match reader.next_ms1() {
            Ok(Some(scan)) => {
                let _ = scan.mz.len() + scan.intensity.len();
            }
            Ok(None) | Err(_) => break,
        }
    }
});
