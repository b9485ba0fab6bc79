#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio_mime_entity::encoding::QuotedPrintableEncoder;

fuzz_target!(|data: &[u8]| {
    let mut whole = Vec::new();
    let mut encoder = QuotedPrintableEncoder::new();
    encoder.encode(data, &mut whole);
    encoder.finish(&mut whole);

    // Chunk boundaries must not change the output
    let mut chunked = Vec::new();
    let mut encoder = QuotedPrintableEncoder::new();
    for chunk in data.chunks(5) {
        encoder.encode(chunk, &mut chunked);
    }
    encoder.finish(&mut chunked);
    assert_eq!(whole, chunked);

    for line in whole.split(|&b| b == b'\n') {
        assert!(line.len() <= 77);
    }
});
