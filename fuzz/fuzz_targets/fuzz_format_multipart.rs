#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio_mime_entity::{Error, Formatter, Header, Part};

fuzz_target!(|data: &[u8]| {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();

    rt.block_on(async {
        let content_type = Header::parse("Content-Type: multipart/mixed; boundary=fuzz").unwrap();
        let mut part = Part::multi(
            vec![Part::content(std::io::Cursor::new(data.to_vec()), Vec::new())],
            vec![content_type],
        );

        let stream = Formatter::new().chunk_size(64).format(&mut part).unwrap();
        match stream.to_vec().await {
            Ok(out) => {
                // Only the multipart's own delimiter lines may start with --fuzz
                let delimiters = out
                    .split(|&b| b == b'\n')
                    .filter(|line| line.starts_with(b"--fuzz"))
                    .count();
                assert_eq!(delimiters, 2);
            }
            Err(Error::Format(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    });
});
