#![no_main]

use libfuzzer_sys::fuzz_target;
use zenframe::{ImageFormat, Status};

fuzz_target!(|data: &[u8]| {
    match zenframe::probe(data) {
        Ok(info) => {
            assert!(info.width > 0 && info.height > 0);
            assert_eq!(info.frame_count, 1);
            assert_eq!(info.bytes_per_pixel, 4);
            assert!(info.format.is_decodable());
        }
        Err(e) => {
            if data.is_empty() {
                assert_eq!(e.status(), Status::InvalidArgument);
            } else if ImageFormat::detect(data).is_none() {
                assert_eq!(e.status(), Status::UnsupportedFormat);
            }
            assert!(!zenframe::error_message(e.code()).is_empty());
        }
    }
});
