#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zenframe::{DecodeParams, Limits, PixelFormat, Status};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    frame_index: u8,
    pixel_format: Option<u32>,
    /// Destination size as a fraction of the required size, in 1/64ths.
    dest_scale: u8,
    data: &'a [u8],
}

// Keep allocations bounded so the fuzzer explores parsing, not the allocator.
const MAX_PIXELS: u64 = 16 * 1024 * 1024;

fuzz_target!(|input: Input<'_>| {
    let limits = Limits {
        max_pixels: Some(MAX_PIXELS),
        ..Limits::default()
    };
    let Ok(info) = zenframe::DecodeRequest::new(input.data)
        .with_limits(&limits)
        .probe()
    else {
        return;
    };

    let required = info.stride_bytes as usize * info.height as usize;
    let len = required * usize::from(input.dest_scale) / 64;
    let mut dest = vec![0u8; len];
    let params = DecodeParams {
        pixel_format: input.pixel_format.and_then(PixelFormat::from_raw),
        flags: 0,
    };

    let result = zenframe::DecodeRequest::new(input.data)
        .with_frame_index(u32::from(input.frame_index))
        .with_params(params)
        .with_limits(&limits)
        .decode_into(&mut dest);

    match result {
        Ok(frame) => {
            assert_eq!(frame.width, info.width);
            assert_eq!(frame.height, info.height);
            assert_eq!(frame.bytes_written as usize, required);
            assert!(len >= required);
        }
        Err(e) => {
            if input.frame_index != 0 {
                assert_eq!(e.status(), Status::NotImplemented);
            } else if len < required && e.status() != Status::NotImplemented {
                assert_eq!(e.status(), Status::InvalidArgument);
            }
        }
    }
});
