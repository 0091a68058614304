//! C ABI.
//!
//! Every function returns a status code (`0` on success, see [`Status`]) and
//! writes its out-struct only on success. The diagnostic for the most recent
//! failing call on the calling thread is available from
//! [`zenframe_error_message`].

#![allow(unsafe_code)]
#![allow(non_camel_case_types)]

use core::cell::RefCell;
use core::ffi::c_char;
use core::slice;
use std::ffi::CString;

use crate::{
    DecodeError, DecodeParams, FrameResult, PixelFormat, ProbeResult, Status, status,
};

/// Image metadata, filled by [`zenframe_probe_image`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct zenframe_probe_result {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub bytes_per_pixel: u32,
    pub stride_bytes: u32,
}

/// Optional decode configuration.
///
/// A `pixel_format` of `0` selects BGRA non-premultiplied. `flags` is reserved.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct zenframe_decode_params {
    pub pixel_format: u32,
    pub flags: u32,
}

/// What [`zenframe_decode_frame_into`] wrote.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct zenframe_frame_result {
    pub width: u32,
    pub height: u32,
    pub stride_bytes: u32,
    pub bytes_written: u32,
}

impl From<ProbeResult> for zenframe_probe_result {
    fn from(p: ProbeResult) -> Self {
        Self {
            width: p.width,
            height: p.height,
            frame_count: p.frame_count,
            bytes_per_pixel: p.bytes_per_pixel,
            stride_bytes: p.stride_bytes,
        }
    }
}

impl From<FrameResult> for zenframe_frame_result {
    fn from(f: FrameResult) -> Self {
        Self {
            width: f.width,
            height: f.height,
            stride_bytes: f.stride_bytes,
            bytes_written: f.bytes_written,
        }
    }
}

impl From<zenframe_decode_params> for DecodeParams {
    fn from(p: zenframe_decode_params) -> Self {
        Self {
            pixel_format: PixelFormat::from_raw(p.pixel_format),
            flags: p.flags,
        }
    }
}

fn to_code<T>(result: Result<T, DecodeError>, write: impl FnOnce(T)) -> i32 {
    match result {
        Ok(value) => {
            write(value);
            Status::Ok.code()
        }
        Err(e) => e.code(),
    }
}

/// Probe an encoded image.
///
/// @param data: encoded bytes, must not be null
///
/// @param len: length of `data`, must be nonzero
///
/// @param out: receives the metadata on success, must not be null
///
/// \returns `0` or a negative status code
///
/// # Safety
///
/// `data` must be valid for reads of `len` bytes and `out` valid for a write
/// of one `zenframe_probe_result`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zenframe_probe_image(
    data: *const u8,
    len: usize,
    out: *mut zenframe_probe_result,
) -> i32 {
    let result = status::track(|| {
        if data.is_null() || out.is_null() {
            return Err(DecodeError::InvalidArgument("null pointer"));
        }
        if len == 0 {
            return Err(DecodeError::InvalidArgument("empty input"));
        }
        // SAFETY: non-null, caller guarantees `len` readable bytes
        let data = unsafe { slice::from_raw_parts(data, len) };
        crate::probe(data)
    });
    // SAFETY: `out` was checked non-null before any success
    to_code(result, |p| unsafe { out.write(p.into()) })
}

/// Decode one frame into a caller-owned BGRA8 buffer.
///
/// @param data: encoded bytes, must not be null
///
/// @param len: length of `data`, must be nonzero
///
/// @param frame_index: must be `0`
///
/// @param params: decode configuration, null selects the defaults
///
/// @param dest: destination pixels, at least `width * height * 4` bytes
///
/// @param dest_len: length of `dest`
///
/// @param out: receives the frame description on success, must not be null
///
/// \returns `0` or a negative status code
///
/// # Safety
///
/// `data` must be valid for reads of `len` bytes, `dest` valid for writes of
/// `dest_len` bytes and not overlap `data`, `params` null or valid for a
/// read, `out` valid for a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zenframe_decode_frame_into(
    data: *const u8,
    len: usize,
    frame_index: u32,
    params: *const zenframe_decode_params,
    dest: *mut u8,
    dest_len: usize,
    out: *mut zenframe_frame_result,
) -> i32 {
    let result = status::track(|| {
        if data.is_null() || dest.is_null() || out.is_null() {
            return Err(DecodeError::InvalidArgument("null pointer"));
        }
        if len == 0 {
            return Err(DecodeError::InvalidArgument("empty input"));
        }
        // SAFETY: caller contract
        let (data, dest) = unsafe {
            (
                slice::from_raw_parts(data, len),
                slice::from_raw_parts_mut(dest, dest_len),
            )
        };
        // SAFETY: null or valid for a read
        let params = unsafe { params.as_ref() }.map(|p| DecodeParams::from(*p));
        crate::decode_frame_into(data, frame_index, params.as_ref(), dest)
    });
    // SAFETY: `out` was checked non-null before any success
    to_code(result, |f| unsafe { out.write(f.into()) })
}

/// Whether the AVX2-accelerated code paths are usable on this CPU and OS.
#[unsafe(no_mangle)]
pub extern "C" fn zenframe_cpu_supports_avx2() -> bool {
    crate::supports_accelerated_path()
}

std::thread_local! {
    static MESSAGE: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Diagnostic text for a status code.
///
/// \returns a NUL-terminated string, never null. It stays valid until the next
/// call into this library on the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn zenframe_error_message(code: i32) -> *const c_char {
    if code == Status::Ok.code() {
        return c"ok".as_ptr();
    }
    let text = status::error_message(code);
    let message = CString::new(text.replace('\0', " ")).unwrap_or_default();
    MESSAGE.with(|slot| slot.borrow_mut().insert(message).as_ptr())
}
