//! # zenframe
//!
//! Minimal still-image decoding: sniff JPEG or PNG bytes, report dimensions
//! without decoding pixels, and decode the first frame into a caller-owned
//! BGRA8 (non-premultiplied) buffer.
//!
//! Every size derived from a header is overflow-checked before it sizes a
//! buffer. Each call builds its own decoder and scratch workspace and releases
//! both before returning, so calls share no state.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zenframe::{decode_frame_into, probe};
//!
//! let data: &[u8] = &[]; // your image bytes
//! let info = probe(data)?;
//! let mut pixels = vec![0u8; info.stride_bytes as usize * info.height as usize];
//! let frame = decode_frame_into(data, 0, None, &mut pixels)?;
//! assert_eq!(frame.bytes_written as usize, pixels.len());
//! # Ok::<(), zenframe::DecodeError>(())
//! ```
//!
//! Failures carry a stable [`Status`] code. The message of the most recent
//! failure on the calling thread is available from [`error_message`]. The
//! same surface is exported to C by the [`ffi`] module.

#![deny(unsafe_code)]

extern crate alloc;

mod capability;
mod codecs;
mod convert;
mod decode;
mod decoder;
mod error;
pub mod ffi;
mod format;
mod limits;
mod probe;
mod size;
mod status;

pub use capability::supports_accelerated_path;
pub use decode::{
    DecodeParams, DecodeRequest, DecodedImage, FrameResult, PixelFormat, decode_frame_into,
};
pub use error::{DecodeError, Status};
pub use format::{ImageFormat, MAX_SIGNATURE_LEN, MIN_SIGNATURE_LEN};
pub use limits::Limits;
pub use probe::{ProbeResult, probe};
pub use size::{BYTES_PER_PIXEL, FrameLayout};
pub use status::{error_message, last_error_message};
