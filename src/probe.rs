//! Metadata-only image inspection.
//!
//! Probing sniffs the format, builds the matching decoder and runs the header
//! stage. No pixel data is decoded and nothing is sized from the result.

use crate::decoder::{ImageDecoder, decode_header};
use crate::size::{BYTES_PER_PIXEL, reported_stride};
use crate::{DecodeError, ImageFormat, Limits, codecs, status};

/// Image metadata from the header stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    /// Detected image format.
    pub format: ImageFormat,
    /// Image width in pixels. Never zero.
    pub width: u32,
    /// Image height in pixels. Never zero.
    pub height: u32,
    /// Always 1: frames past the first are not introspected.
    pub frame_count: u32,
    /// Always 4 (BGRA8).
    pub bytes_per_pixel: u32,
    /// `width * 4`, saturating at `u32::MAX`.
    pub stride_bytes: u32,
}

/// Inspect `data` and report its dimensions.
///
/// # Example
///
/// ```no_run
/// let data: &[u8] = &[]; // your image bytes
/// let info = zenframe::probe(data)?;
/// println!("{}x{} {}", info.width, info.height, info.format);
/// # Ok::<(), zenframe::DecodeError>(())
/// ```
pub fn probe(data: &[u8]) -> Result<ProbeResult, DecodeError> {
    status::track(|| probe_with(data, &Limits::none()))
}

/// Probe body shared with [`DecodeRequest::probe`](crate::DecodeRequest::probe).
///
/// Does not touch the error channel.
pub(crate) fn probe_with(data: &[u8], limits: &Limits) -> Result<ProbeResult, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::InvalidArgument("empty input"));
    }
    let mut decoder = codecs::for_data(data, limits)?;
    let config = decode_header(&mut decoder, data)?;
    limits.check_dimensions(config.width, config.height)?;

    Ok(ProbeResult {
        format: decoder.format(),
        width: config.width,
        height: config.height,
        frame_count: 1,
        bytes_per_pixel: BYTES_PER_PIXEL,
        stride_bytes: reported_stride(config.width),
    })
}
