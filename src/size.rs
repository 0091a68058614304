//! Overflow-checked size arithmetic for destination and workspace buffers.
//!
//! Width and height come straight out of untrusted headers. Every product is
//! computed in `u64` and range-checked before it sizes a slice or an allocation.

use alloc::vec::Vec;

use crate::DecodeError;
use crate::decoder::WorkbufRange;

/// Bytes per BGRA8 pixel.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Row stride reported by probe: `width * 4`, saturating.
///
/// Only reported to callers. Nothing is sized from it.
pub fn reported_stride(width: u32) -> u32 {
    width.saturating_mul(BYTES_PER_PIXEL)
}

/// Validated byte layout of a tightly packed BGRA8 frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    /// Bytes per row. Always fits in `u32`.
    pub stride_bytes: u32,
    /// Total bytes, `stride_bytes * height`. Always fits in `u32`.
    pub len: u32,
}

impl FrameLayout {
    /// Compute the layout for a `width` x `height` BGRA8 frame.
    ///
    /// Fails with `InvalidArgument` when a dimension is zero, when the
    /// 64-bit product would overflow, or when the total exceeds `u32::MAX`.
    pub fn bgra8(width: u32, height: u32) -> Result<Self, DecodeError> {
        let row_bytes = u64::from(width) * u64::from(BYTES_PER_PIXEL);
        let rows = u64::from(height);
        if row_bytes == 0 || rows == 0 || row_bytes > u64::MAX / rows {
            return Err(DecodeError::InvalidArgument("image size overflows"));
        }
        let total = row_bytes * rows;
        let len = u32::try_from(total)
            .map_err(|_| DecodeError::InvalidArgument("image size exceeds 4 GiB"))?;
        // row_bytes <= total, so it fits too
        let stride_bytes = row_bytes as u32;
        Ok(Self {
            width,
            height,
            stride_bytes,
            len,
        })
    }

    /// Total length as a slice length.
    pub fn len_usize(&self) -> Result<usize, DecodeError> {
        usize::try_from(self.len)
            .map_err(|_| DecodeError::InvalidArgument("image size exceeds address space"))
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.len as usize / BYTES_PER_PIXEL as usize
    }
}

/// Workspace length for a decoder-reported range.
///
/// The inclusive upper bound is always used. A range whose lower bound
/// exceeds its upper bound is rejected.
pub(crate) fn workspace_len(range: WorkbufRange) -> Result<usize, DecodeError> {
    if range.min_incl > range.max_incl {
        return Err(DecodeError::InvalidArgument("inverted workspace range"));
    }
    usize::try_from(range.max_incl)
        .map_err(|_| DecodeError::InvalidArgument("workspace size exceeds address space"))
}

/// Transient scratch buffer for one frame decode.
///
/// Allocated fallibly at exactly the requested length and freed on drop.
/// A zero-length workspace performs no allocation.
pub(crate) struct Workspace {
    buf: Vec<u8>,
}

impl Workspace {
    pub(crate) fn allocate(len: usize) -> Result<Self, DecodeError> {
        let mut buf = Vec::new();
        if len > 0 {
            buf.try_reserve_exact(len)
                .map_err(|_| DecodeError::OutOfMemory)?;
            buf.resize(len, 0);
        }
        Ok(Self { buf })
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }
}
