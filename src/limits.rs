//! Resource limits for probe and decode operations.

use crate::DecodeError;

/// Resource limits for decode operations.
///
/// All limits are optional. The default places no restriction beyond the
/// overflow guards that always apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u32>,
    /// Maximum image height in pixels.
    pub max_height: Option<u32>,
    /// Maximum total pixels (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes allocated or written by one decode: destination plus workspace.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Create a new Limits with no restrictions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if dimensions are within limits.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        if let Some(max_width) = self.max_width {
            if width > max_width {
                return Err(DecodeError::LimitExceeded("width exceeds limit"));
            }
        }

        if let Some(max_height) = self.max_height {
            if height > max_height {
                return Err(DecodeError::LimitExceeded("height exceeds limit"));
            }
        }

        if let Some(max_pixels) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_pixels {
                return Err(DecodeError::LimitExceeded("pixel count exceeds limit"));
            }
        }

        Ok(())
    }

    /// Check if a memory allocation is within limits.
    pub fn check_memory(&self, bytes: u64) -> Result<(), DecodeError> {
        if let Some(max_memory) = self.max_memory_bytes {
            if bytes > max_memory {
                return Err(DecodeError::LimitExceeded(
                    "memory allocation exceeds limit",
                ));
            }
        }
        Ok(())
    }

    /// Memory budget handed to the wrapped codecs.
    pub(crate) fn codec_memory_budget(&self) -> usize {
        self.max_memory_bytes
            .and_then(|bytes| usize::try_from(bytes).ok())
            .unwrap_or(usize::MAX)
    }
}
