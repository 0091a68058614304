//! Error taxonomy and stable status codes.

use alloc::string::String;

use crate::format::ImageFormat;

/// Stable status codes reported across the C ABI and by [`DecodeError::status`].
///
/// The numeric values never change.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    /// Caller contract violation: empty input, undersized destination,
    /// unrepresentable size, exceeded limit.
    InvalidArgument = -1,
    /// No decoder matches the input bytes.
    UnsupportedFormat = -2,
    /// The selected decoder rejected the bytes, or an allocation on the
    /// decode path failed.
    CodecError = -3,
    /// A recognized request shape that is intentionally unsupported.
    NotImplemented = -4,
}

impl Status {
    /// Integer code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an integer code back to a status. Unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            -1 => Some(Status::InvalidArgument),
            -2 => Some(Status::UnsupportedFormat),
            -3 => Some(Status::CodecError),
            -4 => Some(Status::NotImplemented),
            _ => None,
        }
    }

    /// Fixed description used when no more specific message is recorded.
    pub fn default_message(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::InvalidArgument => "invalid argument",
            Status::UnsupportedFormat => "unsupported format",
            Status::CodecError => "codec error",
            Status::NotImplemented => "not implemented",
        }
    }
}

/// Unified error type for probe and decode operations.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Caller contract violation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A caller-supplied [`Limits`](crate::Limits) value was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    /// Format not recognized from magic bytes.
    #[error("unsupported format")]
    UnrecognizedFormat,
    /// Format recognized, but no decoder exists for it.
    #[error("unsupported format: no decoder for {0}")]
    UnsupportedFormat(ImageFormat),
    /// Recognized but intentionally unsupported request.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    /// The header decoded but reported a zero width or height.
    #[error("bad argument: {format} header reports a {width}x{height} image")]
    EmptyImage {
        format: ImageFormat,
        width: u32,
        height: u32,
    },
    /// Allocation failure on the decode path.
    #[error("out of memory")]
    OutOfMemory,
    /// Underlying codec error.
    #[error("{format} codec error: {message}")]
    Codec {
        format: ImageFormat,
        message: String,
    },
}

impl DecodeError {
    /// Wrap a codec-specific error.
    pub fn from_codec<E>(format: ImageFormat, error: E) -> Self
    where
        E: core::fmt::Display,
    {
        DecodeError::Codec {
            format,
            message: alloc::format!("{error}"),
        }
    }

    /// Stable status class for this error.
    pub fn status(&self) -> Status {
        match self {
            DecodeError::InvalidArgument(_) | DecodeError::LimitExceeded(_) => {
                Status::InvalidArgument
            }
            DecodeError::UnrecognizedFormat | DecodeError::UnsupportedFormat(_) => {
                Status::UnsupportedFormat
            }
            DecodeError::NotImplemented(_) => Status::NotImplemented,
            DecodeError::EmptyImage { .. }
            | DecodeError::OutOfMemory
            | DecodeError::Codec { .. } => Status::CodecError,
        }
    }

    /// Integer status code, see [`Status`].
    pub fn code(&self) -> i32 {
        self.status().code()
    }
}
