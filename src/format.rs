//! Image format detection.

use core::fmt;

/// Image formats recognized by [`ImageFormat::detect`].
///
/// Only [`Jpeg`](ImageFormat::Jpeg) and [`Png`](ImageFormat::Png) have decoders.
/// The others are recognized so that callers get a precise
/// `UnsupportedFormat` error instead of a generic one.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

/// Length of the longest signature checked by [`ImageFormat::detect`].
pub const MAX_SIGNATURE_LEN: usize = 12;

/// Length of the shortest signature checked by [`ImageFormat::detect`].
pub const MIN_SIGNATURE_LEN: usize = 3;

impl ImageFormat {
    /// Detect format from magic bytes. Returns None if unrecognized.
    ///
    /// Only the first [`MAX_SIGNATURE_LEN`] bytes are examined. Truncated
    /// signatures are unrecognized.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < MIN_SIGNATURE_LEN {
            return None;
        }

        // JPEG: FF D8 FF
        if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
            return Some(ImageFormat::Jpeg);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        // GIF: "GIF87a" or "GIF89a"
        if data.len() >= 6
            && &data[0..4] == b"GIF8"
            && (data[4] == b'7' || data[4] == b'9')
            && data[5] == b'a'
        {
            return Some(ImageFormat::Gif);
        }

        // WebP: "RIFF....WEBP"
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }

    /// MIME type string.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Whether this crate can decode the format.
    pub fn is_decodable(self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Png)
    }

    /// Short upper-case name, as used in messages.
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::WebP => "WebP",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
