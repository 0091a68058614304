//! Codec adapters and the decoder factory.
//!
//! Each module provides a thin adapter between the uniform
//! [`ImageDecoder`] capability and a format-specific codec crate.

pub(crate) mod jpeg;
pub(crate) mod png;

use imgref::ImgRefMut;
use rgb::alt::BGRA;

use crate::decoder::{FrameConfig, ImageConfig, ImageDecoder, PixelBlend, WorkbufRange};
use crate::{DecodeError, ImageFormat, Limits};

/// A decoder for one of the supported formats, selected by sniffed format.
pub(crate) enum AnyDecoder<'a> {
    Jpeg(jpeg::JpegDecoder<'a>),
    Png(png::PngDecoder<'a>),
}

/// Build a fresh decoder for `format`.
///
/// Recognized formats without a decoder fail with `UnsupportedFormat`.
pub(crate) fn create<'a>(
    format: ImageFormat,
    limits: &Limits,
) -> Result<AnyDecoder<'a>, DecodeError> {
    match format {
        ImageFormat::Jpeg => Ok(AnyDecoder::Jpeg(jpeg::JpegDecoder::new(limits))),
        ImageFormat::Png => Ok(AnyDecoder::Png(png::PngDecoder::new(limits))),
        other => Err(DecodeError::UnsupportedFormat(other)),
    }
}

/// Sniff `data` and build the matching decoder.
pub(crate) fn for_data<'a>(
    data: &[u8],
    limits: &Limits,
) -> Result<AnyDecoder<'a>, DecodeError> {
    let format = ImageFormat::detect(data).ok_or(DecodeError::UnrecognizedFormat)?;
    log::trace!("sniffed {format}");
    create(format, limits)
}

impl<'a> ImageDecoder<'a> for AnyDecoder<'a> {
    fn format(&self) -> ImageFormat {
        match self {
            AnyDecoder::Jpeg(d) => d.format(),
            AnyDecoder::Png(d) => d.format(),
        }
    }

    fn decode_image_config(&mut self, src: &'a [u8]) -> Result<ImageConfig, DecodeError> {
        match self {
            AnyDecoder::Jpeg(d) => d.decode_image_config(src),
            AnyDecoder::Png(d) => d.decode_image_config(src),
        }
    }

    fn decode_frame_config(&mut self) -> Result<FrameConfig, DecodeError> {
        match self {
            AnyDecoder::Jpeg(d) => d.decode_frame_config(),
            AnyDecoder::Png(d) => d.decode_frame_config(),
        }
    }

    fn workbuf_len(&self) -> WorkbufRange {
        match self {
            AnyDecoder::Jpeg(d) => d.workbuf_len(),
            AnyDecoder::Png(d) => d.workbuf_len(),
        }
    }

    fn decode_frame(
        &mut self,
        dst: ImgRefMut<'_, BGRA<u8>>,
        blend: PixelBlend,
        workbuf: &mut [u8],
    ) -> Result<(), DecodeError> {
        match self {
            AnyDecoder::Jpeg(d) => d.decode_frame(dst, blend, workbuf),
            AnyDecoder::Png(d) => d.decode_frame(dst, blend, workbuf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_supported_decoders() {
        let limits = Limits::none();
        assert_eq!(create(ImageFormat::Jpeg, &limits).unwrap().format(), ImageFormat::Jpeg);
        assert_eq!(create(ImageFormat::Png, &limits).unwrap().format(), ImageFormat::Png);
    }

    #[test]
    fn recognized_but_unsupported() {
        let limits = Limits::none();
        assert!(matches!(
            create(ImageFormat::Gif, &limits),
            Err(DecodeError::UnsupportedFormat(ImageFormat::Gif))
        ));
        assert!(matches!(
            for_data(b"RIFF\0\0\0\0WEBPVP8 ", &limits),
            Err(DecodeError::UnsupportedFormat(ImageFormat::WebP))
        ));
    }

    #[test]
    fn unknown_bytes() {
        assert!(matches!(
            for_data(b"not an image", &Limits::none()),
            Err(DecodeError::UnrecognizedFormat)
        ));
    }
}
