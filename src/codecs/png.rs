//! PNG codec adapter using png crate.
//!
//! The png crate reads through `std::io`, so the input slice is wrapped in a
//! `Cursor`. Output is normalized to 8-bit gray/gray-alpha/RGB/RGBA in the
//! workspace, then converted to BGRA8.

use std::io::Cursor;

use imgref::ImgRefMut;
use rgb::alt::BGRA;

use crate::convert::{self, SourceLayout};
use crate::decoder::{FrameConfig, ImageConfig, ImageDecoder, PixelBlend, Stage, WorkbufRange};
use crate::{DecodeError, ImageFormat, Limits};

pub(crate) struct PngDecoder<'a> {
    memory_budget: usize,
    stage: Stage,
    reader: Option<png::Reader<Cursor<&'a [u8]>>>,
    workbuf: WorkbufRange,
}

impl<'a> PngDecoder<'a> {
    pub(crate) fn new(limits: &Limits) -> Self {
        Self {
            memory_budget: limits.codec_memory_budget(),
            stage: Stage::Fresh,
            reader: None,
            workbuf: WorkbufRange::EMPTY,
        }
    }

    fn reader_mut(&mut self) -> Result<&mut png::Reader<Cursor<&'a [u8]>>, DecodeError> {
        self.reader.as_mut().ok_or_else(|| DecodeError::Codec {
            format: ImageFormat::Png,
            message: "bad call sequence".into(),
        })
    }
}

fn png_err(e: png::DecodingError) -> DecodeError {
    DecodeError::from_codec(ImageFormat::Png, e)
}

/// Header-stage errors. The png crate refuses headers whose buffers exceed its
/// limits; that is a size problem, not a malformed stream.
fn png_header_err(e: png::DecodingError) -> DecodeError {
    match e {
        png::DecodingError::LimitsExceeded => {
            DecodeError::LimitExceeded("PNG header exceeds decoder memory limits")
        }
        e => png_err(e),
    }
}

impl<'a> ImageDecoder<'a> for PngDecoder<'a> {
    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn decode_image_config(&mut self, src: &'a [u8]) -> Result<ImageConfig, DecodeError> {
        self.stage
            .advance(Stage::Fresh, Stage::ConfigKnown, ImageFormat::Png)?;

        let mut limits = png::Limits::default();
        limits.bytes = self.memory_budget;
        let mut decoder = png::Decoder::new_with_limits(Cursor::new(src), limits);
        decoder.set_transformations(png::Transformations::normalize_to_color8());

        let reader = decoder.read_info().map_err(png_header_err)?;
        let info = reader.info();
        let config = ImageConfig {
            width: info.width,
            height: info.height,
        };
        if let Some(actl) = &info.animation_control {
            log::trace!("PNG: animated, {} frames, decoding the first", actl.num_frames);
        }
        self.reader = Some(reader);
        Ok(config)
    }

    fn decode_frame_config(&mut self) -> Result<FrameConfig, DecodeError> {
        self.stage
            .advance(Stage::ConfigKnown, Stage::FrameConfigKnown, ImageFormat::Png)?;
        let reader = self.reader_mut()?;

        let info = reader.info();
        let frame = match &info.frame_control {
            Some(fctl) => FrameConfig {
                width: fctl.width,
                height: fctl.height,
            },
            None => FrameConfig {
                width: info.width,
                height: info.height,
            },
        };

        let buffer_size = reader.output_buffer_size().ok_or_else(|| {
            DecodeError::from_codec(ImageFormat::Png, "cannot determine PNG output buffer size")
        })?;
        self.workbuf = WorkbufRange::exactly(buffer_size);
        Ok(frame)
    }

    fn workbuf_len(&self) -> WorkbufRange {
        self.workbuf
    }

    fn decode_frame(
        &mut self,
        dst: ImgRefMut<'_, BGRA<u8>>,
        blend: PixelBlend,
        workbuf: &mut [u8],
    ) -> Result<(), DecodeError> {
        self.stage
            .advance(Stage::FrameConfigKnown, Stage::FrameDecoded, ImageFormat::Png)?;
        let PixelBlend::Src = blend;
        let reader = self.reader_mut()?;

        let output_info = reader.next_frame(workbuf).map_err(png_err)?;
        let layout = match output_info.color_type {
            png::ColorType::Grayscale => SourceLayout::Gray8,
            png::ColorType::GrayscaleAlpha => SourceLayout::GrayAlpha8,
            png::ColorType::Rgb => SourceLayout::Rgb8,
            png::ColorType::Rgba => SourceLayout::Rgba8,
            png::ColorType::Indexed => {
                return Err(DecodeError::from_codec(
                    ImageFormat::Png,
                    "palette was not expanded",
                ));
            }
        };
        if output_info.bit_depth != png::BitDepth::Eight {
            return Err(DecodeError::from_codec(
                ImageFormat::Png,
                "output was not normalized to 8 bits",
            ));
        }

        convert::write_bgra8(
            ImageFormat::Png,
            &workbuf[..output_info.buffer_size()],
            output_info.line_size,
            layout,
            dst,
        )
    }
}
