//! JPEG codec adapter using zune-jpeg.

use imgref::ImgRefMut;
use rgb::alt::BGRA;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder as ZuneJpegDecoder;

use crate::capability;
use crate::convert::{self, SourceLayout};
use crate::decoder::{FrameConfig, ImageConfig, ImageDecoder, PixelBlend, Stage, WorkbufRange};
use crate::{DecodeError, ImageFormat, Limits};

/// Largest dimension a baseline or progressive JPEG can declare.
const JPEG_MAX_DIMENSION: usize = u16::MAX as usize;

const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

pub(crate) struct JpegDecoder<'a> {
    options: DecoderOptions,
    src: &'a [u8],
    stage: Stage,
    inner: Option<ZuneJpegDecoder<&'a [u8]>>,
    layout: Option<SourceLayout>,
    workbuf: WorkbufRange,
}

/// Build zune-jpeg options from limits and the CPU capability probe.
fn build_options(limits: &Limits) -> DecoderOptions {
    let max_width = limits
        .max_width
        .map_or(JPEG_MAX_DIMENSION, |w| (w as usize).min(JPEG_MAX_DIMENSION));
    let max_height = limits
        .max_height
        .map_or(JPEG_MAX_DIMENSION, |h| (h as usize).min(JPEG_MAX_DIMENSION));

    DecoderOptions::default()
        .jpeg_set_out_colorspace(ColorSpace::RGB)
        .set_max_width(max_width)
        .set_max_height(max_height)
        .set_use_unsafe(capability::supports_accelerated_path())
}

fn jpeg_err(e: zune_jpeg::errors::DecodeErrors) -> DecodeError {
    DecodeError::Codec {
        format: ImageFormat::Jpeg,
        message: alloc::format!("{e:?}"),
    }
}

/// Walk the marker segments after SOI and report whether an EOI marker
/// follows the last scan.
///
/// zune-jpeg zero-fills scan data it cannot read, so a cut-off stream would
/// otherwise decode as a complete image.
fn reaches_end_of_image(data: &[u8]) -> bool {
    let mut pos = 2;
    loop {
        if data.get(pos) != Some(&0xFF) {
            return false;
        }
        // fill bytes may precede any marker
        while data.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let Some(&marker) = data.get(pos) else {
            return false;
        };
        pos += 1;
        match marker {
            EOI => return true,
            0x01 | 0xD0..=0xD7 => continue,
            _ => {}
        }
        let Some(len) = data.get(pos..pos + 2) else {
            return false;
        };
        let len = usize::from(u16::from_be_bytes([len[0], len[1]]));
        if len < 2 {
            return false;
        }
        pos += len;
        if marker == SOS {
            match skip_entropy_coded(data, pos) {
                Some(next) => pos = next,
                None => return false,
            }
        }
    }
}

/// Position of the first marker after entropy-coded data starting at `pos`.
///
/// `FF 00` is a stuffed byte and `FF D0..=D7` are restart markers; neither
/// ends the scan.
fn skip_entropy_coded(data: &[u8], pos: usize) -> Option<usize> {
    let tail = data.get(pos..)?;
    tail.windows(2)
        .position(|w| w[0] == 0xFF && !matches!(w[1], 0x00 | 0xD0..=0xD7 | 0xFF))
        .map(|i| pos + i)
}

fn source_layout(colorspace: ColorSpace) -> Result<SourceLayout, DecodeError> {
    match colorspace {
        ColorSpace::Luma => Ok(SourceLayout::Gray8),
        ColorSpace::LumaA => Ok(SourceLayout::GrayAlpha8),
        ColorSpace::RGB => Ok(SourceLayout::Rgb8),
        ColorSpace::RGBA => Ok(SourceLayout::Rgba8),
        ColorSpace::BGR => Ok(SourceLayout::Bgr8),
        ColorSpace::BGRA => Ok(SourceLayout::Bgra8),
        other => Err(DecodeError::Codec {
            format: ImageFormat::Jpeg,
            message: alloc::format!("unsupported output colorspace {other:?}"),
        }),
    }
}

impl<'a> JpegDecoder<'a> {
    pub(crate) fn new(limits: &Limits) -> Self {
        Self {
            options: build_options(limits),
            src: &[],
            stage: Stage::Fresh,
            inner: None,
            layout: None,
            workbuf: WorkbufRange::EMPTY,
        }
    }

    fn inner_mut(&mut self) -> Result<&mut ZuneJpegDecoder<&'a [u8]>, DecodeError> {
        self.inner.as_mut().ok_or_else(|| DecodeError::Codec {
            format: ImageFormat::Jpeg,
            message: "bad call sequence".into(),
        })
    }
}

impl<'a> ImageDecoder<'a> for JpegDecoder<'a> {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn decode_image_config(&mut self, src: &'a [u8]) -> Result<ImageConfig, DecodeError> {
        self.stage
            .advance(Stage::Fresh, Stage::ConfigKnown, ImageFormat::Jpeg)?;

        let mut decoder = ZuneJpegDecoder::new_with_options(src, self.options);
        decoder.decode_headers().map_err(jpeg_err)?;

        let (width, height) = decoder.dimensions().ok_or_else(|| {
            DecodeError::from_codec(ImageFormat::Jpeg, "no frame header before scan data")
        })?;
        let to_u32 = |v: usize| {
            u32::try_from(v)
                .map_err(|_| DecodeError::from_codec(ImageFormat::Jpeg, "dimension out of range"))
        };
        let config = ImageConfig {
            width: to_u32(width)?,
            height: to_u32(height)?,
        };
        self.src = src;
        self.inner = Some(decoder);
        Ok(config)
    }

    fn decode_frame_config(&mut self) -> Result<FrameConfig, DecodeError> {
        self.stage
            .advance(Stage::ConfigKnown, Stage::FrameConfigKnown, ImageFormat::Jpeg)?;
        let decoder = self.inner_mut()?;

        let colorspace = decoder.get_output_colorspace().ok_or_else(|| {
            DecodeError::from_codec(ImageFormat::Jpeg, "output colorspace unknown")
        })?;
        let buffer_size = decoder.output_buffer_size().ok_or_else(|| {
            DecodeError::from_codec(ImageFormat::Jpeg, "cannot determine JPEG output buffer size")
        })?;
        let (width, height) = decoder.dimensions().unwrap_or((0, 0));

        self.layout = Some(source_layout(colorspace)?);
        self.workbuf = WorkbufRange::exactly(buffer_size);
        // a JPEG has exactly one frame, the size of the image
        Ok(FrameConfig {
            width: width as u32,
            height: height as u32,
        })
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
            .advance(Stage::FrameConfigKnown, Stage::FrameDecoded, ImageFormat::Jpeg)?;
        let PixelBlend::Src = blend;
        let layout = self.layout.ok_or_else(|| DecodeError::Codec {
            format: ImageFormat::Jpeg,
            message: "bad call sequence".into(),
        })?;
        if !reaches_end_of_image(self.src) {
            return Err(DecodeError::from_codec(
                ImageFormat::Jpeg,
                "truncated scan data: no end of image marker",
            ));
        }
        let decoder = self.inner_mut()?;

        decoder.decode_into(workbuf).map_err(jpeg_err)?;

        let stride = dst.width() * layout.channels();
        convert::write_bgra8(ImageFormat::Jpeg, workbuf, stride, layout, dst)
    }
}
