//! Uniform decode capability shared by every wrapped codec.
//!
//! A decoder is a per-call state machine:
//!
//! ```text
//! Fresh --decode_image_config--> ConfigKnown --decode_frame_config--> FrameConfigKnown
//!       --decode_frame--> FrameDecoded
//! ```
//!
//! Calling a stage out of order fails with a codec error instead of
//! touching codec state.

use imgref::ImgRefMut;
use rgb::alt::BGRA;

use crate::{DecodeError, ImageFormat};

/// Image-level configuration from the header stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ImageConfig {
    pub width: u32,
    pub height: u32,
}

/// Per-frame configuration from the frame header stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FrameConfig {
    pub width: u32,
    pub height: u32,
}

/// Inclusive range of scratch bytes a decoder may need for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WorkbufRange {
    pub min_incl: u64,
    pub max_incl: u64,
}

impl WorkbufRange {
    pub(crate) const EMPTY: Self = Self {
        min_incl: 0,
        max_incl: 0,
    };

    pub(crate) fn exactly(len: usize) -> Self {
        let len = len as u64;
        Self {
            min_incl: len,
            max_incl: len,
        }
    }
}

/// How decoded pixels combine with existing destination content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PixelBlend {
    /// Overwrite the destination.
    Src,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    Fresh,
    ConfigKnown,
    FrameConfigKnown,
    FrameDecoded,
}

impl Stage {
    /// Move from `from` to `to`, or fail if the decoder is elsewhere.
    pub(crate) fn advance(
        &mut self,
        from: Stage,
        to: Stage,
        format: ImageFormat,
    ) -> Result<(), DecodeError> {
        if *self != from {
            log::trace!("{format}: expected {from:?}, decoder is at {self:?}");
            return Err(DecodeError::Codec {
                format,
                message: "bad call sequence".into(),
            });
        }
        *self = to;
        Ok(())
    }
}

/// A stateful, single-use decoder for one image.
pub(crate) trait ImageDecoder<'a> {
    /// Format this decoder handles.
    fn format(&self) -> ImageFormat;

    /// Parse the image header from the start of `src`.
    fn decode_image_config(&mut self, src: &'a [u8]) -> Result<ImageConfig, DecodeError>;

    /// Parse the metadata of the first frame.
    fn decode_frame_config(&mut self) -> Result<FrameConfig, DecodeError>;

    /// Scratch space needed by [`decode_frame`](ImageDecoder::decode_frame).
    ///
    /// Only meaningful once the frame config is known.
    fn workbuf_len(&self) -> WorkbufRange;

    /// Decode the frame's pixels into `dst`.
    ///
    /// `workbuf` holds at least `workbuf_len().max_incl` bytes.
    fn decode_frame(
        &mut self,
        dst: ImgRefMut<'_, BGRA<u8>>,
        blend: PixelBlend,
        workbuf: &mut [u8],
    ) -> Result<(), DecodeError>;
}

/// Header stage: run `decode_image_config` and reject empty images.
///
/// Some codecs accept a zero width or height; this layer never does.
pub(crate) fn decode_header<'a, D>(
    decoder: &mut D,
    src: &'a [u8],
) -> Result<ImageConfig, DecodeError>
where
    D: ImageDecoder<'a> + ?Sized,
{
    let config = decoder.decode_image_config(src)?;
    if config.width == 0 || config.height == 0 {
        return Err(DecodeError::EmptyImage {
            format: decoder.format(),
            width: config.width,
            height: config.height,
        });
    }
    log::trace!(
        "{}: header {}x{}",
        decoder.format(),
        config.width,
        config.height
    );
    Ok(config)
}
