//! First-frame decoding into BGRA8.
//!
//! Validation runs fail-fast in a fixed order: input, frame index, format,
//! pixel format, header, limits, destination size, frame header, workspace.
//! The first failing check decides the error.

use alloc::vec::Vec;

use imgref::{ImgRefMut, ImgVec};
use rgb::alt::BGRA;

use crate::codecs::{self, AnyDecoder};
use crate::decoder::{ImageDecoder, PixelBlend, decode_header};
use crate::size::{FrameLayout, Workspace, workspace_len};
use crate::{DecodeError, ImageFormat, Limits, ProbeResult, probe, status};

/// Pixel format identifier.
///
/// Only [`PixelFormat::BGRA_NONPREMUL`] can be decoded to. The other
/// constants name layouts a caller might ask for; requesting one is
/// `NotImplemented`, never a silent fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    /// 8-bit B, G, R, A with straight alpha.
    pub const BGRA_NONPREMUL: Self = Self(0x8100_8888);
    pub const BGRA_PREMUL: Self = Self(0x8200_8888);
    pub const RGBA_NONPREMUL: Self = Self(0xA100_8888);
    pub const RGBA_PREMUL: Self = Self(0xA200_8888);
    pub const BGR: Self = Self(0x8000_0888);
    pub const RGB: Self = Self(0xA000_0888);

    /// Raw C ABI value, where `0` means "use the default".
    pub fn from_raw(raw: u32) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::BGRA_NONPREMUL
    }
}

/// Optional per-call decode configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeParams {
    /// Requested output layout. `None` selects BGRA non-premultiplied.
    pub pixel_format: Option<PixelFormat>,
    /// Reserved, ignored.
    pub flags: u32,
}

impl DecodeParams {
    fn resolve_pixel_format(&self) -> Result<PixelFormat, DecodeError> {
        match self.pixel_format {
            None | Some(PixelFormat::BGRA_NONPREMUL) => Ok(PixelFormat::BGRA_NONPREMUL),
            Some(_) => Err(DecodeError::NotImplemented(
                "pixel formats other than BGRA non-premultiplied",
            )),
        }
    }
}

/// What a successful decode wrote into the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameResult {
    pub width: u32,
    pub height: u32,
    /// Always `width * 4`: rows are tightly packed.
    pub stride_bytes: u32,
    /// Always `stride_bytes * height`.
    pub bytes_written: u32,
}

/// An owned decoded first frame.
#[derive(Debug)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub pixels: ImgVec<BGRA<u8>>,
    pub frame: FrameResult,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    /// Pixels as tightly packed BGRA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.pixels.buf())
    }
}

/// Image decode request builder.
///
/// # Example
///
/// ```no_run
/// use zenframe::{DecodeRequest, Limits};
///
/// let data: &[u8] = &[]; // your image bytes
/// let limits = Limits {
///     max_pixels: Some(100_000_000),
///     ..Limits::default()
/// };
/// let image = DecodeRequest::new(data).with_limits(&limits).decode()?;
/// println!("{}x{}", image.width(), image.height());
/// # Ok::<(), zenframe::DecodeError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    frame_index: u32,
    params: DecodeParams,
    limits: Option<&'a Limits>,
}

impl<'a> DecodeRequest<'a> {
    /// Create a request for the first frame of `data` with default params.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            frame_index: 0,
            params: DecodeParams::default(),
            limits: None,
        }
    }

    /// Select a frame. Only `0` is implemented.
    pub fn with_frame_index(mut self, frame_index: u32) -> Self {
        self.frame_index = frame_index;
        self
    }

    pub fn with_params(mut self, params: DecodeParams) -> Self {
        self.params = params;
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Run only the header stage, applying dimension limits.
    pub fn probe(self) -> Result<ProbeResult, DecodeError> {
        let limits = self.limits();
        status::track(|| probe::probe_with(self.data, &limits))
    }

    /// Decode the first frame into `dest`, tightly packed BGRA8.
    ///
    /// `dest` must hold at least `width * height * 4` bytes. Bytes past that
    /// are left untouched, and nothing is written when validation fails.
    pub fn decode_into(self, dest: &mut [u8]) -> Result<FrameResult, DecodeError> {
        let limits = self.limits();
        status::track(|| {
            let mut decoder = self.open(&limits)?;
            let layout = decode_layout(&mut decoder, self.data, &limits)?;
            decode_frame(&mut decoder, layout, &limits, dest)
        })
    }

    /// Decode the first frame into a newly allocated image.
    pub fn decode(self) -> Result<DecodedImage, DecodeError> {
        let limits = self.limits();
        status::track(|| {
            let mut decoder = self.open(&limits)?;
            let layout = decode_layout(&mut decoder, self.data, &limits)?;
            limits.check_memory(u64::from(layout.len))?;

            let mut pixels: Vec<BGRA<u8>> = Vec::new();
            pixels
                .try_reserve_exact(layout.pixel_count())
                .map_err(|_| DecodeError::OutOfMemory)?;
            pixels.resize(layout.pixel_count(), BGRA::default());

            let frame = decode_frame(
                &mut decoder,
                layout,
                &limits,
                bytemuck::cast_slice_mut(&mut pixels),
            )?;
            Ok(DecodedImage {
                format: decoder.format(),
                pixels: ImgVec::new(pixels, layout.width as usize, layout.height as usize),
                frame,
            })
        })
    }

    fn limits(&self) -> Limits {
        self.limits.cloned().unwrap_or_default()
    }

    /// Checks that run before the header is parsed, then the decoder.
    fn open(&self, limits: &Limits) -> Result<AnyDecoder<'a>, DecodeError> {
        if self.data.is_empty() {
            return Err(DecodeError::InvalidArgument("empty input"));
        }
        if self.frame_index != 0 {
            return Err(DecodeError::NotImplemented("frames other than the first"));
        }
        let decoder = codecs::for_data(self.data, limits)?;
        self.params.resolve_pixel_format()?;
        Ok(decoder)
    }
}

/// Decode frame `frame_index` of `data` into `dest`.
///
/// `params` of `None` selects the defaults. See
/// [`DecodeRequest::decode_into`] for the destination contract.
pub fn decode_frame_into(
    data: &[u8],
    frame_index: u32,
    params: Option<&DecodeParams>,
    dest: &mut [u8],
) -> Result<FrameResult, DecodeError> {
    DecodeRequest::new(data)
        .with_frame_index(frame_index)
        .with_params(params.copied().unwrap_or_default())
        .decode_into(dest)
}

/// Header stage plus size arithmetic.
fn decode_layout<'a, D>(
    decoder: &mut D,
    data: &'a [u8],
    limits: &Limits,
) -> Result<FrameLayout, DecodeError>
where
    D: ImageDecoder<'a> + ?Sized,
{
    let config = decode_header(decoder, data)?;
    limits.check_dimensions(config.width, config.height)?;
    FrameLayout::bgra8(config.width, config.height)
}

/// Destination check, frame header, workspace and pixels.
///
/// The workspace is released before this returns, on every path.
fn decode_frame<'a, D>(
    decoder: &mut D,
    layout: FrameLayout,
    limits: &Limits,
    dest: &mut [u8],
) -> Result<FrameResult, DecodeError>
where
    D: ImageDecoder<'a> + ?Sized,
{
    let len = layout.len_usize()?;
    if dest.len() < len {
        return Err(DecodeError::InvalidArgument("destination buffer too small"));
    }

    let frame = decoder.decode_frame_config()?;
    if (frame.width, frame.height) != (layout.width, layout.height) {
        return Err(DecodeError::from_codec(
            decoder.format(),
            "first frame does not cover the image",
        ));
    }

    let pixels: &mut [BGRA<u8>] = bytemuck::try_cast_slice_mut(&mut dest[..len])
        .map_err(|_| DecodeError::InvalidArgument("destination cannot hold BGRA pixels"))?;
    let view = ImgRefMut::new(pixels, layout.width as usize, layout.height as usize);

    let ws_len = workspace_len(decoder.workbuf_len())?;
    limits.check_memory(u64::from(layout.len).saturating_add(ws_len as u64))?;
    let mut workspace = Workspace::allocate(ws_len)?;
    log::trace!("{}: workspace {} bytes", decoder.format(), workspace.len());
    let result = decoder.decode_frame(view, PixelBlend::Src, workspace.as_mut_slice());
    drop(workspace);
    result?;

    log::debug!(
        "decoded {} image w:{} h:{}",
        decoder.format(),
        layout.width,
        layout.height
    );
    Ok(FrameResult {
        width: layout.width,
        height: layout.height,
        stride_bytes: layout.stride_bytes,
        bytes_written: layout.len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;
    use crate::codecs::jpeg::tests::encode_jpeg;
    use crate::codecs::png::tests::encode_png;
    use crate::decoder::WorkbufRange;
    use crate::decoder::testing::ScriptedDecoder;

    fn rgb_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let pixels: Vec<u8> = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        encode_png(&pixels, width, height, png::ColorType::Rgb, png::BitDepth::Eight)
    }

    #[test]
    fn one_red_pixel() {
        let data = rgb_png(1, 1, [255, 0, 0]);
        let mut dest = [0u8; 4];
        let frame = decode_frame_into(&data, 0, None, &mut dest).unwrap();
        assert_eq!(
            frame,
            FrameResult {
                width: 1,
                height: 1,
                stride_bytes: 4,
                bytes_written: 4,
            }
        );
        assert_eq!(dest, [0, 0, 255, 255]);
    }

    #[test]
    fn undersized_destination_is_untouched() {
        let data = rgb_png(100, 100, [9, 9, 9]);
        let mut dest = vec![0xAA; 100 * 100 * 4 - 1];
        let err = decode_frame_into(&data, 0, None, &mut dest).unwrap_err();
        assert_eq!(err.status(), Status::InvalidArgument);
        assert!(dest.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn oversized_destination_tail_is_untouched() {
        let data = rgb_png(2, 1, [1, 2, 3]);
        let mut dest = [0xEEu8; 12];
        let frame = decode_frame_into(&data, 0, None, &mut dest).unwrap();
        assert_eq!(frame.bytes_written, 8);
        assert_eq!(&dest[..8], &[3, 2, 1, 255, 3, 2, 1, 255]);
        assert_eq!(&dest[8..], &[0xEE; 4]);
    }

    #[test]
    fn second_frame_is_not_implemented() {
        let data = rgb_png(1, 1, [0, 0, 0]);
        let mut dest = [0u8; 4];
        let err = decode_frame_into(&data, 1, None, &mut dest).unwrap_err();
        assert_eq!(err.status(), Status::NotImplemented);
    }

    #[test]
    fn frame_index_checked_before_format() {
        let mut dest = [0u8; 4];
        let err = decode_frame_into(b"garbage", 3, None, &mut dest).unwrap_err();
        assert_eq!(err.status(), Status::NotImplemented);
    }

    #[test]
    fn other_pixel_formats_are_not_implemented() {
        let data = rgb_png(1, 1, [0, 0, 0]);
        let mut dest = [0u8; 4];
        for format in [PixelFormat::RGBA_NONPREMUL, PixelFormat::BGRA_PREMUL, PixelFormat(7)] {
            let params = DecodeParams {
                pixel_format: Some(format),
                flags: 0,
            };
            let err = decode_frame_into(&data, 0, Some(&params), &mut dest).unwrap_err();
            assert_eq!(err.status(), Status::NotImplemented);
        }

        let params = DecodeParams {
            pixel_format: Some(PixelFormat::BGRA_NONPREMUL),
            flags: 0xFFFF,
        };
        assert!(decode_frame_into(&data, 0, Some(&params), &mut dest).is_ok());
    }

    #[test]
    fn raw_zero_is_default() {
        assert_eq!(PixelFormat::from_raw(0), None);
        assert_eq!(
            PixelFormat::from_raw(0x8100_8888),
            Some(PixelFormat::BGRA_NONPREMUL)
        );
        assert_eq!(PixelFormat::default(), PixelFormat::BGRA_NONPREMUL);
    }

    #[test]
    fn empty_input_is_invalid_argument() {
        let mut dest = [0u8; 4];
        let err = decode_frame_into(&[], 0, None, &mut dest).unwrap_err();
        assert_eq!(err.status(), Status::InvalidArgument);
    }

    #[test]
    fn unknown_format() {
        let mut dest = [0u8; 4];
        let err = decode_frame_into(b"hello world", 0, None, &mut dest).unwrap_err();
        assert_eq!(err.status(), Status::UnsupportedFormat);
    }

    #[test]
    fn max_dimensions_are_invalid_argument() {
        let mut decoder = ScriptedDecoder::new(0xFFFF_FFFF, 0xFFFF_FFFF);
        let err = decode_layout(&mut decoder, b"", &Limits::none()).unwrap_err();
        assert_eq!(err.status(), Status::InvalidArgument);
    }

    #[test]
    fn scripted_decode_fills_destination() {
        let mut decoder = ScriptedDecoder::new(2, 1);
        let layout = decode_layout(&mut decoder, b"", &Limits::none()).unwrap();
        let mut dest = [0u8; 8];
        let frame = decode_frame(&mut decoder, layout, &Limits::none(), &mut dest).unwrap();
        assert_eq!(frame.bytes_written, 8);
        assert_eq!(dest, [1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(decoder.workbuf_seen, Some(0));
    }

    #[test]
    fn workspace_uses_upper_bound_and_failure_propagates() {
        let mut decoder = ScriptedDecoder::new(2, 2);
        decoder.workbuf = WorkbufRange {
            min_incl: 8,
            max_incl: 32,
        };
        decoder.fail_frame = true;
        let layout = decode_layout(&mut decoder, b"", &Limits::none()).unwrap();
        let mut dest = [0u8; 16];
        let err = decode_frame(&mut decoder, layout, &Limits::none(), &mut dest).unwrap_err();
        assert_eq!(err.status(), Status::CodecError);
        assert_eq!(decoder.workbuf_seen, Some(32));
    }

    #[test]
    fn memory_limit_counts_workspace() {
        let mut decoder = ScriptedDecoder::new(2, 2);
        decoder.workbuf = WorkbufRange::exactly(100);
        let limits = Limits {
            max_memory_bytes: Some(64),
            ..Limits::default()
        };
        let layout = decode_layout(&mut decoder, b"", &limits).unwrap();
        let mut dest = [0u8; 16];
        let err = decode_frame(&mut decoder, layout, &limits, &mut dest).unwrap_err();
        assert!(matches!(err, DecodeError::LimitExceeded(_)));
        assert_eq!(decoder.workbuf_seen, None);
    }

    #[test]
    fn jpeg_decodes_to_requested_size() {
        let data = encode_jpeg(&[90; 24 * 10 * 3], 24, 10);
        let mut dest = vec![0u8; 24 * 10 * 4];
        let frame = decode_frame_into(&data, 0, None, &mut dest).unwrap();
        assert_eq!(frame.bytes_written, 24 * 10 * 4);
        assert_eq!(frame.stride_bytes, 96);
        assert!(dest.chunks_exact(4).all(|px| px[3] == 255));
    }

    /// Pixels that compress poorly, so every cut into the body loses rows.
    fn noisy_rgb(width: usize, height: usize) -> Vec<u8> {
        let mut state = 0x2545_F491u32;
        (0..width * height * 3)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect()
    }

    #[test]
    fn truncated_jpeg_body_is_codec_error() {
        let data = encode_jpeg(&noisy_rgb(64, 64), 64, 64);
        let mut dest = vec![0xAAu8; 64 * 64 * 4];
        decode_frame_into(&data, 0, None, &mut dest).unwrap();

        for cut in [data.len() - 2, data.len() * 3 / 4, data.len() / 2] {
            let mut dest = vec![0xAAu8; 64 * 64 * 4];
            let err = decode_frame_into(&data[..cut], 0, None, &mut dest).unwrap_err();
            assert_eq!(err.status(), Status::CodecError, "cut at {cut}");
            assert!(dest.iter().all(|&b| b == 0xAA), "cut at {cut}");
        }
    }

    #[test]
    fn truncated_png_image_data_is_codec_error() {
        let data = encode_png(
            &noisy_rgb(32, 32),
            32,
            32,
            png::ColorType::Rgb,
            png::BitDepth::Eight,
        );
        // signature and IHDR stay intact, IDAT is cut short
        for cut in [data.len() * 3 / 4, data.len() / 2] {
            assert!(cut > 33 + 8, "cut at {cut}");
            let mut dest = vec![0xAAu8; 32 * 32 * 4];
            let err = decode_frame_into(&data[..cut], 0, None, &mut dest).unwrap_err();
            assert_eq!(err.status(), Status::CodecError, "cut at {cut}");
            assert!(dest.iter().all(|&b| b == 0xAA), "cut at {cut}");
        }
    }

    #[test]
    fn repeated_decode_is_identical() {
        let data = encode_jpeg(&[10, 200, 30].repeat(8 * 8), 8, 8);
        let mut first = vec![0u8; 256];
        let mut second = vec![0u8; 256];
        let a = decode_frame_into(&data, 0, None, &mut first).unwrap();
        let b = decode_frame_into(&data, 0, None, &mut second).unwrap();
        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn owned_decode() {
        let data = rgb_png(3, 2, [0, 255, 0]);
        let image = DecodeRequest::new(&data).decode().unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.pixels.width(), 3);
        assert_eq!(image.as_bytes().len(), 24);
        assert!(
            image
                .pixels
                .as_ref()
                .pixels()
                .all(|px| px == BGRA { b: 0, g: 255, r: 0, a: 255 })
        );
    }

    #[test]
    fn request_limits_apply() {
        let data = rgb_png(16, 16, [0, 0, 0]);
        let limits = Limits {
            max_pixels: Some(100),
            ..Limits::default()
        };
        let err = DecodeRequest::new(&data)
            .with_limits(&limits)
            .decode()
            .unwrap_err();
        assert_eq!(err.status(), Status::InvalidArgument);
        assert!(DecodeRequest::new(&data).with_limits(&limits).probe().is_err());
    }

    #[test]
    fn failure_leaves_a_message() {
        let mut dest = [0u8; 4];
        let code = decode_frame_into(&[], 0, None, &mut dest).unwrap_err().code();
        let message = crate::error_message(code);
        assert!(!message.is_empty());
        assert_eq!(message, "invalid argument: empty input");
    }
}
