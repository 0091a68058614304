//! Native decoder output to BGRA8 (non-premultiplied) conversion.

use imgref::ImgRefMut;
use rgb::alt::BGRA;

use crate::{DecodeError, ImageFormat};

/// 8-bit interleaved layouts a wrapped codec can hand back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SourceLayout {
    Gray8,
    GrayAlpha8,
    Rgb8,
    Rgba8,
    Bgr8,
    Bgra8,
}

impl SourceLayout {
    pub(crate) fn channels(self) -> usize {
        match self {
            SourceLayout::Gray8 => 1,
            SourceLayout::GrayAlpha8 => 2,
            SourceLayout::Rgb8 | SourceLayout::Bgr8 => 3,
            SourceLayout::Rgba8 | SourceLayout::Bgra8 => 4,
        }
    }
}

/// Write `src`, laid out as rows of `src_stride` bytes, into `dst`.
///
/// Every destination pixel is overwritten. Opaque sources get `a = 255`.
pub(crate) fn write_bgra8(
    format: ImageFormat,
    src: &[u8],
    src_stride: usize,
    layout: SourceLayout,
    mut dst: ImgRefMut<'_, BGRA<u8>>,
) -> Result<(), DecodeError> {
    let width = dst.width();
    let height = dst.height();
    let row_len = width
        .checked_mul(layout.channels())
        .filter(|&len| len <= src_stride)
        .ok_or_else(|| DecodeError::from_codec(format, "decoded row shorter than image width"))?;
    let needed = src_stride
        .checked_mul(height.saturating_sub(1))
        .and_then(|n| n.checked_add(row_len))
        .ok_or_else(|| DecodeError::from_codec(format, "decoded image too large"))?;
    if src.len() < needed {
        return Err(DecodeError::from_codec(
            format,
            "decoder produced fewer bytes than the image needs",
        ));
    }

    for (src_row, dst_row) in src.chunks(src_stride).zip(dst.rows_mut()) {
        convert_row(&src_row[..row_len], layout, dst_row);
    }
    Ok(())
}

fn convert_row(src: &[u8], layout: SourceLayout, dst: &mut [BGRA<u8>]) {
    let px = src.chunks_exact(layout.channels()).zip(dst.iter_mut());
    match layout {
        SourceLayout::Gray8 => {
            for (s, d) in px {
                *d = BGRA {
                    b: s[0],
                    g: s[0],
                    r: s[0],
                    a: 255,
                };
            }
        }
        SourceLayout::GrayAlpha8 => {
            for (s, d) in px {
                *d = BGRA {
                    b: s[0],
                    g: s[0],
                    r: s[0],
                    a: s[1],
                };
            }
        }
        SourceLayout::Rgb8 => {
            for (s, d) in px {
                *d = BGRA {
                    b: s[2],
                    g: s[1],
                    r: s[0],
                    a: 255,
                };
            }
        }
        SourceLayout::Rgba8 => {
            for (s, d) in px {
                *d = BGRA {
                    b: s[2],
                    g: s[1],
                    r: s[0],
                    a: s[3],
                };
            }
        }
        SourceLayout::Bgr8 => {
            for (s, d) in px {
                *d = BGRA {
                    b: s[0],
                    g: s[1],
                    r: s[2],
                    a: 255,
                };
            }
        }
        SourceLayout::Bgra8 => {
            let src: &[BGRA<u8>] = bytemuck::cast_slice(src);
            dst[..src.len()].copy_from_slice(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::ImgVec;

    fn blank(width: usize, height: usize) -> ImgVec<BGRA<u8>> {
        ImgVec::new(vec![BGRA::default(); width * height], width, height)
    }

    #[test]
    fn rgb_to_bgra() {
        let mut out = blank(2, 1);
        write_bgra8(
            ImageFormat::Png,
            &[255, 0, 0, 0, 128, 255],
            6,
            SourceLayout::Rgb8,
            out.as_mut(),
        )
        .unwrap();
        assert_eq!(
            out.buf(),
            &[
                BGRA {
                    b: 0,
                    g: 0,
                    r: 255,
                    a: 255
                },
                BGRA {
                    b: 255,
                    g: 128,
                    r: 0,
                    a: 255
                },
            ]
        );
    }

    #[test]
    fn gray_alpha_keeps_alpha() {
        let mut out = blank(1, 1);
        write_bgra8(
            ImageFormat::Png,
            &[77, 9],
            2,
            SourceLayout::GrayAlpha8,
            out.as_mut(),
        )
        .unwrap();
        assert_eq!(
            out.buf()[0],
            BGRA {
                b: 77,
                g: 77,
                r: 77,
                a: 9
            }
        );
    }

    #[test]
    fn padded_source_rows() {
        // 1x2 gray with 3 bytes of padding per row
        let src = [10, 0, 0, 0, 20, 0, 0, 0];
        let mut out = blank(1, 2);
        write_bgra8(ImageFormat::Jpeg, &src, 4, SourceLayout::Gray8, out.as_mut()).unwrap();
        assert_eq!(out.buf()[0].r, 10);
        assert_eq!(out.buf()[1].r, 20);
    }

    #[test]
    fn last_row_may_omit_padding() {
        let src = [1, 2, 3, 4, 0, 0, 5, 6, 7, 8];
        let mut out = blank(1, 2);
        write_bgra8(ImageFormat::Png, &src, 6, SourceLayout::Rgba8, out.as_mut()).unwrap();
        assert_eq!(
            out.buf()[1],
            BGRA {
                b: 7,
                g: 6,
                r: 5,
                a: 8
            }
        );
    }

    #[test]
    fn short_source_is_codec_error() {
        let mut out = blank(2, 2);
        let err = write_bgra8(ImageFormat::Png, &[0; 11], 6, SourceLayout::Rgb8, out.as_mut())
            .unwrap_err();
        assert!(matches!(err, DecodeError::Codec { .. }));
    }

    #[test]
    fn stride_narrower_than_row_is_codec_error() {
        let mut out = blank(2, 1);
        let result = write_bgra8(ImageFormat::Png, &[0; 8], 5, SourceLayout::Rgb8, out.as_mut());
        assert!(result.is_err());
    }

    #[test]
    fn bgra_is_copied() {
        let mut out = blank(1, 1);
        write_bgra8(
            ImageFormat::Jpeg,
            &[1, 2, 3, 4],
            4,
            SourceLayout::Bgra8,
            out.as_mut(),
        )
        .unwrap();
        assert_eq!(
            out.buf()[0],
            BGRA {
                b: 1,
                g: 2,
                r: 3,
                a: 4
            }
        );
    }
}
