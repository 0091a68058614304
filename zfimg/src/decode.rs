//! First-frame decode to a file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, bail};
use zenframe::{DecodeRequest, DecodedImage, Limits};

use crate::DecodeArgs;

/// Output encodings selected by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputKind {
    Png,
    RawBgra,
}

impl OutputKind {
    fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => Ok(OutputKind::Png),
            Some("bgra" | "raw") => Ok(OutputKind::RawBgra),
            _ => bail!(
                "cannot infer output format from {}: use .png or .bgra",
                path.display()
            ),
        }
    }
}

/// Run the `decode` subcommand.
pub fn run(args: DecodeArgs) -> anyhow::Result<()> {
    let kind = OutputKind::from_path(&args.output)?;
    if args.output.exists() && !args.force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            args.output.display()
        );
    }

    let data =
        std::fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let limits = Limits {
        max_width: args.max_width,
        max_height: args.max_height,
        ..Limits::default()
    };
    let image = DecodeRequest::new(&data)
        .with_frame_index(args.frame)
        .with_limits(&limits)
        .decode()
        .with_context(|| format!("decoding {}", args.file.display()))?;

    match kind {
        OutputKind::Png => write_png(&args.output, &image)?,
        OutputKind::RawBgra => std::fs::write(&args.output, image.as_bytes())
            .with_context(|| format!("writing {}", args.output.display()))?,
    }

    eprintln!(
        "{} {}x{} -> {} ({})",
        image.format,
        image.width(),
        image.height(),
        args.output.display(),
        crate::format_size(u64::from(image.frame.bytes_written)),
    );
    Ok(())
}

fn write_png(path: &Path, image: &DecodedImage) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let rgba: Vec<u8> = image
        .pixels
        .as_ref()
        .pixels()
        .flat_map(|px| [px.r, px.g, px.b, px.a])
        .collect();

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;
    writer.finish()?;
    Ok(())
}
