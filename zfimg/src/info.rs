//! Image inspection: probe and display metadata without decoding.

use std::path::Path;

use serde::Serialize;

use crate::InfoArgs;

/// Run the `info` subcommand.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let multi = args.files.len() > 1;
    let mut failed = 0usize;

    for (i, path) in args.files.iter().enumerate() {
        if multi && !args.json {
            if i > 0 {
                println!();
            }
            println!("{}:", path.display());
        }

        match inspect_file(path) {
            Ok(info) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    print_info(&info);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("  error: {e:#}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} files could not be probed", args.files.len());
    }
    Ok(())
}

/// Probe a single file and return structured info.
fn inspect_file(path: &Path) -> anyhow::Result<ImageInfoDisplay> {
    let data = std::fs::read(path)?;
    let file_size = data.len() as u64;
    let info = zenframe::probe(&data)?;
    log::debug!("probed {}: {info:?}", path.display());

    Ok(ImageInfoDisplay {
        path: path.display().to_string(),
        format: info.format.name().to_string(),
        mime_type: info.format.mime_type().to_string(),
        width: info.width,
        height: info.height,
        frame_count: info.frame_count,
        bytes_per_pixel: info.bytes_per_pixel,
        stride_bytes: info.stride_bytes,
        file_size,
    })
}

#[derive(Debug, Serialize)]
struct ImageInfoDisplay {
    path: String,
    format: String,
    mime_type: String,
    width: u32,
    height: u32,
    frame_count: u32,
    bytes_per_pixel: u32,
    stride_bytes: u32,
    file_size: u64,
}

fn print_info(info: &ImageInfoDisplay) {
    println!("  Format:       {} ({})", info.format, info.mime_type);
    println!("  Dimensions:   {}x{}", info.width, info.height);
    println!("  Frames:       {}", info.frame_count);
    println!(
        "  Output:       BGRA8, {} bytes/pixel, stride {}",
        info.bytes_per_pixel, info.stride_bytes
    );
    println!("  File size:    {}", crate::format_size(info.file_size));
}
