// ============================================================================
// Retouch Studio CLI — headless crop / resize / format conversion
// ============================================================================
//
// Usage examples:
//   retouch-studio --input photo.png --crop 120,80,640,480 --output out.png
//   retouch-studio -i photo.jpg --resize 1024x768 -o small.webp
//   retouch-studio -i photo.png -o photo.jpg --quality 85
//
// No GUI is opened in CLI mode. Everything runs synchronously on the
// current thread using the same crop and resampling modules as the editor.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;

use crate::io::{encode_and_write, load_image_sync, SaveFormat};
use crate::ops::crop::crop_exact;
use crate::ops::intake::{conform_to_output, OutputSize};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Retouch Studio headless image processor.
///
/// Crop, resize, and convert images without opening the GUI.
#[derive(Parser, Debug)]
#[command(
    name = "retouch-studio",
    about = "Retouch Studio headless crop/resize/convert",
    long_about = "Crop, resize, and convert image files without opening the GUI.\n\
                  Supports PNG, JPEG, WebP, and BMP input; PNG, JPEG, and WebP output.\n\n\
                  Example:\n  \
                  retouch-studio --input photo.png --crop 120,80,640,480 --output out.png"
)]
pub struct CliArgs {
    /// Input image file.
    #[arg(short, long, required = true, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file path. Defaults to the input stem with the target
    /// format's extension.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Crop rectangle in native pixels: `x,y,width,height`. Applied before
    /// --resize.
    #[arg(long, value_name = "X,Y,W,H")]
    pub crop: Option<String>,

    /// Target dimensions, e.g. `1024x768`.
    #[arg(long, value_name = "WxH")]
    pub resize: Option<String>,

    /// Output format: png, jpeg, webp. When omitted, inferred from
    /// --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Print timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// True when a CLI-mode flag is present in the process arguments. Used
    /// by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the headless pipeline and return an OS exit code.
/// `0` = success, `1` = failure.
pub fn run(args: CliArgs) -> i32 {
    let start = Instant::now();
    match run_one(&args) {
        Ok(output_path) => {
            if args.verbose {
                println!(
                    "{} → {} ({:.0}ms)",
                    args.input.display(),
                    output_path.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

fn run_one(args: &CliArgs) -> Result<PathBuf, String> {
    let mut img = load_image_sync(&args.input)?;

    if let Some(spec) = &args.crop {
        let (x, y, w, h) = parse_crop(spec)?;
        img = crop_exact(&img, x, y, w, h).map_err(|e| e.to_string())?;
    }

    if let Some(spec) = &args.resize {
        let size = parse_size(spec)?;
        img = conform_to_output(img, size);
    }

    let format = resolve_format(args.format.as_deref(), args.output.as_deref())?;
    let output_path = match &args.output {
        Some(p) => p.clone(),
        None => args.input.with_extension(format.extension()),
    };

    encode_and_write(&img, &output_path, format, args.quality)?;
    Ok(output_path)
}

// ============================================================================
// Argument parsing helpers
// ============================================================================

fn parse_crop(spec: &str) -> Result<(u32, u32, u32, u32), String> {
    let parts: Vec<u32> = spec
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("invalid --crop '{}': expected x,y,w,h", spec))?;
    match parts.as_slice() {
        [x, y, w, h] => Ok((*x, *y, *w, *h)),
        _ => Err(format!("invalid --crop '{}': expected four values", spec)),
    }
}

fn parse_size(spec: &str) -> Result<OutputSize, String> {
    let (w, h) = spec
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid --resize '{}': expected WxH", spec))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h))?;
    OutputSize::new(width, height)
        .ok_or_else(|| "resize dimensions must be positive".to_string())
}

fn resolve_format(flag: Option<&str>, output: Option<&Path>) -> Result<SaveFormat, String> {
    if let Some(name) = flag {
        return SaveFormat::from_name(name)
            .ok_or_else(|| format!("unsupported format '{}' (png, jpeg, webp)", name));
    }
    Ok(output
        .and_then(SaveFormat::from_path)
        .unwrap_or(SaveFormat::Png))
}
