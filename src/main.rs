//! pixel-mosaic CLI - Convert photos into palette-matched pixel mosaics

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use pixel_mosaic::label::LabelPainter;
use pixel_mosaic::{Converter, MosaicError, Palette, TargetSize, UsageHistogram};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pixel-mosaic", version, about = "Convert photos into palette-matched pixel mosaics")]
struct Args {
    /// Input image file(s)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Grid size in blocks, e.g. 60x80 (swapped for landscape images)
    #[arg(short, long)]
    size: TargetSize,
    /// Output file (single input only)
    #[arg(short, long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,
    /// Directory for outputs, named <input>.mosaic.png (default: next to each input)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Palette JSON file (default: built-in table)
    #[arg(short, long)]
    palette: Option<PathBuf>,
    /// Print the color usage legend as JSON
    #[arg(short, long)]
    legend: bool,
    /// Draw each block's palette label
    #[arg(long, requires = "font")]
    labels: bool,
    /// TTF/OTF font for --labels
    #[arg(long)]
    font: Option<PathBuf>,
    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    /// Cross-argument checks clap's derive attributes cannot express.
    fn validate(&self) -> Result<(), clap::Error> {
        if self.output.is_some() && self.inputs.len() > 1 {
            return Err(Args::command().error(
                ErrorKind::ArgumentConflict,
                "--output takes a single input; use --out-dir for several",
            ));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Report {
    input: PathBuf,
    output: PathBuf,
    /// `None` when the image was passed through unchanged.
    factor: Option<u32>,
    legend: UsageHistogram,
}

fn main() -> Result<(), MosaicError> {
    let args = Args::parse();
    if let Err(e) = args.validate() {
        e.exit();
    }

    env_logger::Builder::new()
        .filter_level(args.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    let palette = match &args.palette {
        Some(path) => Palette::load(path)?,
        None => Palette::default(),
    };
    let painter = match (&args.font, args.labels) {
        (Some(font), true) => Some(LabelPainter::load(font)?),
        _ => None,
    };
    let converter = Converter::new(args.size).with_palette(palette);

    // Each conversion owns its histogram, so inputs can run side by side.
    let results: Vec<Result<Report, MosaicError>> = args
        .inputs
        .par_iter()
        .map(|input| {
            let output = output_path(input, args.output.as_deref(), args.out_dir.as_deref());
            convert_one(&converter, painter.as_ref(), input, output)
        })
        .collect();

    let mut first_err = None;
    for result in results {
        match result {
            Ok(report) => {
                if args.legend {
                    println!("{}", serde_json::to_string(&report)?);
                }
            }
            Err(e) => {
                log::error!("{e}");
                first_err.get_or_insert(e);
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn convert_one(
    converter: &Converter,
    painter: Option<&LabelPainter>,
    input: &Path,
    output: PathBuf,
) -> Result<Report, MosaicError> {
    let image = image::open(input)?;

    let Some(mut quantized) = converter.convert(&image)? else {
        log::warn!(
            "{}: {}x{} is too small for a {} grid, keeping the original",
            input.display(),
            image.width(),
            image.height(),
            converter.size()
        );
        image.save(&output)?;
        return Ok(Report { input: input.to_path_buf(), output, factor: None, legend: UsageHistogram::new() });
    };

    if let Some(painter) = painter {
        painter.paint(&mut quantized);
    }

    quantized.image.save(&output)?;
    log::info!(
        "{} -> {} ({} grid, {}px blocks, {} colors)",
        input.display(),
        output.display(),
        quantized.target,
        quantized.factor,
        quantized.histogram.len()
    );

    Ok(Report {
        input: input.to_path_buf(),
        output,
        factor: Some(quantized.factor),
        legend: quantized.histogram,
    })
}

fn output_path(input: &Path, output: Option<&Path>, out_dir: Option<&Path>) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    let name = format!("{stem}.mosaic.png");
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}
