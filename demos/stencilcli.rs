#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{fmt::Display, path::PathBuf};

use clap::{Parser, ValueEnum};
use stencille::{PaletteSize, PixelBuffer, SmoothingKind, StencilPipeline};

#[derive(Copy, Clone, ValueEnum)]
enum CliSmoothing {
    Gaussian,
    Bilateral,
}

impl From<CliSmoothing> for SmoothingKind {
    fn from(value: CliSmoothing) -> Self {
        match value {
            CliSmoothing::Gaussian => SmoothingKind::Gaussian,
            CliSmoothing::Bilateral => SmoothingKind::Bilateral,
        }
    }
}

impl Display for CliSmoothing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CliSmoothing::Gaussian => "gaussian",
                CliSmoothing::Bilateral => "bilateral",
            }
        )
    }
}

#[derive(Parser)]
pub struct Options {
    #[arg(short, long, default_value_t = PaletteSize::default(), value_parser = parse_palette_size)]
    k: PaletteSize,

    #[arg(long, default_value_t = CliSmoothing::Gaussian)]
    smoothing: CliSmoothing,

    #[arg(long, default_value_t = 2)]
    radius: u32,

    #[arg(long, default_value_t = 100)]
    min_area: u32,

    #[arg(long, default_value_t = 3.0)]
    min_thickness: f64,

    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    #[arg(long)]
    verbose: bool,

    input: PathBuf,

    recolored: PathBuf,

    outline: PathBuf,
}

fn parse_palette_size(s: &str) -> Result<PaletteSize, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn main() {
    env_logger::init();

    let Options {
        k,
        smoothing,
        radius,
        min_area,
        min_thickness,
        threads,
        verbose,
        input,
        recolored,
        outline,
    } = Options::parse();

    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = log!("read image", image::open(input).unwrap().into_rgba8());
    let buffer = PixelBuffer::try_from(image).unwrap();

    let mut pipeline = StencilPipeline::new(&buffer);
    pipeline
        .palette_size(k)
        .smoothing(smoothing.into())
        .smoothing_radius(radius)
        .min_region_area(min_area)
        .min_region_thickness(min_thickness);

    let output = log!(
        "template generation",
        match threads {
            0 => pipeline.process_par(),
            1 => pipeline.process(),
            t => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(t.into())
                    .build()
                    .unwrap();

                pool.install(|| pipeline.process_par())
            }
        }
    );

    for (i, color) in output.palette.iter().enumerate() {
        println!("{}: #{color:x}", i + 1);
    }
    if verbose {
        println!(
            "{} regions to paint after {} merge passes",
            output.labels.len(),
            output.merge.passes
        );
    }

    log!(
        "write recolored image",
        output.recolored.to_rgba_image().save(recolored).unwrap()
    );
    log!(
        "write outline image",
        output.outline.to_rgba_image().save(outline).unwrap()
    );
}
