use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use snowgeo::core::registry::known_codes;
use snowgeo::core::{default_output_path, run_batch, BatchJob, Milestone, Progress, Resampling};
use snowgeo::io::Compression;
use snowgeo::{products, Geocoder, GeocodeOptions, TargetCrs};
use std::path::PathBuf;
use std::process::ExitCode;

/// Geocode H-SAF snow products into GeoTIFF
#[derive(Parser, Debug)]
#[command(name = "snowgeo", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Geocode a single product file
    Geocode {
        /// Product file. H10 and H34 expect HDF5, the others GRIB2
        #[arg(short, long)]
        input_file: PathBuf,

        /// GeoTIFF file to create
        #[arg(short, long)]
        output_file: PathBuf,

        /// Product code (H10, H11, H12, H13, H34, H35)
        #[arg(short, long)]
        product: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Geocode many files of one product, continuing past failures
    Batch {
        /// Product code shared by every input
        #[arg(short, long)]
        product: String,

        /// Directory receiving `<stem>_projected.tif` outputs
        #[arg(short = 'd', long)]
        output_dir: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Product files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// List supported products
    Products {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output CRS: 4326 (default) or GEOS to keep the product projection
    #[arg(long, default_value = "4326", value_parser = parse_crs)]
    crs: TargetCrs,

    #[arg(long, value_enum, default_value_t = CompressionArg::Lzw)]
    compression: CompressionArg,

    /// Warp resampling kernel
    #[arg(long, value_enum, default_value_t = ResamplingArg::Nearest)]
    resampling: ResamplingArg,

    /// Directory for intermediate files (default: system temp dir)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

impl OutputArgs {
    fn options(&self) -> GeocodeOptions {
        GeocodeOptions {
            target_crs: self.crs,
            compression: self.compression.into(),
            resampling: self.resampling.into(),
            scratch_dir: self.scratch_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompressionArg {
    Lzw,
    Deflate,
    None,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Lzw => Compression::Lzw,
            CompressionArg::Deflate => Compression::Deflate,
            CompressionArg::None => Compression::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ResamplingArg {
    Nearest,
    Bilinear,
    Cubic,
    Mode,
}

impl From<ResamplingArg> for Resampling {
    fn from(arg: ResamplingArg) -> Self {
        match arg {
            ResamplingArg::Nearest => Resampling::Nearest,
            ResamplingArg::Bilinear => Resampling::Bilinear,
            ResamplingArg::Cubic => Resampling::Cubic,
            ResamplingArg::Mode => Resampling::Mode,
        }
    }
}

fn parse_crs(value: &str) -> Result<TargetCrs, String> {
    value.parse::<TargetCrs>().map_err(|e| e.to_string())
}

/// Three-step bar fed by pipeline milestones
struct BarProgress(ProgressBar);

impl BarProgress {
    fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(Milestone::COUNT)
        };
        bar.set_style(bar_style("{msg:>10} [{bar:40}] {pos}/{len}"));
        bar.set_message("projecting");
        Self(bar)
    }
}

impl Progress for BarProgress {
    fn milestone(&self, milestone: Milestone) {
        self.0.set_message(milestone.label());
        self.0.inc(1);
    }
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Geocode {
            input_file,
            output_file,
            product,
            output,
        } => {
            let options = output.options();
            let mut geocoder = Geocoder::with_gdal(&options);
            let progress = BarProgress::new(cli.quiet);

            let result = geocoder.project(
                &product,
                &input_file,
                &output_file,
                options.target_crs,
                &progress,
            );
            progress.0.finish_and_clear();

            let written = result.with_context(|| {
                format!("An error occurred during geocoding of {}", input_file.display())
            })?;
            println!("{} is created", written.display());
            println!("Geocoding complete.");
            Ok(())
        }
        Command::Batch {
            product,
            output_dir,
            output,
            inputs,
        } => {
            if !output_dir.is_dir() {
                bail!("Output directory {} does not exist", output_dir.display());
            }

            let options = output.options();
            let jobs: Vec<BatchJob> = inputs
                .iter()
                .map(|input| BatchJob {
                    product: product.clone(),
                    input: input.clone(),
                    output: default_output_path(input, &output_dir),
                })
                .collect();

            let bar = if cli.quiet {
                ProgressBar::hidden()
            } else {
                ProgressBar::new(jobs.len() as u64)
            };
            bar.set_style(bar_style("[{bar:40}] {pos}/{len} files"));

            let mut geocoder = Geocoder::with_gdal(&options);
            let report = run_batch(&mut geocoder, &jobs, options.target_crs, |_| bar.inc(1));
            bar.finish_and_clear();

            for path in &report.succeeded {
                println!("{} is created", path.display());
            }
            for (input, e) in &report.failed {
                eprintln!("{}: {}", input.display(), e);
            }
            if !report.all_succeeded() {
                bail!(
                    "{} of {} files failed",
                    report.failed.len(),
                    report.total()
                );
            }
            Ok(())
        }
        Command::Products { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(products())?);
                return Ok(());
            }

            println!(
                "{:<5} {:<6} {:<8} {:>12} {:<6} {:<5} {}",
                "CODE", "FORMAT", "PROJ", "SHAPE", "VAR", "FLIP", "DESCRIPTION"
            );
            for product in products() {
                println!(
                    "{:<5} {:<6} {:<8} {:>12} {:<6} {:<5} {}",
                    product.code,
                    product.data_format.to_string(),
                    product.source_projection.to_string(),
                    format!("{}x{}", product.rows(), product.cols()),
                    product.variable_key,
                    product.requires_vertical_flip,
                    product.description
                );
            }
            println!("Known codes: {}", known_codes());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
