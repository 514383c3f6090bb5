//! Command-line entry point

use crate::config::{load_config, FeatConfig, LogLevel};
use crate::logging;
use crate::pipeline::ExtractionPipeline;
use clap::error::ErrorKind;
use clap::Parser;
use sift3d_io::{DescriptorCsvWriter, ImageVolumeReader, KeypointCsvOptions};
use std::ffi::OsString;
use std::path::PathBuf;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// featsift3d command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "featsift3d",
    version,
    about = "Extract SIFT3D descriptors at keypoints listed in a CSV file",
    after_help = "Note: keypoints_path should be a CSV file with x,y,z coordinates"
)]
pub struct CliArgs {
    /// Image to sample: a 2D image file or a directory of slices.
    #[arg(value_name = "IMAGE_PATH")]
    pub image_path: PathBuf,
    /// CSV file with one x,y,z keypoint per line.
    #[arg(value_name = "KEYPOINTS_PATH")]
    pub keypoints_path: PathBuf,
    /// Descriptor file to write.
    #[arg(value_name = "OUTPUT_DESCRIPTORS_PATH")]
    pub output_path: PathBuf,
    /// Path to TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Ignore blank lines in the keypoint file instead of reading them as (0, 0, 0).
    #[arg(long)]
    pub skip_blank_lines: bool,
    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

/// Parse arguments, or return the exit code when parsing ends the program.
///
/// Usage errors print to stderr and give [`EXIT_FAILURE`]; `--help` and
/// `--version` print to stdout and give [`EXIT_SUCCESS`].
pub fn parse_args<I, T>(args: I) -> Result<CliArgs, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CliArgs::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
            _ => EXIT_FAILURE,
        }
    })
}

/// Run the extraction described by already-parsed arguments
pub fn execute(args: &CliArgs, config: &FeatConfig) -> u8 {
    let keypoint_options = if args.skip_blank_lines {
        KeypointCsvOptions::skip_blank_lines()
    } else {
        config.keypoints
    };

    let pipeline = ExtractionPipeline::new(
        ImageVolumeReader::new().with_units(config.image.units()),
        config.extractor,
        DescriptorCsvWriter::new(config.output),
    )
    .with_keypoint_options(keypoint_options);

    match pipeline.run(&args.image_path, &args.keypoints_path, &args.output_path) {
        Ok(()) => {
            println!(
                "Successfully extracted and wrote descriptors to: {}",
                args.output_path.display()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            EXIT_FAILURE
        }
    }
}

/// Full command-line flow: arguments, configuration, logging, extraction
pub fn run<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match parse_args(args) {
        Ok(args) => args,
        Err(code) => return code,
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_FAILURE;
        }
    };

    let filter = logging::resolve_filter(
        args.log_level.map(LogLevel::as_str),
        config.log_level.map(LogLevel::as_str),
    );
    if let Err(e) = logging::init_logging(&filter) {
        eprintln!("Failed to initialize logger: {:#}", e);
    }

    execute(&args, &config)
}
