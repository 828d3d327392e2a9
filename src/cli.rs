use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;
use tryon::TryOnMethod;

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Font file for the disclaimer (falls back to system fonts, then a built-in bitmap font)
    #[arg(long, env = "TRYON_FONT", global = true)]
    pub font: Option<PathBuf>,
    /// Filter used when resizing the garment cutout
    #[arg(long = "resample-filter", value_enum, default_value_t = ResampleFilter::Lanczos3, global = true)]
    pub resample_filter: ResampleFilter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Composite a garment onto a person photo and export the try-on JPEG
    Compose(ComposeCommand),
    /// Key the light background out of a garment photo and export a PNG cutout
    Cutout(CutoutCommand),
    /// Stamp the disclaimer onto an existing image
    Stamp(StampCommand),
}

/// Smooth resampling filters for resizing the garment cutout.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResampleFilter {
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Which stages a try-on may use.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MethodArg {
    Auto,
    Generative,
    Overlay,
}

impl From<MethodArg> for TryOnMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Auto => TryOnMethod::Auto,
            MethodArg::Generative => TryOnMethod::Generative,
            MethodArg::Overlay => TryOnMethod::Overlay,
        }
    }
}

#[derive(Args, Debug)]
pub struct ComposeCommand {
    /// Person photo path
    #[arg(long)]
    pub person: PathBuf,
    /// Garment photo path
    #[arg(long)]
    pub garment: PathBuf,
    /// Output JPEG path (defaults to `<person>-tryon.jpg`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Garment category (upper_body, lower_body, dress); inferred from the name when omitted
    #[arg(long)]
    pub category: Option<String>,
    /// Garment display name, used for category inference
    #[arg(long)]
    pub name: Option<String>,
    /// Fraction of the person height the garment should span (0-1]
    #[arg(long, value_parser = parse_coverage)]
    pub coverage: Option<f32>,
    /// Apply the per-category default coverage table when no coverage is given
    #[arg(long = "default-coverage")]
    pub default_coverage: bool,
    /// JSON file with body landmarks (torso_center_x, torso_center_y, shoulder_width_ratio)
    #[arg(long)]
    pub landmarks: Option<PathBuf>,
    /// Stage routing for this garment
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,
    /// Disable the overlay fallback
    #[arg(long = "no-fallback")]
    pub no_fallback: bool,
    /// Keep uniform margins around the garment instead of trimming them
    #[arg(long = "no-trim")]
    pub no_trim: bool,
    /// Garment catalog JSON; fields of the entry selected by --garment-id fill in the descriptor
    #[arg(long, requires = "garment_id")]
    pub catalog: Option<PathBuf>,
    /// Catalog entry id (with or without `.jpg`)
    #[arg(long = "garment-id", requires = "catalog")]
    pub garment_id: Option<String>,
    /// Disclaimer text (empty to disable)
    #[arg(long)]
    pub disclaimer: Option<String>,
    /// Brightness above which garment pixels are keyed out (0-255)
    #[arg(long = "light-threshold", default_value_t = tryon::config::DEFAULT_LIGHT_THRESHOLD)]
    pub light_threshold: u8,
    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,
}

#[derive(Args, Debug)]
pub struct CutoutCommand {
    /// Garment photo path
    pub input: PathBuf,
    /// Output PNG path (defaults to `<name>-cutout.png`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Crop uniform margins before keying
    #[arg(long)]
    pub trim: bool,
    /// Pad to this width/height ratio before keying (e.g. 0.75)
    #[arg(long = "pad-ratio")]
    pub pad_ratio: Option<f32>,
    /// Brightness above which pixels are keyed out (0-255)
    #[arg(long = "light-threshold", default_value_t = tryon::config::DEFAULT_LIGHT_THRESHOLD)]
    pub light_threshold: u8,
}

#[derive(Args, Debug)]
pub struct StampCommand {
    /// Image path
    pub input: PathBuf,
    /// Output path (defaults to `<name>-stamped.<ext>`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Text to stamp
    #[arg(long, default_value = tryon::config::DEFAULT_DISCLAIMER)]
    pub text: String,
}

fn parse_coverage(value: &str) -> Result<f32, String> {
    let ratio = value
        .parse::<f32>()
        .map_err(|_| format!("coverage must be a number in (0, 1], got `{value}`"))?;
    tryon::CoverageRatio::new(ratio)
        .map(tryon::CoverageRatio::get)
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn coverage_parser_bounds() {
        assert_eq!(parse_coverage("0.5"), Ok(0.5));
        assert!(parse_coverage("0").is_err());
        assert!(parse_coverage("1.2").is_err());
        assert!(parse_coverage("abc").is_err());
    }

    #[test]
    fn parses_compose_with_catalog() {
        let cli = Cli::try_parse_from([
            "tryon",
            "-vv",
            "compose",
            "--person",
            "me.jpg",
            "--garment",
            "shirt.jpg",
            "--catalog",
            "clothes.json",
            "--garment-id",
            "001",
        ])
        .unwrap();
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Commands::Compose(cmd) => {
                assert_eq!(cmd.garment_id.as_deref(), Some("001"));
                assert_eq!(cmd.quality, 90);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn nearest_filter_is_rejected() {
        let result = Cli::try_parse_from([
            "tryon",
            "--resample-filter",
            "nearest",
            "cutout",
            "shirt.jpg",
        ]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "tryon",
            "--resample-filter",
            "catmull-rom",
            "cutout",
            "shirt.jpg",
        ])
        .unwrap();
        assert_eq!(
            FilterType::from(cli.global.resample_filter),
            FilterType::CatmullRom
        );
    }

    #[test]
    fn catalog_requires_garment_id() {
        let result = Cli::try_parse_from([
            "tryon",
            "compose",
            "--person",
            "me.jpg",
            "--garment",
            "shirt.jpg",
            "--catalog",
            "clothes.json",
        ]);
        assert!(result.is_err());
    }
}
