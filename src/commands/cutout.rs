use image::DynamicImage;
use tryon::keyer::remove_light_background_with;
use tryon::{ImageRole, TryOnError, TryOnResult, pad_to_aspect_ratio, trim_uniform_border};

use crate::cli::{CutoutCommand, GlobalOptions};

use super::utils::derive_variant_path;

/// Run the cutout command.
pub fn run(_global: &GlobalOptions, cmd: CutoutCommand) -> TryOnResult<()> {
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_variant_path(&cmd.input, "cutout", "png"));

    let image = image::open(&cmd.input).map_err(|source| TryOnError::Decode {
        role: ImageRole::Garment,
        source,
    })?;

    let mut rgb = image.to_rgb8();
    if cmd.trim {
        rgb = trim_uniform_border(&rgb);
    }
    if let Some(ratio) = cmd.pad_ratio {
        rgb = pad_to_aspect_ratio(&rgb, ratio);
    }

    let cutout = remove_light_background_with(&DynamicImage::ImageRgb8(rgb), cmd.light_threshold);
    cutout.save(&output_path)?;
    println!("Garment cutout PNG saved to {}", output_path.display());
    Ok(())
}
