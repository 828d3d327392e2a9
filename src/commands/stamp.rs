use tryon::codec::encode_jpeg;
use tryon::{DisclaimerStamper, ImageRole, TryOnError, TryOnResult};

use crate::cli::{GlobalOptions, StampCommand};

use super::utils::{derive_variant_path, extension_or, stamp_options};

/// Run the stamp command.
pub fn run(global: &GlobalOptions, cmd: StampCommand) -> TryOnResult<()> {
    let output_path = cmd.output.clone().unwrap_or_else(|| {
        let extension = extension_or(&cmd.input, "png");
        derive_variant_path(&cmd.input, "stamped", &extension)
    });

    let image = image::open(&cmd.input).map_err(|source| TryOnError::Decode {
        role: ImageRole::Generated,
        source,
    })?;

    let stamper = DisclaimerStamper::new(stamp_options(global, Some(&cmd.text)));
    if !stamper.has_font() {
        tracing::info!("no font found, using built-in bitmap font");
    }
    let stamped = stamper.stamp(image.to_rgb8(), &cmd.text);

    match extension_or(&output_path, "png").as_str() {
        "jpg" | "jpeg" => std::fs::write(&output_path, encode_jpeg(&stamped, 90)?)?,
        _ => stamped.save(&output_path)?,
    }
    println!("Stamped image saved to {}", output_path.display());
    Ok(())
}
