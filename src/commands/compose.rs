use std::fs;

use tryon::{
    ComposeOptions, CoverageRatio, CoverageTable, GarmentCatalog, GarmentCategory,
    GarmentDescriptor, GarmentPrep, PipelineConfig, StaticOracle, TryOnPipeline, TryOnRequest,
    TryOnResult,
};

use crate::cli::{ComposeCommand, GlobalOptions};

use super::utils::{derive_variant_path, read_landmarks, stamp_options};

/// Run the compose command.
pub fn run(global: &GlobalOptions, cmd: ComposeCommand) -> TryOnResult<()> {
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_variant_path(&cmd.person, "tryon", "jpg"));

    let config = PipelineConfig::default()
        .with_fallback(!cmd.no_fallback)
        .with_compose_options(ComposeOptions {
            resize_filter: global.resample_filter.into(),
            light_threshold: cmd.light_threshold,
            ..ComposeOptions::default()
        })
        .with_garment_prep(GarmentPrep {
            trim_border: !cmd.no_trim,
            ..GarmentPrep::default()
        })
        .with_default_coverage(cmd.default_coverage.then(CoverageTable::default))
        .with_stamp_options(stamp_options(global, cmd.disclaimer.as_deref()))
        .with_jpeg_quality(cmd.quality);

    let mut pipeline = TryOnPipeline::new(config);
    if let Some(path) = &cmd.landmarks {
        let landmarks = read_landmarks(path)?;
        pipeline = pipeline.with_oracle(Box::new(StaticOracle::new(landmarks)));
    }

    let descriptor = build_descriptor(&pipeline, &cmd)?;
    tracing::debug!(?descriptor, "garment descriptor");

    let person = fs::read(&cmd.person)?;
    let garment = fs::read(&cmd.garment)?;
    let bytes = pipeline.run(&TryOnRequest::new(&person, &garment, &descriptor))?;

    fs::write(&output_path, bytes)?;
    println!("Try-on JPEG saved to {}", output_path.display());
    Ok(())
}

/// Catalog entry first, then explicit flags on top.
fn build_descriptor(
    pipeline: &TryOnPipeline,
    cmd: &ComposeCommand,
) -> TryOnResult<GarmentDescriptor> {
    let keywords = &pipeline.config().category_keywords;

    let mut descriptor = match (&cmd.catalog, &cmd.garment_id) {
        (Some(path), Some(id)) => {
            let catalog = GarmentCatalog::from_path(path)?;
            pipeline.describe(catalog.get(id)?)
        }
        _ => {
            let name = cmd.name.clone().unwrap_or_else(|| {
                cmd.garment
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let category = GarmentCategory::resolve(cmd.category.as_deref(), &name, keywords);
            GarmentDescriptor::new(name, category)
        }
    };

    if let Some(raw) = cmd.category.as_deref() {
        match GarmentCategory::parse(raw) {
            Some(category) => descriptor.category = category,
            None => tracing::warn!(
                category = raw,
                "unknown category, keeping {:?}",
                descriptor.category
            ),
        }
    }
    if let Some(ratio) = cmd.coverage {
        descriptor.coverage = Some(CoverageRatio::new(ratio)?);
    }
    if let Some(method) = cmd.method {
        descriptor.method = method.into();
    }
    Ok(descriptor)
}
