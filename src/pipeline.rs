//! Stage sequencing: generative attempt, overlay fallback, post-processing.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::catalog::GarmentRecord;
use crate::codec::{decode, encode_jpeg};
use crate::compositor::compose;
use crate::config::PipelineConfig;
use crate::error::ImageRole;
use crate::garment::{GarmentDescriptor, TryOnMethod};
use crate::generative::{GenerationRequest, TryOnGenerator};
use crate::geometry::{pad_to_aspect_ratio, trim_uniform_border};
use crate::landmarks::{LandmarkOracle, locate_or_default};
use crate::stamp::DisclaimerStamper;
use crate::{TryOnError, TryOnResult};

/// Filter used to bring a result back to the person photo's size.
const RESULT_FILTER: FilterType = FilterType::Lanczos3;

/// Encoded inputs for a single try-on.
#[derive(Debug, Clone, Copy)]
pub struct TryOnRequest<'a> {
    pub person: &'a [u8],
    pub garment: &'a [u8],
    pub descriptor: &'a GarmentDescriptor,
}

impl<'a> TryOnRequest<'a> {
    pub fn new(person: &'a [u8], garment: &'a [u8], descriptor: &'a GarmentDescriptor) -> Self {
        Self {
            person,
            garment,
            descriptor,
        }
    }
}

/// Produces a try-on JPEG from a person photo and a garment photo.
///
/// Holds no per-request state, so one pipeline can serve concurrent requests.
pub struct TryOnPipeline {
    config: PipelineConfig,
    generator: Option<Box<dyn TryOnGenerator>>,
    oracle: Option<Box<dyn LandmarkOracle>>,
    stamper: DisclaimerStamper,
}

impl TryOnPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let stamper = DisclaimerStamper::new(config.stamp.clone());
        Self {
            config,
            generator: None,
            oracle: None,
            stamper,
        }
    }

    /// Attach a generative try-on service.
    pub fn with_generator(mut self, generator: Box<dyn TryOnGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Attach a landmark oracle. Without one the compositor uses default landmarks.
    pub fn with_oracle(mut self, oracle: Box<dyn LandmarkOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Descriptor for a catalog entry using this pipeline's keyword table.
    pub fn describe(&self, record: &GarmentRecord) -> GarmentDescriptor {
        record.descriptor(&self.config.category_keywords)
    }

    /// Run every enabled stage and return the final JPEG bytes.
    ///
    /// Decode errors are returned immediately. When neither the generative
    /// stage nor the fallback produces an image the error is
    /// [`TryOnError::GenerationFailed`]; the person photo is never echoed back.
    pub fn run(&self, request: &TryOnRequest<'_>) -> TryOnResult<Vec<u8>> {
        let person = decode(request.person, ImageRole::Person)?;
        let garment = decode(request.garment, ImageRole::Garment)?;
        let descriptor = request.descriptor;

        tracing::info!(
            garment = %descriptor.name,
            category = descriptor.category.service_label(),
            method = ?descriptor.method,
            "starting try-on"
        );

        let mut result = None;
        if descriptor.method.allows_generative() {
            result = self.generate(request.person, &garment, descriptor);
        }

        if result.is_none() && descriptor.method.allows_overlay() {
            if self.config.fallback_enabled {
                tracing::info!("composing overlay fallback");
                result = Some(self.compose_fallback(
                    request.person,
                    &person,
                    &garment,
                    descriptor,
                ));
            } else {
                tracing::info!("overlay fallback disabled");
            }
        }

        let Some(image) = result else {
            return Err(TryOnError::GenerationFailed {
                reason: self.failure_reason(descriptor.method),
            });
        };

        let finished = self.post_process(image, (person.width(), person.height()));
        encode_jpeg(&finished, self.config.jpeg_quality)
    }

    fn generate(
        &self,
        person_bytes: &[u8],
        garment: &DynamicImage,
        descriptor: &GarmentDescriptor,
    ) -> Option<RgbImage> {
        let Some(generator) = self.generator.as_deref() else {
            tracing::debug!("no generative service configured");
            return None;
        };

        let padded = pad_to_aspect_ratio(
            &garment.to_rgb8(),
            self.config.garment_prep.generative_aspect_ratio,
        );
        let garment_bytes = match encode_jpeg(&padded, self.config.jpeg_quality) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "could not encode garment for generation");
                return None;
            }
        };

        let request = GenerationRequest {
            person: person_bytes,
            garment: &garment_bytes,
            category: descriptor.category,
            garment_name: &descriptor.name,
        };

        tracing::info!(service = generator.name(), "requesting generative try-on");
        match generator.generate(&request) {
            Ok(bytes) => match decode(&bytes, ImageRole::Generated) {
                Ok(image) => Some(image.to_rgb8()),
                Err(err) => {
                    tracing::warn!(
                        service = generator.name(),
                        error = %err,
                        "generated image is unreadable"
                    );
                    None
                }
            },
            Err(err) => {
                tracing::warn!(
                    service = generator.name(),
                    error = %err,
                    "generative try-on failed"
                );
                None
            }
        }
    }

    fn compose_fallback(
        &self,
        person_bytes: &[u8],
        person: &DynamicImage,
        garment: &DynamicImage,
        descriptor: &GarmentDescriptor,
    ) -> RgbImage {
        let landmarks = locate_or_default(self.oracle.as_deref(), person_bytes);

        let trimmed;
        let garment = if self.config.garment_prep.trim_border {
            trimmed = DynamicImage::ImageRgba8(trim_uniform_border(&garment.to_rgba8()));
            &trimmed
        } else {
            garment
        };

        let coverage = descriptor.coverage.or_else(|| {
            self.config
                .default_coverage
                .map(|table| table.for_category(descriptor.category))
        });

        compose(
            person,
            garment,
            &landmarks,
            descriptor.category,
            coverage,
            &self.config.compose,
        )
    }

    fn post_process(&self, image: RgbImage, original: (u32, u32)) -> RgbImage {
        let image = if image.dimensions() != original {
            tracing::debug!(from = ?image.dimensions(), to = ?original, "resizing result");
            imageops::resize(&image, original.0, original.1, RESULT_FILTER)
        } else {
            image
        };
        self.stamper.stamp(image, &self.config.stamp.text)
    }

    fn failure_reason(&self, method: TryOnMethod) -> String {
        let generative = if !method.allows_generative() {
            "generative stage not requested"
        } else if self.generator.is_none() {
            "no generative service configured"
        } else {
            "generative service produced no image"
        };
        let fallback = if !method.allows_overlay() {
            "overlay not allowed for this garment"
        } else {
            "overlay fallback disabled"
        };
        format!("{generative}; {fallback}")
    }
}
