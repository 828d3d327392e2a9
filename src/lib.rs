//! Garment try-on compositing.
//!
//! [`TryOnPipeline`] turns a person photo and a garment photo into a try-on
//! JPEG. A hosted generative service is tried first when one is attached;
//! otherwise, or when it fails, the garment is keyed out of its light
//! background and pasted over the torso using coarse body landmarks. Every
//! result is resized back to the person photo's size and stamped with a
//! disclaimer.

pub mod catalog;
pub mod codec;
pub mod compositor;
pub mod config;
pub mod error;
pub mod garment;
pub mod generative;
pub mod geometry;
pub mod glyphs;
pub mod keyer;
pub mod landmarks;
pub mod layer;
pub mod pipeline;
pub mod stamp;

pub use catalog::{GarmentCatalog, GarmentRecord};
pub use compositor::{Placement, compose, compute_placement};
pub use config::{ComposeOptions, CoverageTable, GarmentPrep, PipelineConfig, StampOptions};
pub use error::{ImageRole, TryOnError, TryOnResult};
pub use garment::{
    CategoryKeywords, CoverageRatio, GarmentCategory, GarmentDescriptor, TryOnMethod,
};
pub use generative::{
    GenerationBackend, GenerationError, GenerationRequest, RotatingGenerator, ServiceSlot,
    TryOnGenerator,
};
pub use geometry::{pad_to_aspect_ratio, scale_to_coverage, trim_uniform_border};
pub use keyer::remove_light_background;
pub use landmarks::{BodyLandmarks, LandmarkOracle, StaticOracle};
pub use pipeline::{TryOnPipeline, TryOnRequest};
pub use stamp::DisclaimerStamper;
