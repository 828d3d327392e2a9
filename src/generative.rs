//! Boundary to hosted generative try-on services.
//!
//! No network client ships here. Callers plug one in through
//! [`GenerationBackend`] and wrap it in a [`RotatingGenerator`] to spread
//! requests over several credential/model pairs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::garment::GarmentCategory;

/// Inputs handed to a generative service.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Encoded person photo.
    pub person: &'a [u8],
    /// Encoded garment photo, already padded to the service's aspect ratio.
    pub garment: &'a [u8],
    pub category: GarmentCategory,
    pub garment_name: &'a str,
}

/// Why a generation attempt produced nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("quota exhausted for this credential")]
    Quota,

    #[error("model not found")]
    NotFound,

    #[error("service unavailable")]
    Unavailable,

    #[error("{0}")]
    Other(String),

    #[error("all credential/model pairs failed")]
    Exhausted,
}

/// A service that renders a person wearing a garment.
pub trait TryOnGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns encoded image bytes on success.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<u8>, GenerationError>;
}

/// One credential paired with one model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSlot {
    pub credential: String,
    pub model: String,
}

impl ServiceSlot {
    pub fn new(credential: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            model: model.into(),
        }
    }
}

/// Performs a single call against one slot.
pub trait GenerationBackend: Send + Sync {
    fn call(
        &self,
        slot: &ServiceSlot,
        request: &GenerationRequest<'_>,
    ) -> Result<Vec<u8>, GenerationError>;
}

/// Tries slots in round-robin order until one succeeds.
///
/// Each call starts one slot further along than the previous call. A quota
/// error retires the credential for the rest of the call and a not-found
/// error retires the model.
pub struct RotatingGenerator<B> {
    name: String,
    backend: B,
    slots: Vec<ServiceSlot>,
    cursor: AtomicUsize,
}

impl<B: GenerationBackend> RotatingGenerator<B> {
    pub fn new(name: impl Into<String>, backend: B, slots: Vec<ServiceSlot>) -> Self {
        Self {
            name: name.into(),
            backend,
            slots,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn slots(&self) -> &[ServiceSlot] {
        &self.slots
    }
}

impl<B: GenerationBackend> TryOnGenerator for RotatingGenerator<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<u8>, GenerationError> {
        let count = self.slots.len();
        if count == 0 {
            return Err(GenerationError::Unavailable);
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % count;
        let mut spent_credentials: HashSet<&str> = HashSet::new();
        let mut missing_models: HashSet<&str> = HashSet::new();

        for offset in 0..count {
            let index = (start + offset) % count;
            let slot = &self.slots[index];
            if spent_credentials.contains(slot.credential.as_str())
                || missing_models.contains(slot.model.as_str())
            {
                continue;
            }

            match self.backend.call(slot, request) {
                Ok(bytes) => {
                    tracing::info!(
                        service = %self.name,
                        slot = index,
                        model = %slot.model,
                        "generation succeeded"
                    );
                    return Ok(bytes);
                }
                Err(GenerationError::Quota) => {
                    tracing::warn!(
                        service = %self.name,
                        slot = index,
                        "quota exhausted, skipping credential"
                    );
                    spent_credentials.insert(slot.credential.as_str());
                }
                Err(GenerationError::NotFound) => {
                    tracing::warn!(
                        service = %self.name,
                        model = %slot.model,
                        "model not found, skipping model"
                    );
                    missing_models.insert(slot.model.as_str());
                }
                Err(err) => {
                    tracing::warn!(
                        service = %self.name,
                        slot = index,
                        error = %err,
                        "generation attempt failed"
                    );
                }
            }
        }

        Err(GenerationError::Exhausted)
    }
}
