//! Coarse body landmarks and the external oracle that supplies them.

use serde::Deserialize;
use serde_json::Value;

use crate::{TryOnError, TryOnResult};

pub const DEFAULT_TORSO_CENTER_X: f32 = 0.5;
pub const DEFAULT_TORSO_CENTER_Y: f32 = 0.4;
pub const DEFAULT_SHOULDER_WIDTH_RATIO: f32 = 0.5;

/// Normalized (0.0-1.0) body position estimates for a person image.
///
/// Values outside the unit range are kept as-is and simply place the garment
/// near or past the edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyLandmarks {
    pub torso_center_x: f32,
    pub torso_center_y: f32,
    pub shoulder_width_ratio: f32,
    pub torso_height_ratio: Option<f32>,
}

impl Default for BodyLandmarks {
    fn default() -> Self {
        Self {
            torso_center_x: DEFAULT_TORSO_CENTER_X,
            torso_center_y: DEFAULT_TORSO_CENTER_Y,
            shoulder_width_ratio: DEFAULT_SHOULDER_WIDTH_RATIO,
            torso_height_ratio: None,
        }
    }
}

/// Field-by-field view of an oracle response; every field is optional.
#[derive(Debug, Default, Deserialize)]
struct RawLandmarks {
    #[serde(default, deserialize_with = "lenient_number")]
    torso_center_x: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number")]
    torso_center_y: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number")]
    shoulder_width_ratio: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number")]
    torso_height_ratio: Option<f32>,
}

/// Accept numbers and numeric strings; anything else reads as missing.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.map(|n| n as f32).filter(|n| n.is_finite()))
}

impl BodyLandmarks {
    /// Parse a landmark oracle response.
    ///
    /// Vision LLMs tend to wrap JSON in prose or code fences, so the first
    /// `{...}` object in the text is used. Missing or non-numeric fields take
    /// their defaults. Fails only when no JSON object can be found.
    pub fn from_oracle_response(text: &str) -> TryOnResult<Self> {
        let object = extract_json_object(text)
            .ok_or_else(|| TryOnError::Oracle("no JSON object in response".to_string()))?;
        let raw: RawLandmarks = serde_json::from_str(object)?;

        let defaults = Self::default();
        let landmarks = Self {
            torso_center_x: raw.torso_center_x.unwrap_or(defaults.torso_center_x),
            torso_center_y: raw.torso_center_y.unwrap_or(defaults.torso_center_y),
            shoulder_width_ratio: raw
                .shoulder_width_ratio
                .filter(|ratio| *ratio > 0.0)
                .unwrap_or(defaults.shoulder_width_ratio),
            torso_height_ratio: raw.torso_height_ratio,
        };
        tracing::debug!(?landmarks, "parsed oracle landmarks");
        Ok(landmarks)
    }
}

/// Slice from the first `{` to the last `}`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// External service that estimates where the body sits in a person photo.
pub trait LandmarkOracle: Send + Sync {
    /// Locate the torso in the encoded person image.
    fn locate(&self, person: &[u8]) -> TryOnResult<BodyLandmarks>;
}

/// Oracle that always answers with the same landmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticOracle {
    landmarks: BodyLandmarks,
}

impl StaticOracle {
    pub fn new(landmarks: BodyLandmarks) -> Self {
        Self { landmarks }
    }
}

impl LandmarkOracle for StaticOracle {
    fn locate(&self, _person: &[u8]) -> TryOnResult<BodyLandmarks> {
        Ok(self.landmarks)
    }
}

/// Ask the oracle, falling back to default landmarks on any failure.
pub fn locate_or_default(oracle: Option<&dyn LandmarkOracle>, person: &[u8]) -> BodyLandmarks {
    let Some(oracle) = oracle else {
        tracing::debug!("no landmark oracle configured, using defaults");
        return BodyLandmarks::default();
    };
    match oracle.locate(person) {
        Ok(landmarks) => landmarks,
        Err(err) => {
            tracing::warn!(error = %err, "landmark oracle failed, using defaults");
            BodyLandmarks::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingOracle;

    impl LandmarkOracle for FailingOracle {
        fn locate(&self, _person: &[u8]) -> TryOnResult<BodyLandmarks> {
            Err(TryOnError::Oracle("timeout".to_string()))
        }
    }

    mod from_oracle_response {
        use super::*;

        #[test]
        fn plain_json() {
            let landmarks = BodyLandmarks::from_oracle_response(
                r#"{"torso_center_x": 0.45, "torso_center_y": 0.35, "shoulder_width_ratio": 0.4}"#,
            )
            .unwrap();
            assert_eq!(landmarks.torso_center_x, 0.45);
            assert_eq!(landmarks.torso_center_y, 0.35);
            assert_eq!(landmarks.shoulder_width_ratio, 0.4);
            assert_eq!(landmarks.torso_height_ratio, None);
        }

        #[test]
        fn fenced_json_with_prose() {
            let text = "Here you go:\n```json\n{\"torso_center_x\": \"0.6\", \"torso_height_ratio\": 0.3}\n```";
            let landmarks = BodyLandmarks::from_oracle_response(text).unwrap();
            assert_eq!(landmarks.torso_center_x, 0.6);
            assert_eq!(landmarks.torso_center_y, DEFAULT_TORSO_CENTER_Y);
            assert_eq!(landmarks.shoulder_width_ratio, DEFAULT_SHOULDER_WIDTH_RATIO);
            assert_eq!(landmarks.torso_height_ratio, Some(0.3));
        }

        #[test]
        fn junk_fields_take_defaults() {
            let landmarks = BodyLandmarks::from_oracle_response(
                r#"{"torso_center_x": null, "torso_center_y": [1], "shoulder_width_ratio": -2, "extra": true}"#,
            )
            .unwrap();
            assert_eq!(landmarks, BodyLandmarks::default());
        }

        #[test]
        fn out_of_range_is_kept() {
            let landmarks =
                BodyLandmarks::from_oracle_response(r#"{"torso_center_x": 1.4}"#).unwrap();
            assert_eq!(landmarks.torso_center_x, 1.4);
        }

        #[test]
        fn no_object_is_an_error() {
            let err = BodyLandmarks::from_oracle_response("I cannot see a person").unwrap_err();
            assert!(matches!(err, TryOnError::Oracle(_)));
        }

        #[test]
        fn broken_object_is_an_error() {
            let err = BodyLandmarks::from_oracle_response("{torso_center_x: }").unwrap_err();
            assert!(matches!(err, TryOnError::Json(_)));
        }
    }

    mod locate_or_default {
        use super::*;

        #[test]
        fn missing_oracle_gives_defaults() {
            assert_eq!(locate_or_default(None, b""), BodyLandmarks::default());
        }

        #[test]
        fn failing_oracle_gives_defaults() {
            let oracle = FailingOracle;
            assert_eq!(
                locate_or_default(Some(&oracle), b"bytes"),
                BodyLandmarks::default()
            );
        }

        #[test]
        fn static_oracle_answers() {
            let fixed = BodyLandmarks {
                torso_center_x: 0.3,
                ..BodyLandmarks::default()
            };
            let oracle = StaticOracle::new(fixed);
            assert_eq!(locate_or_default(Some(&oracle), b""), fixed);
        }
    }
}
