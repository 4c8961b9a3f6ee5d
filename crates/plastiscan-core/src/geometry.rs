//! Detector wire types and resolution-independent box math.
//!
//! `normalize` is the single place where particle indices are assigned;
//! `denormalize` is the single formula shared by the annotation renderer
//! (target = the image's own intrinsic size) and the interactive overlay
//! (target = the current display size).

use serde::{Deserialize, Serialize};

use crate::types::{AnalyzedParticle, BoundingBox};

/// Raw detector payload. Every field is optional: the detector sits on the
/// other side of a trust boundary and its output is validated here, not
/// assumed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawDetectorOutput {
    #[serde(default)]
    pub image: Option<RawImageSize>,
    #[serde(default)]
    pub predictions: Option<Vec<RawPrediction>>,
}

impl RawDetectorOutput {
    /// Decode a detector response body.
    pub fn from_json(body: &str) -> Result<Self, DetectionError> {
        Ok(serde_json::from_str(body)?)
    }
}

/// Intrinsic dimensions reported by the detector, in pixels.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RawImageSize {
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

/// One raw detection in absolute pixel units, center-based.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawPrediction {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub class: Option<String>,
}

impl RawPrediction {
    /// The numeric fields a prediction must carry to survive normalization.
    fn numeric_fields(&self) -> Option<(f32, f32, f32, f32, f32)> {
        let x = self.x.filter(|v| v.is_finite())?;
        let y = self.y.filter(|v| v.is_finite())?;
        let w = self.width.filter(|v| v.is_finite())?;
        let h = self.height.filter(|v| v.is_finite())?;
        let c = self.confidence.filter(|v| v.is_finite())?;
        Some((x, y, w, h, c))
    }
}

/// Errors raised while turning detector output into particles. These are
/// detection-phase errors: they abort the run before any characterization
/// call is made.
#[derive(thiserror::Error, Debug)]
pub enum DetectionError {
    #[error("invalid detection data: missing or non-positive image dimensions (width={width:?}, height={height:?})")]
    InvalidDetectionData {
        width: Option<f32>,
        height: Option<f32>,
    },

    #[error("invalid detector payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Absolute-pixel rectangle produced by [`denormalize`], top-left based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Convert absolute-pixel detections into indexed, resolution-independent
/// particles.
///
/// Individual predictions missing a required numeric field are skipped with a
/// warning rather than failing the batch; indices are assigned contiguously
/// over the survivors, in original order. An absent or empty prediction list
/// yields an empty vec, not an error.
pub fn normalize(
    predictions: &[RawPrediction],
    image_width: f32,
    image_height: f32,
) -> Result<Vec<AnalyzedParticle>, DetectionError> {
    if !(image_width > 0.0) || !(image_height > 0.0) {
        return Err(DetectionError::InvalidDetectionData {
            width: Some(image_width),
            height: Some(image_height),
        });
    }

    let mut particles = Vec::with_capacity(predictions.len());
    for (slot, raw) in predictions.iter().enumerate() {
        let Some((x, y, w, h, confidence)) = raw.numeric_fields() else {
            log::warn!("skipping detector prediction {slot}: missing numeric field");
            continue;
        };

        particles.push(AnalyzedParticle {
            bbox: BoundingBox {
                x: x / image_width,
                y: y / image_height,
                width: w / image_width,
                height: h / image_height,
                confidence,
                class: raw.class.clone().unwrap_or_default(),
            },
            index: particles.len(),
            analysis: None,
        });
    }

    Ok(particles)
}

/// [`normalize`] driven by a full detector payload, taking the image
/// dimensions from the payload itself.
pub fn normalize_output(raw: &RawDetectorOutput) -> Result<Vec<AnalyzedParticle>, DetectionError> {
    let size = raw.image.unwrap_or_default();
    let (Some(width), Some(height)) = (size.width, size.height) else {
        return Err(DetectionError::InvalidDetectionData {
            width: size.width,
            height: size.height,
        });
    };

    let predictions = raw.predictions.as_deref().unwrap_or(&[]);
    normalize(predictions, width, height)
}

/// Project a relative box back to absolute pixels at the given target size.
#[inline]
pub fn denormalize(bbox: &BoundingBox, target_width: f32, target_height: f32) -> PixelRect {
    let width = bbox.width * target_width;
    let height = bbox.height * target_height;
    PixelRect {
        top_left_x: bbox.x * target_width - width / 2.0,
        top_left_y: bbox.y * target_height - height / 2.0,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw(x: f32, y: f32, w: f32, h: f32, conf: f32, class: &str) -> RawPrediction {
        RawPrediction {
            x: Some(x),
            y: Some(y),
            width: Some(w),
            height: Some(h),
            confidence: Some(conf),
            class: Some(class.to_owned()),
        }
    }

    #[test]
    fn normalizes_and_denormalizes_center_box() {
        // 40x20 box centered in a 200x100 image.
        let preds = [raw(100.0, 50.0, 40.0, 20.0, 0.9, "particle")];
        let particles = normalize(&preds, 200.0, 100.0).unwrap();
        assert_eq!(particles.len(), 1);

        let b = &particles[0].bbox;
        assert_relative_eq!(b.x, 0.5);
        assert_relative_eq!(b.y, 0.5);
        assert_relative_eq!(b.width, 0.2);
        assert_relative_eq!(b.height, 0.2);

        // Top-left follows from the center formula: 0.5*400 - 80/2 = 160,
        // 0.5*200 - 40/2 = 80.
        let rect = denormalize(b, 400.0, 200.0);
        assert_relative_eq!(rect.top_left_x, 160.0);
        assert_relative_eq!(rect.top_left_y, 80.0);
        assert_relative_eq!(rect.width, 80.0);
        assert_relative_eq!(rect.height, 40.0);
    }

    #[test]
    fn round_trips_absolute_rectangle() {
        let preds = [raw(123.0, 77.5, 30.0, 12.5, 0.6, "fragment")];
        let particles = normalize(&preds, 640.0, 480.0).unwrap();
        let rect = denormalize(&particles[0].bbox, 640.0, 480.0);

        assert_relative_eq!(rect.top_left_x, 123.0 - 15.0, epsilon = 1e-4);
        assert_relative_eq!(rect.top_left_y, 77.5 - 6.25, epsilon = 1e-4);
        assert_relative_eq!(rect.width, 30.0, epsilon = 1e-4);
        assert_relative_eq!(rect.height, 12.5, epsilon = 1e-4);
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let preds = [raw(1.0, 1.0, 1.0, 1.0, 0.5, "p")];
        assert!(matches!(
            normalize(&preds, 0.0, 100.0),
            Err(DetectionError::InvalidDetectionData { .. })
        ));
        assert!(matches!(
            normalize(&preds, 100.0, -1.0),
            Err(DetectionError::InvalidDetectionData { .. })
        ));
    }

    #[test]
    fn rejects_missing_dimensions_in_payload() {
        let out = RawDetectorOutput {
            image: Some(RawImageSize {
                width: Some(100.0),
                height: None,
            }),
            predictions: None,
        };
        assert!(matches!(
            normalize_output(&out),
            Err(DetectionError::InvalidDetectionData { .. })
        ));
    }

    #[test]
    fn skips_malformed_predictions_and_keeps_indices_contiguous() {
        let broken = RawPrediction {
            x: Some(10.0),
            y: None, // missing numeric field
            width: Some(5.0),
            height: Some(5.0),
            confidence: Some(0.4),
            class: Some("p".into()),
        };
        let preds = [
            raw(10.0, 10.0, 4.0, 4.0, 0.9, "a"),
            broken,
            raw(50.0, 50.0, 4.0, 4.0, 0.8, "b"),
        ];

        let particles = normalize(&preds, 100.0, 100.0).unwrap();
        assert_eq!(particles.len(), 2);
        assert_eq!(particles[0].index, 0);
        assert_eq!(particles[0].bbox.class, "a");
        assert_eq!(particles[1].index, 1);
        assert_eq!(particles[1].bbox.class, "b");
    }

    #[test]
    fn empty_predictions_is_not_an_error() {
        let out = RawDetectorOutput::from_json(r#"{"image":{"width":640,"height":480}}"#).unwrap();
        assert!(normalize_output(&out).unwrap().is_empty());
    }
}
