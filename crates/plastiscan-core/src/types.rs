use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel category attached when the characterization response contains no
/// entry for a particle.
pub const NOT_ANALYZED: &str = "Not Analyzed";

/// Sentinel category attached when the whole characterization response is
/// unusable.
pub const PARSE_ERROR: &str = "Parse Error";

/// Resolution-independent detection box.
///
/// `x`/`y` are the box *center*, and all four geometry fields are relative to
/// the source image dimensions (nominally in `[0, 1]`, not enforced: the
/// upstream detector is a trust boundary). Geometry is assigned once during
/// normalization and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    /// Free-form detector label.
    pub class: String,
}

impl BoundingBox {
    /// Confidence as a display percentage.
    #[inline]
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }
}

/// Per-particle characterization reported by the vision model, or a sentinel
/// standing in for it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    /// Set when the response as a whole could not be used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when this particular particle had no entry in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ParticleAnalysis {
    /// Sentinel for a particle the model did not report on.
    pub fn not_analyzed(reason: impl Into<String>) -> Self {
        Self {
            shape: Some(NOT_ANALYZED.to_owned()),
            color: Some(NOT_ANALYZED.to_owned()),
            transparency: Some(NOT_ANALYZED.to_owned()),
            error: None,
            reason: Some(reason.into()),
        }
    }

    /// Sentinel applied to every particle when the whole response failed to
    /// parse.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            shape: Some(PARSE_ERROR.to_owned()),
            color: Some(PARSE_ERROR.to_owned()),
            transparency: Some(PARSE_ERROR.to_owned()),
            error: Some(message.into()),
            reason: None,
        }
    }

    /// Whether this analysis should contribute to category statistics.
    pub fn is_usable(&self) -> bool {
        self.error.is_none() && self.shape.as_deref() != Some(NOT_ANALYZED)
    }
}

/// A detection plus its stable index and (possibly absent) characterization.
///
/// `index` equals the particle's position among the valid detections of one
/// normalization run and is never reassigned; reconciliation only ever fills
/// in `analysis`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedParticle {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ParticleAnalysis>,
}

impl AnalyzedParticle {
    /// Whether the attached analysis is genuine (present, no error, not a
    /// sentinel).
    pub fn has_usable_analysis(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.is_usable())
    }
}

/// Aggregate category counts over a filtered particle set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub shapes: BTreeMap<String, usize>,
    pub colors: BTreeMap<String, usize>,
    pub transparency: BTreeMap<String, usize>,
    /// Particles passing the confidence threshold.
    pub count: usize,
    /// Subset of `count` with a usable analysis.
    pub analyzed_count: usize,
    pub has_stats: bool,
}

impl AnalysisStats {
    /// Share of `analyzed_count` for one category bucket, as a percentage.
    /// Returns `None` when nothing was analyzed, so callers cannot divide by
    /// zero.
    pub fn percent_of_analyzed(&self, bucket_count: usize) -> Option<f32> {
        if self.analyzed_count == 0 {
            return None;
        }
        Some(bucket_count as f32 * 100.0 / self.analyzed_count as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_analyzed_sentinel_is_not_usable() {
        let a = ParticleAnalysis::not_analyzed("Index not found in AI response");
        assert!(!a.is_usable());
        assert!(a.error.is_none());
        assert_eq!(a.shape.as_deref(), Some(NOT_ANALYZED));
    }

    #[test]
    fn parse_error_sentinel_is_not_usable() {
        let a = ParticleAnalysis::parse_error("no array found");
        assert!(!a.is_usable());
        assert_eq!(a.error.as_deref(), Some("no array found"));
    }

    #[test]
    fn genuine_analysis_is_usable() {
        let a = ParticleAnalysis {
            shape: Some("Fiber".into()),
            color: Some("Blue".into()),
            transparency: Some("Opaque".into()),
            ..ParticleAnalysis::default()
        };
        assert!(a.is_usable());
    }

    #[test]
    fn particle_usability_tracks_analysis() {
        let mut p = AnalyzedParticle {
            bbox: BoundingBox {
                x: 0.5,
                y: 0.5,
                width: 0.1,
                height: 0.1,
                confidence: 0.9,
                class: "particle".into(),
            },
            index: 0,
            analysis: None,
        };
        assert!(!p.has_usable_analysis());

        p.analysis = Some(ParticleAnalysis {
            shape: Some("Fragment".into()),
            ..ParticleAnalysis::default()
        });
        assert!(p.has_usable_analysis());

        p.analysis = Some(ParticleAnalysis::not_analyzed("skipped"));
        assert!(!p.has_usable_analysis());
    }

    #[test]
    fn percent_of_analyzed_guards_zero() {
        let stats = AnalysisStats::default();
        assert_eq!(stats.percent_of_analyzed(3), None);

        let stats = AnalysisStats {
            analyzed_count: 4,
            ..AnalysisStats::default()
        };
        assert_eq!(stats.percent_of_analyzed(1), Some(25.0));
    }
}
