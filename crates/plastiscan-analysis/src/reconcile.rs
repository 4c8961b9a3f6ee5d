use plastiscan_core::{AnalyzedParticle, ParticleAnalysis};

use crate::parser::ParsedEntry;

/// Reason attached to particles the model skipped.
const INDEX_NOT_FOUND: &str = "Index not found in AI response";

/// Join parsed characterizations onto the original detections by index.
///
/// The output has exactly the length and order of `originals`, whatever the
/// parsed list contains: the first entry matching a particle's index wins,
/// later duplicates are ignored, and out-of-range or non-numeric indices
/// match nothing. A particle with no matching entry receives the
/// "Not Analyzed" sentinel. Geometry and indices pass through untouched.
pub fn merge(originals: &[AnalyzedParticle], parsed: &[ParsedEntry]) -> Vec<AnalyzedParticle> {
    originals
        .iter()
        .map(|particle| {
            let hit = parsed
                .iter()
                .find(|entry| entry.index == Some(particle.index as i64));
            let analysis = match hit {
                Some(entry) => entry.analysis.clone(),
                None => Some(ParticleAnalysis::not_analyzed(INDEX_NOT_FOUND)),
            };
            AnalyzedParticle {
                analysis,
                ..particle.clone()
            }
        })
        .collect()
}

/// Global fallback for an unusable response: every particle receives the
/// "Parse Error" sentinel carrying the failure message, so geometry stays
/// visible even when characterization is not.
pub fn merge_fallback(
    originals: &[AnalyzedParticle],
    error_message: &str,
) -> Vec<AnalyzedParticle> {
    originals
        .iter()
        .map(|particle| AnalyzedParticle {
            analysis: Some(ParticleAnalysis::parse_error(error_message)),
            ..particle.clone()
        })
        .collect()
}
