use serde::{Deserialize, Serialize};

use plastiscan_core::{AnalysisStats, AnalyzedParticle};

/// What the overlay labels and colors are keyed on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Raw detector class and confidence. Always available.
    Detection,
    Shape,
    Color,
    Transparency,
}

/// Keep particles at or above the confidence threshold, in original order.
pub fn filter_by_confidence(
    particles: &[AnalyzedParticle],
    threshold: f32,
) -> Vec<AnalyzedParticle> {
    particles
        .iter()
        .filter(|p| p.bbox.confidence >= threshold)
        .cloned()
        .collect()
}

/// Aggregate category distributions over an already-filtered particle set.
///
/// A particle contributes only when its analysis is usable (present, no
/// error, not the "Not Analyzed" sentinel). Downstream percentage math
/// divides by `analyzed_count`, which [`AnalysisStats::percent_of_analyzed`]
/// guards against zero.
pub fn compute_stats(filtered: &[AnalyzedParticle]) -> AnalysisStats {
    let mut stats = AnalysisStats {
        count: filtered.len(),
        ..AnalysisStats::default()
    };

    for particle in filtered {
        let Some(analysis) = particle.analysis.as_ref().filter(|a| a.is_usable()) else {
            continue;
        };
        stats.analyzed_count += 1;
        if let Some(shape) = &analysis.shape {
            *stats.shapes.entry(shape.clone()).or_insert(0) += 1;
        }
        if let Some(color) = &analysis.color {
            *stats.colors.entry(color.clone()).or_insert(0) += 1;
        }
        if let Some(transparency) = &analysis.transparency {
            *stats.transparency.entry(transparency.clone()).or_insert(0) += 1;
        }
    }

    stats.has_stats = stats.analyzed_count > 0;
    stats
}

/// Which display modes are valid for the current stats. Detection is always
/// offered; the category modes only make sense once something was analyzed.
pub fn available_display_modes(stats: &AnalysisStats) -> Vec<DisplayMode> {
    let mut modes = vec![DisplayMode::Detection];
    if stats.has_stats {
        modes.extend([
            DisplayMode::Shape,
            DisplayMode::Color,
            DisplayMode::Transparency,
        ]);
    }
    modes
}
