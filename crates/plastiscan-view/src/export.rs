//! Tabular export rows for the file-download collaborator: one row per
//! displayed particle, geometry in relative units.

use plastiscan_core::AnalyzedParticle;

/// Column header matching [`export_rows`].
pub const EXPORT_HEADER: &str =
    "Index,Confidence (%),Class,CenterX,CenterY,Width,Height,Shape,Color,Transparency,Note";

/// Quote a field when it contains a comma, quote or newline, doubling
/// internal quotes.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

fn row(particle: &AnalyzedParticle) -> String {
    let b = &particle.bbox;
    let analysis = particle.analysis.as_ref();
    let shape = analysis.and_then(|a| a.shape.as_deref()).unwrap_or("");
    let color = analysis.and_then(|a| a.color.as_deref()).unwrap_or("");
    let transparency = analysis.and_then(|a| a.transparency.as_deref()).unwrap_or("");
    let note = analysis
        .and_then(|a| a.error.as_deref().or(a.reason.as_deref()))
        .unwrap_or("");

    [
        particle.index.to_string(),
        format!("{:.1}", b.confidence_percent()),
        csv_field(&b.class),
        format!("{:.5}", b.x),
        format!("{:.5}", b.y),
        format!("{:.5}", b.width),
        format!("{:.5}", b.height),
        csv_field(shape),
        csv_field(color),
        csv_field(transparency),
        csv_field(note),
    ]
    .join(",")
}

/// One CSV-ready line per particle, in list order, without the header.
pub fn export_rows(particles: &[AnalyzedParticle]) -> Vec<String> {
    particles.iter().map(row).collect()
}

/// Full document: header plus one row per particle.
pub fn export_csv(particles: &[AnalyzedParticle]) -> String {
    let mut out = String::from(EXPORT_HEADER);
    for line in export_rows(particles) {
        out.push('\n');
        out.push_str(&line);
    }
    out.push('\n');
    out
}
