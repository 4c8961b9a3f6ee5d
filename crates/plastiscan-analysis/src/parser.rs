use plastiscan_core::ParticleAnalysis;
use serde_json::Value;

/// Why a characterization response could not be used. The caller collapses
/// all three kinds into the global fallback path; the distinction exists for
/// logging and for the error message carried into the fallback sentinel.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("no JSON array found in characterization response")]
    NoArrayFound,

    #[error("malformed JSON in characterization response: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("characterization response decoded to {found}, expected an array")]
    UnexpectedShape { found: &'static str },
}

/// One element of the model's reply array.
///
/// `index` is `None` when the model emitted a non-numeric index; such entries
/// survive parsing and are simply never matched during reconciliation.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedEntry {
    pub index: Option<i64>,
    pub analysis: Option<ParticleAnalysis>,
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Extract the characterization array from a raw model reply.
///
/// The model is instructed to emit a bare JSON array but routinely wraps it
/// in prose or code fences, so the strategy is: take the substring from the
/// first `[` to the last `]` and decode that. This is resilience to wrapping
/// text only, not a relaxed JSON grammar; anything malformed inside the
/// brackets still fails, and the caller must then treat the whole response
/// as unusable.
pub fn parse_response(raw_text: &str) -> Result<Vec<ParsedEntry>, ParseError> {
    let open = raw_text.find('[').ok_or(ParseError::NoArrayFound)?;
    let close = raw_text.rfind(']').ok_or(ParseError::NoArrayFound)?;
    if close <= open {
        return Err(ParseError::NoArrayFound);
    }

    let decoded: Value = serde_json::from_str(&raw_text[open..=close])?;
    let Value::Array(items) = decoded else {
        return Err(ParseError::UnexpectedShape {
            found: value_kind(&decoded),
        });
    };

    Ok(items.iter().map(parse_entry).collect())
}

fn parse_entry(item: &Value) -> ParsedEntry {
    let index = item.get("index").and_then(Value::as_i64);
    if index.is_none() {
        log::warn!("characterization entry without numeric index: {item}");
    }
    let analysis = item
        .get("analysis")
        .and_then(|v| serde_json::from_value::<ParticleAnalysis>(v.clone()).ok());
    ParsedEntry { index, analysis }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str =
        r#"[{"index":0,"analysis":{"shape":"Fiber","color":"Blue","transparency":"Opaque"}}]"#;

    #[test]
    fn parses_bare_array() {
        let entries = parse_response(BARE).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, Some(0));
        let a = entries[0].analysis.as_ref().unwrap();
        assert_eq!(a.shape.as_deref(), Some("Fiber"));
        assert_eq!(a.color.as_deref(), Some("Blue"));
        assert_eq!(a.transparency.as_deref(), Some("Opaque"));
    }

    #[test]
    fn fenced_array_parses_same_as_bare() {
        let fenced = format!("Sure! ```json\n{BARE}\n```");
        assert_eq!(parse_response(&fenced).unwrap(), parse_response(BARE).unwrap());
    }

    #[test]
    fn prose_without_brackets_is_no_array_found() {
        assert!(matches!(
            parse_response("I could not characterize the particles."),
            Err(ParseError::NoArrayFound)
        ));
    }

    #[test]
    fn close_bracket_before_open_is_no_array_found() {
        assert!(matches!(
            parse_response("] nothing here ["),
            Err(ParseError::NoArrayFound)
        ));
    }

    #[test]
    fn broken_json_inside_brackets_is_malformed() {
        assert!(matches!(
            parse_response(r#"[{"index":0,]"#),
            Err(ParseError::MalformedJson(_))
        ));
    }

    #[test]
    fn non_numeric_index_is_kept_but_unmatched() {
        let entries = parse_response(r#"[{"index":"zero","analysis":{"shape":"Bead"}}]"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, None);
        assert!(entries[0].analysis.is_some());
    }
}
