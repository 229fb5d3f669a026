//! Offset-based template substitution.
//!
//! Directives and config files are annotated with [`AnnotatedSpan`]s: byte
//! ranges that name the parameter whose value replaces them. Substitution
//! processes spans strictly right-to-left (descending `start`): splicing a
//! span only shifts offsets *after* its own `start`, so every not-yet
//! processed span (all of which start at or before it) keeps valid
//! coordinates without any offset bookkeeping.
//!
//! Overlapping spans are undefined for substitution; [`validate_spans`]
//! exists so annotation authors can reject them up front.

use std::collections::BTreeMap;

use crate::model::AnnotatedSpan;

/// Errors raised while substituting parameter values into a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A span names a parameter with neither a user value nor a default.
    #[error("no value or default supplied for parameter \"{name}\"")]
    MissingParameterValue { name: String },

    /// A span's offsets fall outside the text or inside a UTF-8 character.
    #[error("span {start}..{end} is not a valid byte range of the template")]
    InvalidSpan { start: usize, end: usize },

    /// Two spans overlap; substitution order would corrupt the result.
    #[error("spans {first_start}..{first_end} and {second_start}..{second_end} overlap")]
    OverlappingSpans {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },
}

/// Render a parameter value the way it appears in a command line or config
/// file: strings unquoted, everything else via its JSON display form.
pub fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute user-supplied parameter values into `text` along `spans`.
///
/// For each span the value is `values[name]`, falling back to the span's
/// `default_value`; JSON `null` counts as no default. Spans are processed
/// in descending `start` order regardless of input order.
pub fn substitute(
    text: &str,
    spans: &[AnnotatedSpan],
    values: &BTreeMap<String, serde_json::Value>,
) -> Result<String, TemplateError> {
    let mut ordered: Vec<&AnnotatedSpan> = spans.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = text.to_string();
    for span in ordered {
        let name = &span.annotation.name;
        let value = match values.get(name) {
            Some(v) => v,
            None if !span.annotation.default_value.is_null() => &span.annotation.default_value,
            None => {
                return Err(TemplateError::MissingParameterValue { name: name.clone() });
            }
        };

        if span.start > span.end
            || !result.is_char_boundary(span.start)
            || span.end > result.len()
            || !result.is_char_boundary(span.end)
        {
            return Err(TemplateError::InvalidSpan {
                start: span.start,
                end: span.end,
            });
        }

        result.replace_range(span.start..span.end, &render_value(value));
    }

    Ok(result)
}

/// Reject span sets whose `[start, end)` ranges overlap.
///
/// Intended for annotation authoring time; [`substitute`] assumes the spans
/// it receives passed this check.
pub fn validate_spans(spans: &[AnnotatedSpan]) -> Result<(), TemplateError> {
    let mut ordered: Vec<&AnnotatedSpan> = spans.iter().collect();
    ordered.sort_by_key(|s| s.start);

    for pair in ordered.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if second.start < first.end {
            return Err(TemplateError::OverlappingSpans {
                first_start: first.start,
                first_end: first.end,
                second_start: second.start,
                second_end: second.end,
            });
        }
    }
    Ok(())
}
