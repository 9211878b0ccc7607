use serde_json::Value;

use crate::models::{
    GeneratedContent, GenerationTask, MarketEstimate, ModelResponse, OutputShape, ParseOutcome,
};

/// Leading markers stripped from list lines
const LINE_MARKERS: &[char] = &['-', '*', '•', '·', '>', '+'];

/// Parse a single-stage model response into typed content.
///
/// Text tasks pass the completion through untouched. List tasks try the
/// strict JSON path first when the task runs in JSON mode (a fenced or
/// prose-wrapped object still counts as strict), then fall back to line
/// extraction. `Unrecoverable` is returned only when no item at all can
/// be extracted; the caller decides what replaces it.
pub fn parse_response(raw: &ModelResponse, task: GenerationTask) -> ParseOutcome<GeneratedContent> {
    match task.spec().shape {
        OutputShape::Text => ParseOutcome::Strict(GeneratedContent::Text(raw.raw_text.clone())),
        OutputShape::List => parse_list(raw, task),
        // the estimate flow parses its final stage with parse_estimate
        OutputShape::Estimate => ParseOutcome::Unrecoverable(
            "market estimates are parsed per stage".to_string(),
        ),
    }
}

/// Parse the structuring-stage response of a market estimate.
///
/// `Strict` when the whole completion deserializes, `Fallback` when a
/// JSON object had to be sliced out of surrounding prose, otherwise
/// `Unrecoverable`.
pub fn parse_estimate(raw: &ModelResponse) -> ParseOutcome<MarketEstimate> {
    if let Ok(estimate) = serde_json::from_str::<MarketEstimate>(&raw.raw_text) {
        return ParseOutcome::Strict(estimate);
    }

    let sliced = embedded_object(&raw.raw_text)
        .and_then(|inner| serde_json::from_str::<MarketEstimate>(inner).ok());
    match sliced {
        Some(estimate) => ParseOutcome::Fallback(estimate),
        None => ParseOutcome::Unrecoverable(
            "structuring output does not contain a JSON object".to_string(),
        ),
    }
}

fn parse_list(raw: &ModelResponse, task: GenerationTask) -> ParseOutcome<GeneratedContent> {
    let spec = task.spec();

    let mut json_failed = false;
    if spec.json_mode {
        match extract_json_list(&raw.raw_text, spec.json_field) {
            Some(items) => return ParseOutcome::Strict(GeneratedContent::List(items)),
            None => json_failed = true,
        }
    }

    let cap = spec.bounds.map(|bounds| bounds.max).unwrap_or(usize::MAX);
    let items = extract_lines(&raw.raw_text, cap);

    if items.is_empty() {
        ParseOutcome::Unrecoverable("no list items could be extracted".to_string())
    } else if json_failed {
        ParseOutcome::Fallback(GeneratedContent::List(items))
    } else {
        ParseOutcome::Strict(GeneratedContent::List(items))
    }
}

/// Extract a list of strings from a JSON completion.
///
/// Reads the configured field of the parsed object, accepting a bare
/// array as well. Returns `None` on any parse failure or when an element
/// is not a string.
fn extract_json_list(raw: &str, field: Option<&str>) -> Option<Vec<String>> {
    let value = parse_json_value(raw)?;

    let array = match field {
        Some(name) => value
            .get(name)
            .and_then(Value::as_array)
            .or_else(|| value.as_array())?,
        None => value.as_array()?,
    };

    let mut items = Vec::with_capacity(array.len());
    for entry in array {
        items.push(entry.as_str()?.trim().to_string());
    }
    Some(items)
}

/// Parse a completion as JSON, slicing out an embedded object when the
/// model wrapped it in prose or code fences
fn parse_json_value(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }
    embedded_object(raw).and_then(|inner| serde_json::from_str(inner).ok())
}

/// Slice from the first `{` to the last `}` of the text
fn embedded_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Extract up to `cap` list items from free text, one item per line.
///
/// Structural noise is dropped: headers, code fences, lines that open a
/// JSON collection, and lines with no alphanumeric content. Remaining
/// lines lose their leading bullet or number markers and trailing
/// separator debris.
fn extract_lines(raw: &str, cap: usize) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !is_noise_line(line))
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .take(cap)
        .map(str::to_string)
        .collect()
}

fn is_noise_line(line: &str) -> bool {
    if line.starts_with('#') || line.starts_with('`') {
        return true;
    }
    if line.ends_with([':', '[', '{', '}', ']']) {
        return true;
    }
    !line.chars().any(char::is_alphanumeric)
}

fn clean_line(line: &str) -> &str {
    let mut rest = line;
    loop {
        let before = rest;
        rest = rest.trim_start_matches(LINE_MARKERS).trim_start();
        rest = strip_leading_number(rest);
        if rest == before {
            break;
        }
    }
    rest.trim_end_matches([',', ';']).trim_end()
}

/// Strip a leading "1." or "2)" style enumerator. Bare numbers stay, so
/// items like "2 meses" keep their digits.
fn strip_leading_number(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 2 {
        return line;
    }
    let rest = &line[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}
