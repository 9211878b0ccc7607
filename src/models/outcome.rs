use crate::models::estimate::EstimateResult;
use crate::models::task::OutputShape;

/// Raw text returned by one remote model call
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Provider that produced the response
    pub provider: &'static str,
    /// Completion text exactly as returned
    pub raw_text: String,
    /// Whether the call asked for a JSON object response
    pub is_json_mode: bool,
}

/// Typed content produced by parsing a model response
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedContent {
    /// A single text block
    Text(String),
    /// A list of short items
    List(Vec<String>),
    /// A structured market estimate with its refined query
    Estimate(EstimateResult),
}

impl GeneratedContent {
    /// Shape of this content
    pub fn shape(&self) -> OutputShape {
        match self {
            GeneratedContent::Text(_) => OutputShape::Text,
            GeneratedContent::List(_) => OutputShape::List,
            GeneratedContent::Estimate(_) => OutputShape::Estimate,
        }
    }

    /// The text block, if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeneratedContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The items, if this is list content
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            GeneratedContent::List(items) => Some(items),
            _ => None,
        }
    }
}

/// How a model response was turned into content.
///
/// `Strict` means the expected format parsed cleanly, `Fallback` means a
/// heuristic recovered usable content, and `Unrecoverable` means nothing
/// could be extracted. Callers decide what replaces an unrecoverable
/// parse; the variant itself never escapes the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Strict(T),
    Fallback(T),
    Unrecoverable(String),
}

impl<T> ParseOutcome<T> {
    /// Whether the expected format parsed cleanly
    pub fn is_strict(&self) -> bool {
        matches!(self, ParseOutcome::Strict(_))
    }
}

/// Final result of a pipeline run, with degradation flags
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Normalized, contract-checked content
    pub content: GeneratedContent,
    /// True when a heuristic parse recovered the content
    pub used_fallback_parse: bool,
    /// True when defaults were substituted for unusable output
    pub substituted_defaults: bool,
}
