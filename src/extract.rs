use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{NO_ANALYSIS_MESSAGE, NO_IDEAS_MESSAGE};
use crate::gateway::ChatResponse;
use crate::idea::{category_gaps, ideas_payload_typedef, Category, IdeasPayload};
use crate::prompt::{SectionSpec, NARRATIVE_SECTIONS};
use crate::schema::{validate, SchemaError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no analysis content in response")]
    NoAnalysis,

    #[error("no tool call in response")]
    NoToolCall,

    #[error("tool arguments are not valid JSON: {0}")]
    UnparsableArguments(String),

    #[error("tool arguments carry no ideas array")]
    MissingIdeas,

    #[error("tool arguments do not match the schema: {}", join_errors(.0))]
    SchemaMismatch(Vec<SchemaError>),

    #[error("idea categories are not one of each, offending: {0:?}")]
    CategoryMismatch(Vec<Category>),
}

impl ExtractionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractionError::NoAnalysis => NO_ANALYSIS_MESSAGE,
            _ => NO_IDEAS_MESSAGE,
        }
    }
}

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Free-text path: `choices[0].message.content`, returned unmodified.
pub fn extract_analysis(response: &ChatResponse) -> Result<String, ExtractionError> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .ok_or(ExtractionError::NoAnalysis)
}

/// Structured path: parse `choices[0].message.tool_calls[0].function.arguments`
/// and hand back its `ideas` array exactly as the gateway produced it.
///
/// With `enforce` off nothing else is checked. With it on the arguments must
/// match the declared schema and carry each category exactly once.
pub fn extract_ideas(
    response: &ChatResponse,
    enforce: bool,
) -> Result<Vec<Value>, ExtractionError> {
    let arguments = response
        .choices
        .first()
        .and_then(|c| c.message.tool_calls.as_ref())
        .and_then(|calls| calls.first())
        .and_then(|call| call.function.arguments.as_deref())
        .filter(|args| !args.trim().is_empty())
        .ok_or(ExtractionError::NoToolCall)?;

    parse_ideas_arguments(arguments, enforce)
}

pub fn parse_ideas_arguments(
    arguments: &str,
    enforce: bool,
) -> Result<Vec<Value>, ExtractionError> {
    let mut value: Value = serde_json::from_str(arguments)
        .map_err(|e| ExtractionError::UnparsableArguments(e.to_string()))?;

    if enforce {
        validate(&ideas_payload_typedef(), &value).map_err(ExtractionError::SchemaMismatch)?;

        let payload = IdeasPayload::deserialize(&value)
            .map_err(|e| ExtractionError::UnparsableArguments(e.to_string()))?;
        let gaps = category_gaps(&payload.ideas);
        if !gaps.is_empty() {
            return Err(ExtractionError::CategoryMismatch(gaps));
        }
    }

    match value.get_mut("ideas").map(Value::take) {
        Some(Value::Array(ideas)) => Ok(ideas),
        _ => Err(ExtractionError::MissingIdeas),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub number: u8,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionSplit {
    pub sections: Vec<Section>,
    /// Canonical section numbers that produced no section.
    pub missing: Vec<u8>,
}

static SECTION_HEADERS: Lazy<Vec<(SectionSpec, Regex)>> = Lazy::new(|| {
    NARRATIVE_SECTIONS
        .iter()
        .map(|spec| {
            let pattern = format!(
                r"(?m)^[ \t]*##[ \t]*{}\.[ \t]*{}[^\n]*$",
                spec.number,
                regex::escape(spec.title)
            );
            let re = Regex::new(&pattern).expect("section header pattern is valid");
            (*spec, re)
        })
        .collect()
});

static ANY_NUMBERED_HEADER: Lazy<Regex> =
    Lazy::new(|| {
        Regex::new(r"(?m)^[ \t]*##[ \t]*\d+\.").expect("numbered header pattern is valid")
    });

/// Legacy regex path: cut the markdown into the four canonical sections.
///
/// Output order is canonical (1 to 4) whatever order the headers appear in.
/// A section's body runs to the next numbered header or the end of the text;
/// empty bodies are dropped.
pub fn split_sections(markdown: &str) -> SectionSplit {
    let mut split = SectionSplit::default();

    for (spec, header) in SECTION_HEADERS.iter() {
        let Some(found) = header.find(markdown) else {
            split.missing.push(spec.number);
            continue;
        };

        let body_start = found.end();
        let body_end = ANY_NUMBERED_HEADER
            .find_at(markdown, body_start)
            .map(|m| m.start())
            .unwrap_or(markdown.len());
        let content = markdown[body_start..body_end].trim();

        if content.is_empty() {
            split.missing.push(spec.number);
            continue;
        }

        split.sections.push(Section {
            number: spec.number,
            title: spec.title.to_string(),
            content: content.to_string(),
        });
    }

    split
}
