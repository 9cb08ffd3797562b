use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Items per category the prompt asks the model for.
pub const REQUESTED_ITEMS: std::ops::RangeInclusive<usize> = 6..=7;

/// The four-category strategic breakdown returned by the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("payload is not valid JSON: {0}")]
    NotJson(String),

    #[error("payload is not a JSON object")]
    NotObject,

    #[error("missing field '{0}'")]
    Missing(&'static str),

    #[error("field '{0}' must be a string")]
    NotString(&'static str),

    #[error("field '{field}' must be an array of strings (bad entry at index {index})")]
    NotStringArray { field: &'static str, index: usize },
}

impl AnalysisResult {
    /// Decodes and validates the JSON text the model produced.
    ///
    /// The declared response schema is not trusted: every field is checked
    /// here, and a payload that fails any check is rejected as a whole.
    pub fn from_model_json(text: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SchemaError::NotJson(e.to_string()))?;
        let obj = value.as_object().ok_or(SchemaError::NotObject)?;

        let summary = match obj.get("summary") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(SchemaError::NotString("summary")),
            None => return Err(SchemaError::Missing("summary")),
        };

        let list = |field: &'static str| -> Result<Vec<String>, SchemaError> {
            let arr = obj
                .get(field)
                .ok_or(SchemaError::Missing(field))?
                .as_array()
                .ok_or(SchemaError::NotStringArray { field, index: 0 })?;
            arr.iter()
                .enumerate()
                .map(|(index, v)| {
                    v.as_str()
                        .map(String::from)
                        .ok_or(SchemaError::NotStringArray { field, index })
                })
                .collect()
        };

        Ok(AnalysisResult {
            summary,
            strengths: list("strengths")?,
            weaknesses: list("weaknesses")?,
            opportunities: list("opportunities")?,
            threats: list("threats")?,
        })
    }

    /// Categories whose item count falls outside the requested range.
    pub fn off_count_categories(&self) -> Vec<(&'static str, usize)> {
        [
            ("strengths", self.strengths.len()),
            ("weaknesses", self.weaknesses.len()),
            ("opportunities", self.opportunities.len()),
            ("threats", self.threats.len()),
        ]
        .into_iter()
        .filter(|(_, n)| !REQUESTED_ITEMS.contains(n))
        .collect()
    }
}
