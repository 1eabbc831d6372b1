//! Answer-set assembly from an answers JSON object.
//!
//! Strings, numbers and booleans become text answers; arrays become
//! multi-valued answers; `null` means unanswered. Nested objects are
//! rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors while reading answers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The answers document is not a JSON object.
    #[error("answers must be a JSON object, got {got}")]
    NotAnObject { got: String },
    /// An answer has a shape that cannot be compared against rule values.
    #[error("answer for '{key}' must be a string, number, boolean, array or null, got {got}")]
    UnsupportedAnswer { key: String, got: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    /// Case-insensitive equality; membership for multi-valued answers.
    pub fn matches(&self, value: &str) -> bool {
        let wanted = value.trim().to_lowercase();
        match self {
            AnswerValue::Text(t) => t.trim().to_lowercase() == wanted,
            AnswerValue::Many(items) => items.iter().any(|t| t.trim().to_lowercase() == wanted),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(t) => t.trim().is_empty(),
            AnswerValue::Many(items) => items.is_empty(),
        }
    }
}

/// Field key -> answer. Blank answers are stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    values: BTreeMap<String, AnswerValue>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AnswerValue) {
        if value.is_blank() {
            return;
        }
        self.values.insert(key.into(), value);
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, AnswerValue::Text(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy restricted to the keys `keep` accepts.
    pub fn retain_keys(&self, keep: impl Fn(&str) -> bool) -> Answers {
        Answers {
            values: self
                .values
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Result<Self, EvalError> {
        let obj = json.as_object().ok_or_else(|| EvalError::NotAnObject {
            got: json_type_name(json).to_owned(),
        })?;
        let mut answers = Answers::new();
        for (key, value) in obj {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::Array(items) => {
                    let texts = items
                        .iter()
                        .map(|item| {
                            scalar_text(item).ok_or_else(|| EvalError::UnsupportedAnswer {
                                key: key.clone(),
                                got: format!("array of {}", json_type_name(item)),
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    answers.insert(key.clone(), AnswerValue::Many(texts));
                }
                other => {
                    let text = scalar_text(other).ok_or_else(|| EvalError::UnsupportedAnswer {
                        key: key.clone(),
                        got: json_type_name(other).to_owned(),
                    })?;
                    answers.insert(key.clone(), AnswerValue::Text(text));
                }
            }
        }
        Ok(answers)
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
