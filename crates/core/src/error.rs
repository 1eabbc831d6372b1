use serde::{Deserialize, Serialize};

/// A fatal conversion error. Aborts the run before any output is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("pass {pass}: {message}")]
pub struct ConvertError {
    pub pass: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    pub message: String,
}

impl ConvertError {
    pub fn new(
        pass: u8,
        field_key: Option<&str>,
        row: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        ConvertError {
            pass,
            field_key: field_key.map(str::to_owned),
            row,
            message: message.into(),
        }
    }

    pub fn duplicate_key(key: &str, first_row: u32, second_row: u32) -> Self {
        ConvertError::new(
            2,
            Some(key),
            Some(second_row),
            format!(
                "duplicate field key '{}': first declared at row {}, again at row {}",
                key, first_row, second_row
            ),
        )
    }

    /// Serialize to JSON with every field present (null for missing).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "field_key": self.field_key,
            "message":   self.message,
            "pass":      self.pass,
            "row":       self.row,
        })
    }
}

/// Input the visibility compiler refuses to interpret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// Parenthesized grouping outside quoted literals. Only flat
    /// AND-within-OR expressions are understood.
    #[error("parenthesized grouping is not supported: {expression}")]
    UnsupportedParentheses { expression: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_names_both_rows() {
        let err = ConvertError::duplicate_key("GENname", 4, 9);
        assert_eq!(err.pass, 2);
        assert_eq!(err.row, Some(9));
        assert!(err.message.contains("row 4"));
        assert!(err.to_string().starts_with("pass 2:"));
    }

    #[test]
    fn json_value_keeps_null_fields() {
        let err = ConvertError::new(1, None, None, "boom");
        let v = err.to_json_value();
        assert!(v["field_key"].is_null());
        assert!(v["row"].is_null());
        assert_eq!(v["message"], "boom");
    }
}
