//! Form visibility evaluator -- accepts an assembled form schema + answers,
//! produces the set of fields a respondent would see.
//!
//! Rules are evaluated in their compiled DNF shape. Conversion already
//! canonicalized rule values, so comparison is case-insensitive text
//! equality.

pub mod answers;
pub mod visibility;

pub use answers::{AnswerValue, Answers, EvalError};
pub use visibility::{condition_holds, expression_visible, visible_fields};

/// Evaluate a schema against an answers JSON object.
///
/// This is the top-level public API: read the answers, then return the
/// visible field keys in schema order.
pub fn evaluate(
    schema: &formlift_core::FormSchema,
    answers: &serde_json::Value,
) -> Result<Vec<String>, EvalError> {
    let answers = Answers::from_json(answers)?;
    Ok(visible_fields(schema, &answers))
}
