//! formlift-core: visibility expression compiler and form schema assembly.
//!
//! Turns legacy spreadsheet rows (free-text visibility conditions, lookup
//! names, section hints, grouping markers) into one ordered, internally
//! consistent form schema.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`assemble()`] -- run the full 6-pass pipeline
//! - [`compile_visibility()`] -- compile one expression to DNF rules
//! - [`MappingConfig`] -- column mapping and policy tables
//! - [`RowRecord`] / [`bind_rows()`] -- typed input rows
//! - [`ConvertError`] / [`ExprError`] -- error types
//! - Model types: [`FormSchema`], [`Field`], [`Section`], [`Condition`],
//!   [`Rule`], [`VisibilityExpression`]
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod assemble;
pub mod compile;
pub mod config;
pub mod error;
pub mod lexer;
pub mod model;
pub mod pass1_rows;
pub mod pass2_index;
pub mod pass3_groups;
pub mod pass4_overrides;
pub mod pass5_canonicalize;
pub mod pass6_sections;
pub mod rows;
pub mod summary;
pub mod text;

// ── Convenience re-exports: key types ────────────────────────────────

pub use assemble::Assembly;
pub use compile::{Compiled, DropReason, DroppedFragment};
pub use config::MappingConfig;
pub use error::{ConvertError, ExprError};
pub use lexer::OperatorTable;
pub use model::{
    ComplexGroup, Condition, Field, FieldStyle, FieldType, FormSchema, LookupOption, LookupTable,
    Operator, Rule, Section, Validation, VisibilityExpression,
};
pub use rows::RowRecord;
pub use summary::{ExclusionReason, RunSummary};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use assemble::assemble;
pub use compile::{compile_visibility, compile_visibility_audited};
pub use pass1_rows::intake_rows;
pub use pass2_index::build_index;
pub use pass3_groups::resolve_groups;
pub use pass4_overrides::apply_overrides;
pub use pass5_canonicalize::canonicalize;
pub use pass6_sections::build_sections;
pub use rows::bind_rows;
