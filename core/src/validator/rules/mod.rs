//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `identifiers.rs` - Stems, names and variable names that EDSL can't express
//! - `variables.rs` - Duplicate and shadowed locals/parameters
//! - `time_tags.rs` - Time tags that can't be rendered as a prefix
//! - `requests.rs` - Requests without steps

mod identifiers;
mod requests;
mod time_tags;
mod variables;

pub use identifiers::{InvalidIdentifierRule, MissingNameRule};
pub use requests::EmptyRequestRule;
pub use time_tags::InvalidTimeTagRule;
pub use variables::{DuplicateVariableRule, ShadowedVariableRule};
