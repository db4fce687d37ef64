pub mod cli;
pub mod config;
pub mod dictionary;
pub mod parser;
pub mod translator;
pub mod types;
pub mod validator;

// Re-export main types
pub use types::*;

// Re-export the translation API for convenience
pub use dictionary::{CommandDictionary, StaticDictionary};
pub use parser::parse_edsl;
pub use translator::{translate_many, translate_one, TranslateError, Translator};
