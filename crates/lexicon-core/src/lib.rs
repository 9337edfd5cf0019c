//! Shared domain records, configuration, and errors for Lexicon.

pub mod config;
pub mod error;
pub mod types;

pub use config::LexiconConfig;
pub use error::{LexiconError, Result};
pub use types::*;
