//! Collaborator clients for Lexicon: the data catalog and the LLM endpoint.
//!
//! Both are exposed as async traits so the router can be driven by stubs in
//! tests and by the reqwest-backed implementations at runtime.

pub mod catalog;
pub mod error;
pub mod llm;

pub use catalog::{build_catalog, CatalogClient, HttpCatalogClient, OfflineCatalog};
pub use error::{CatalogError, LlmError};
pub use llm::{build_llm, DisabledLlm, HistoryEntry, HttpLlmClient, LlmClassification, LlmClient};
