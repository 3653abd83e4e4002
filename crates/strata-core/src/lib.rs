//! Core types and trait definitions for the Strata way-history store.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! (e.g. `strata-store-sqlite`) implement [`store::HistoryStore`]; everything
//! else depends on this abstraction.

pub mod error;
pub mod redaction;
pub mod store;
pub mod validate;
pub mod way;

pub use error::{RedactionError, ValidationError, WriteError};
