//! Shared types and models for the GTM workshop administration system
//!
//! This crate contains the records, validation rules and report computations
//! shared between the backend and the browser bindings (via WASM).

pub mod decode;
pub mod filters;
pub mod models;
pub mod report;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
