//! Infrastructure layer for cross-cutting concerns.
//!
//! Error handling and result types, plus configuration for the external
//! extending/publications services.

pub mod config;
pub mod error;
