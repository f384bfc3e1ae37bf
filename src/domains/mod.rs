//! Domains module containing business logic organized by bounded contexts.
//!
//! The operator exposes a single domain: tools that adapt external services.

pub mod tools;
