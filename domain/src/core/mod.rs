//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: identifier of the backend model to generate with
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
