//! Use cases (application services)
//!
//! - [`converse`]: stream a model response to one user input

pub mod converse;
