//! PROPLINE — Player Proposition Entry Pipeline
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod sources;
pub mod pricing;
pub mod combos;
pub mod submit;
pub mod storage;
