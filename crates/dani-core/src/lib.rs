//! # dani-core
//!
//! Core crate for the DANI execution log subsystem. Contains configuration
//! schemas, pagination/sorting/filter-expression types, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other DANI crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
