//! # dani-entity
//!
//! Domain models for the DANI execution log subsystem. Every struct in this
//! crate represents a database table row, a nested JSONB document, or a
//! domain value object. Row types additionally derive `sqlx::FromRow`.

pub mod audit;
pub mod execution_log;
