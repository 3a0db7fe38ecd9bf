//! Execution log query construction.
//!
//! [`column`] maps filter fields onto SQL expressions over the JSONB
//! payload; [`builder`] renders predicates into parameterized statements.
//! Caller-supplied values only ever reach the database as bind parameters.

pub mod builder;
pub mod column;

pub use builder::LogQuery;
pub use column::{LogColumn, log_predicates};
