//! # dani-database
//!
//! PostgreSQL connection management, the execution log query builder, and
//! the store implementations (PostgreSQL and in-memory) behind the
//! [`store::ExecutionLogStore`] and [`store::AccessAuditStore`] traits.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod query;
pub mod repositories;
pub mod store;

pub use memory::{MemoryAccessAuditStore, MemoryExecutionLogStore};
pub use repositories::{AccessAuditRepository, ExecutionLogRepository};
pub use store::{AccessAuditStore, ExecutionLogStore};
