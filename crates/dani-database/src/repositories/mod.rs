//! PostgreSQL repository implementations.

pub mod audit;
pub mod execution_log;

pub use audit::AccessAuditRepository;
pub use execution_log::ExecutionLogRepository;
