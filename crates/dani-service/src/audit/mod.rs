//! Admin access audit trail.

pub mod service;

pub use service::AccessAuditService;
