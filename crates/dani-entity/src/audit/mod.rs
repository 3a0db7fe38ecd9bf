//! Admin access audit models.

pub mod model;

pub use model::{AccessAction, AdminAccessEvent, CreateAdminAccessEvent};
