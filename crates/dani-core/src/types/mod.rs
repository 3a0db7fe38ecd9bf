//! Core type definitions used across the DANI workspace.

pub mod filter;
pub mod pagination;
pub mod sorting;

pub use filter::{FilterField, FilterOp, FilterValue};
pub use pagination::{PageRequest, PageResponse};
pub use sorting::SortDirection;
