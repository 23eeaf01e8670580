//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented contracts for the task catalog, the completion
//!   ledger and the external points view.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories refuse connections whose schema is not migrated.
//! - Store failures surface as `RepoError`, never as panics.

pub mod catalog_repo;
pub mod completion_repo;
pub mod error;
pub mod points_view_repo;
pub(crate) mod schema;
