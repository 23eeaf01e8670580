//! Domain model for the reward-points tracker.
//!
//! # Responsibility
//! - Define the catalog, ledger and goal records shared by repositories and
//!   services.
//! - Keep day-boundary and progress arithmetic pure and storage-agnostic.
//!
//! # Invariants
//! - Completion events are immutable once created.
//! - Day boundaries are UTC for both dedup checks and stored day keys.

pub mod completion;
pub mod goal;
pub mod task;
