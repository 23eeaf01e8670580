//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into catalog, ledger and aggregate
//!   use-cases.
//! - Convert store failures into `RetrievalError` at the boundary.
//! - Keep CLI layers decoupled from storage details.

pub mod board;
pub mod catalog_service;
pub mod ledger_service;
pub mod points_aggregator;
pub mod section;
