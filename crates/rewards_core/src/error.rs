//! Boundary error for store interactions.
//!
//! Services convert every `RepoError` into a `RetrievalError` tagged with the
//! operation that failed. Callers degrade the affected section to an
//! empty/zero state and keep the rest of the board functional.

use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub struct RetrievalError {
    pub operation: &'static str,
    pub source: RepoError,
}

impl RetrievalError {
    pub fn new(operation: &'static str, source: RepoError) -> Self {
        Self { operation, source }
    }
}

impl Display for RetrievalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.source)
    }
}

impl Error for RetrievalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
