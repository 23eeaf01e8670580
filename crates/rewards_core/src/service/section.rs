use crate::error::RetrievalError;

/// Loaded board section, possibly degraded after a store failure.
///
/// A degraded section holds the empty/zero value and the warning that caused
/// it, so the other sections can still render.
#[derive(Debug)]
pub struct Section<T> {
    pub data: T,
    pub warning: Option<RetrievalError>,
}

impl<T> Section<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            warning: None,
        }
    }

    pub fn degraded(data: T, warning: RetrievalError) -> Self {
        Self {
            data,
            warning: Some(warning),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

impl<T: Default> Section<T> {
    pub fn from_result(result: Result<T, RetrievalError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::degraded(T::default(), err),
        }
    }
}

impl<T: Default> Default for Section<T> {
    fn default() -> Self {
        Self::ok(T::default())
    }
}
