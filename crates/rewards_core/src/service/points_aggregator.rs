//! Points aggregator.
//!
//! # Responsibility
//! - Derive the user's cumulative point total.
//! - Reconcile against the external aggregate view when it exists.
//! - Hold the last published total and suppress no-op updates.
//!
//! # Invariants
//! - An existing view is authoritative; a missing row means 0.
//! - Without a usable view the total is the sum of `task_points` over the
//!   ledger history (unknown tasks contribute 0).
//! - `refresh` only replaces the stored total when the value changed.

use crate::error::RetrievalError;
use crate::model::completion::CompletionRecord;
use crate::repo::points_view_repo::{AggregateLookup, PointsViewRepository};
use log::{debug, warn};
use serde::Serialize;

/// Where a computed total came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalSource {
    View,
    Ledger,
}

#[derive(Debug)]
pub struct TotalComputation {
    pub total: u64,
    pub source: TotalSource,
    /// View failure that forced the ledger fallback, if any.
    pub warning: Option<RetrievalError>,
}

/// Result of publishing a recomputed total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalUpdate {
    pub total: u64,
    pub source: TotalSource,
    pub changed: bool,
}

pub struct PointsAggregator<V: PointsViewRepository> {
    view: Option<V>,
    current: Option<u64>,
}

impl<V: PointsViewRepository> PointsAggregator<V> {
    /// `view = None` always sums the ledger.
    pub fn new(view: Option<V>) -> Self {
        Self {
            view,
            current: None,
        }
    }

    /// Last published total, 0 before the first refresh.
    pub fn current_total(&self) -> u64 {
        self.current.unwrap_or(0)
    }

    /// Computes the total for `user_id` without publishing it.
    ///
    /// `history` is the user's ledger join and is only used when no view can
    /// be read.
    pub fn compute_total(&self, user_id: &str, history: &[CompletionRecord]) -> TotalComputation {
        let mut warning = None;

        if let Some(view) = &self.view {
            match read_view(view, user_id) {
                Ok(Some(lookup)) => {
                    if lookup == AggregateLookup::Miss {
                        debug!("event=total_compute module=service status=ok source=view lookup=miss");
                    }
                    return TotalComputation {
                        total: lookup.total(),
                        source: TotalSource::View,
                        warning: None,
                    };
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "event=total_compute module=service status=warn source=view fallback=ledger error={err}"
                    );
                    warning = Some(err);
                }
            }
        }

        TotalComputation {
            total: sum_points(history),
            source: TotalSource::Ledger,
            warning,
        }
    }

    /// Publishes `computation`, reporting whether the stored value changed.
    pub fn refresh(&mut self, computation: &TotalComputation) -> TotalUpdate {
        let changed = self.current != Some(computation.total);
        if changed {
            debug!(
                "event=total_compute module=service status=ok previous={:?} total={} source={:?}",
                self.current, computation.total, computation.source
            );
            self.current = Some(computation.total);
        }
        TotalUpdate {
            total: computation.total,
            source: computation.source,
            changed,
        }
    }
}

/// Sums the points earned over a completion history.
pub fn sum_points(history: &[CompletionRecord]) -> u64 {
    history
        .iter()
        .map(|record| u64::from(record.points_earned()))
        .sum()
}

// Ok(None) means the view does not exist in the store.
fn read_view<V: PointsViewRepository>(
    view: &V,
    user_id: &str,
) -> Result<Option<AggregateLookup>, RetrievalError> {
    let available = view
        .is_available()
        .map_err(|err| RetrievalError::new("points_view_lookup", err))?;
    if !available {
        return Ok(None);
    }
    view.lookup_total(user_id)
        .map(Some)
        .map_err(|err| RetrievalError::new("points_view_lookup", err))
}

#[cfg(test)]
mod tests {
    use super::{sum_points, PointsAggregator, TotalSource};
    use crate::model::completion::{CompletionEvent, CompletionRecord};
    use crate::repo::error::{RepoError, RepoResult};
    use crate::repo::points_view_repo::{AggregateLookup, PointsViewRepository};
    use chrono::{TimeZone, Utc};

    enum FakeView {
        Missing,
        Row(u64),
        NoRow,
        Broken,
    }

    impl PointsViewRepository for FakeView {
        fn is_available(&self) -> RepoResult<bool> {
            Ok(!matches!(self, Self::Missing))
        }

        fn lookup_total(&self, _user_id: &str) -> RepoResult<AggregateLookup> {
            match self {
                Self::Row(total) => Ok(AggregateLookup::Found(*total)),
                Self::NoRow | Self::Missing => Ok(AggregateLookup::Miss),
                Self::Broken => Err(RepoError::Unavailable("view offline".to_string())),
            }
        }
    }

    fn record(id: i64, points: Option<u32>) -> CompletionRecord {
        CompletionRecord {
            event: CompletionEvent {
                id,
                task_id: id,
                user_id: "Ben".to_string(),
                completed_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            },
            task_name: points.map(|_| format!("task {id}")),
            task_points: points,
        }
    }

    #[test]
    fn unknown_tasks_contribute_zero() {
        let history = vec![record(1, Some(50)), record(2, None), record(3, Some(25))];
        assert_eq!(sum_points(&history), 75);
    }

    #[test]
    fn view_row_is_authoritative() {
        let aggregator = PointsAggregator::new(Some(FakeView::Row(7500)));
        let computed = aggregator.compute_total("Ben", &[record(1, Some(50))]);
        assert_eq!(computed.total, 7500);
        assert_eq!(computed.source, TotalSource::View);
    }

    #[test]
    fn view_miss_is_zero_not_error() {
        let aggregator = PointsAggregator::new(Some(FakeView::NoRow));
        let computed = aggregator.compute_total("Ben", &[record(1, Some(50))]);
        assert_eq!(computed.total, 0);
        assert_eq!(computed.source, TotalSource::View);
        assert!(computed.warning.is_none());
    }

    #[test]
    fn missing_view_falls_back_to_ledger() {
        let aggregator = PointsAggregator::new(Some(FakeView::Missing));
        let computed = aggregator.compute_total("Ben", &[record(1, Some(50))]);
        assert_eq!(computed.total, 50);
        assert_eq!(computed.source, TotalSource::Ledger);
        assert!(computed.warning.is_none());
    }

    #[test]
    fn broken_view_falls_back_with_warning() {
        let aggregator = PointsAggregator::new(Some(FakeView::Broken));
        let computed = aggregator.compute_total("Ben", &[record(1, Some(50))]);
        assert_eq!(computed.total, 50);
        assert_eq!(computed.source, TotalSource::Ledger);
        assert_eq!(computed.warning.unwrap().operation, "points_view_lookup");
    }

    #[test]
    fn refresh_suppresses_unchanged_values() {
        let mut aggregator = PointsAggregator::<FakeView>::new(None);
        assert_eq!(aggregator.current_total(), 0);

        let history = vec![record(1, Some(50))];
        let computed = aggregator.compute_total("Ben", &history);
        let first = aggregator.refresh(&computed);
        assert!(first.changed);
        assert_eq!(first.total, 50);

        let computed = aggregator.compute_total("Ben", &history);
        let second = aggregator.refresh(&computed);
        assert!(!second.changed);
        assert_eq!(second.total, first.total);
        assert_eq!(aggregator.current_total(), 50);
    }

    #[test]
    fn first_refresh_of_zero_counts_as_change() {
        let mut aggregator = PointsAggregator::<FakeView>::new(None);
        let computed = aggregator.compute_total("Ben", &[]);
        let update = aggregator.refresh(&computed);
        assert!(update.changed);
        assert_eq!(update.total, 0);
    }
}
