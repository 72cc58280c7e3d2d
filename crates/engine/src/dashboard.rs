use serde::{Deserialize, Serialize};
use tracing::debug;

use sitedeck_core::analytics::{DateRange, Insight, MetricsRow, MetricsSeries, generate_insights};

use crate::error::EngineError;

/// Read-only provider of daily site metrics.
pub trait AnalyticsSource {
    fn fetch(&self, range: DateRange) -> Result<Vec<MetricsRow>, EngineError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub range: DateRange,
    pub series: MetricsSeries,
    pub insights: Vec<Insight>,
}

pub struct Dashboard<S> {
    source: S,
}

impl<S: AnalyticsSource> Dashboard<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn summary(&self, range: DateRange) -> Result<DashboardSummary, EngineError> {
        let rows: Vec<MetricsRow> = self
            .source
            .fetch(range)?
            .into_iter()
            .filter(|row| range.contains(row.date))
            .collect();
        debug!(start = %range.start, end = %range.end, rows = rows.len(), "building dashboard");
        Ok(DashboardSummary {
            range,
            series: MetricsSeries::from_rows(&rows),
            insights: generate_insights(&rows),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sitedeck_core::analytics::EngagementTier;

    struct FixedSource(Vec<MetricsRow>);

    impl AnalyticsSource for FixedSource {
        fn fetch(&self, _range: DateRange) -> Result<Vec<MetricsRow>, EngineError> {
            Ok(self.0.clone())
        }
    }

    struct DownSource;

    impl AnalyticsSource for DownSource {
        fn fetch(&self, _range: DateRange) -> Result<Vec<MetricsRow>, EngineError> {
            Err(EngineError::Analytics("quota exhausted".into()))
        }
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, n).unwrap()
    }

    fn row(n: u32) -> MetricsRow {
        MetricsRow {
            date: day(n),
            sessions: 200,
            engaged_sessions: 150,
            active_users: 120,
            page_views: 640,
            avg_session_secs: 75.0,
        }
    }

    #[test]
    fn summary_drops_rows_outside_range() {
        let rows = (1..=10).map(row).collect();
        let dashboard = Dashboard::new(FixedSource(rows));
        let range = DateRange::last_days(day(10), 7).unwrap();
        let summary = dashboard.summary(range).unwrap();
        assert_eq!(summary.series.len(), 7);
        assert_eq!(summary.series.dates[0], day(4));
        assert!(matches!(
            summary.insights[0],
            Insight::Engagement { tier: EngagementTier::Positive, .. }
        ));
    }

    #[test]
    fn source_failure_propagates() {
        let dashboard = Dashboard::new(DownSource);
        let range = DateRange::last_days(day(10), 7).unwrap();
        let err = dashboard.summary(range).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    }
}
