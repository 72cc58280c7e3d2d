use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const POSITIVE_ENGAGEMENT: f64 = 0.70;
const NEUTRAL_ENGAGEMENT: f64 = 0.40;
const TREND_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidData(format!(
                "date range starts after it ends: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending at (and including) `end`.
    pub fn last_days(end: NaiveDate, days: u32) -> Result<Self, CoreError> {
        if days == 0 {
            return Err(CoreError::InvalidData("date range must cover at least one day".into()));
        }
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .ok_or_else(|| CoreError::InvalidData(format!("{days} days before {end} is out of range")))?;
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub date: NaiveDate,
    pub sessions: u64,
    pub engaged_sessions: u64,
    pub active_users: u64,
    pub page_views: u64,
    pub avg_session_secs: f64,
}

impl MetricsRow {
    pub fn engagement_rate(&self) -> Option<f64> {
        (self.sessions > 0).then(|| self.engaged_sessions as f64 / self.sessions as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTotals {
    pub sessions: u64,
    pub engaged_sessions: u64,
    pub active_users: u64,
    pub page_views: u64,
}

/// Column-oriented view of daily rows, ready for charting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSeries {
    pub dates: Vec<NaiveDate>,
    pub sessions: Vec<u64>,
    pub engaged_sessions: Vec<u64>,
    pub active_users: Vec<u64>,
    pub page_views: Vec<u64>,
    pub avg_session_secs: Vec<f64>,
    pub totals: MetricTotals,
}

impl MetricsSeries {
    pub fn from_rows(rows: &[MetricsRow]) -> Self {
        let mut sorted: Vec<&MetricsRow> = rows.iter().collect();
        sorted.sort_by_key(|row| row.date);

        let mut series = Self::default();
        for row in sorted {
            series.dates.push(row.date);
            series.sessions.push(row.sessions);
            series.engaged_sessions.push(row.engaged_sessions);
            series.active_users.push(row.active_users);
            series.page_views.push(row.page_views);
            series.avg_session_secs.push(row.avg_session_secs);
            series.totals.sessions += row.sessions;
            series.totals.engaged_sessions += row.engaged_sessions;
            series.totals.active_users += row.active_users;
            series.totals.page_views += row.page_views;
        }
        series
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Mean of the per-day engagement ratios, skipping days without sessions.
pub fn engagement_rate(rows: &[MetricsRow]) -> Option<f64> {
    let rates: Vec<f64> = rows.iter().filter_map(MetricsRow::engagement_rate).collect();
    if rates.is_empty() {
        return None;
    }
    Some(rates.iter().sum::<f64>() / rates.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementTier {
    Positive,
    Neutral,
    Negative,
}

impl EngagementTier {
    pub fn classify(rate: f64) -> Self {
        if rate > POSITIVE_ENGAGEMENT {
            Self::Positive
        } else if rate >= NEUTRAL_ENGAGEMENT {
            Self::Neutral
        } else {
            Self::Negative
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficTrend {
    Growing,
    Steady,
    Declining,
}

/// Compare sessions in the later half of the period against the earlier half.
pub fn traffic_trend(rows: &[MetricsRow]) -> Option<TrafficTrend> {
    if rows.len() < 2 {
        return None;
    }
    let mut sorted: Vec<&MetricsRow> = rows.iter().collect();
    sorted.sort_by_key(|row| row.date);
    let (early, late) = sorted.split_at(sorted.len() / 2);
    let early_avg = early.iter().map(|r| r.sessions as f64).sum::<f64>() / early.len() as f64;
    let late_avg = late.iter().map(|r| r.sessions as f64).sum::<f64>() / late.len() as f64;
    if early_avg == 0.0 {
        return Some(if late_avg > 0.0 {
            TrafficTrend::Growing
        } else {
            TrafficTrend::Steady
        });
    }
    let change = (late_avg - early_avg) / early_avg;
    Some(if change > TREND_THRESHOLD {
        TrafficTrend::Growing
    } else if change < -TREND_THRESHOLD {
        TrafficTrend::Declining
    } else {
        TrafficTrend::Steady
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    Engagement { tier: EngagementTier, rate: f64 },
    Traffic { trend: TrafficTrend },
    NoData,
}

impl Insight {
    pub fn message(&self) -> String {
        match self {
            Self::Engagement { tier, rate } => {
                let pct = rate * 100.0;
                match tier {
                    EngagementTier::Positive => {
                        format!("Visitors are highly engaged ({pct:.0}% engaged sessions).")
                    }
                    EngagementTier::Neutral => {
                        format!("Engagement is moderate ({pct:.0}% engaged sessions).")
                    }
                    EngagementTier::Negative => {
                        format!("Engagement is low ({pct:.0}% engaged sessions); review landing content.")
                    }
                }
            }
            Self::Traffic { trend } => match trend {
                TrafficTrend::Growing => "Traffic is growing over the period.".to_string(),
                TrafficTrend::Steady => "Traffic is steady over the period.".to_string(),
                TrafficTrend::Declining => "Traffic is declining over the period.".to_string(),
            },
            Self::NoData => "No analytics data for this period.".to_string(),
        }
    }
}

pub fn generate_insights(rows: &[MetricsRow]) -> Vec<Insight> {
    let mut insights = Vec::new();
    if let Some(rate) = engagement_rate(rows) {
        insights.push(Insight::Engagement {
            tier: EngagementTier::classify(rate),
            rate,
        });
    }
    if let Some(trend) = traffic_trend(rows) {
        insights.push(Insight::Traffic { trend });
    }
    if insights.is_empty() {
        insights.push(Insight::NoData);
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, n).unwrap()
    }

    fn row(n: u32, sessions: u64, engaged: u64) -> MetricsRow {
        MetricsRow {
            date: day(n),
            sessions,
            engaged_sessions: engaged,
            active_users: sessions / 2,
            page_views: sessions * 3,
            avg_session_secs: 42.0,
        }
    }

    #[test]
    fn seven_days_at_three_quarters_is_positive() {
        let rows: Vec<MetricsRow> = (1..=7).map(|n| row(n, 100, 75)).collect();
        let insights = generate_insights(&rows);
        let Insight::Engagement { tier, rate } = &insights[0] else {
            panic!("expected engagement insight first");
        };
        assert_eq!(*tier, EngagementTier::Positive);
        assert!((rate - 0.75).abs() < 1e-9);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(EngagementTier::classify(0.70), EngagementTier::Neutral);
        assert_eq!(EngagementTier::classify(0.7001), EngagementTier::Positive);
        assert_eq!(EngagementTier::classify(0.40), EngagementTier::Neutral);
        assert_eq!(EngagementTier::classify(0.39), EngagementTier::Negative);
    }

    #[test]
    fn zero_session_days_are_skipped() {
        let rows = vec![row(1, 0, 0), row(2, 10, 5)];
        assert_eq!(engagement_rate(&rows), Some(0.5));
    }

    #[test]
    fn empty_rows_yield_no_data() {
        assert_eq!(generate_insights(&[]), vec![Insight::NoData]);
    }

    #[test]
    fn trend_detection() {
        let growing: Vec<MetricsRow> = (1..=4).map(|n| row(n, u64::from(n) * 100, 10)).collect();
        assert_eq!(traffic_trend(&growing), Some(TrafficTrend::Growing));
        let declining: Vec<MetricsRow> = (1..=4).map(|n| row(n, 500 - u64::from(n) * 100, 10)).collect();
        assert_eq!(traffic_trend(&declining), Some(TrafficTrend::Declining));
        let steady: Vec<MetricsRow> = (1..=4).map(|n| row(n, 100, 10)).collect();
        assert_eq!(traffic_trend(&steady), Some(TrafficTrend::Steady));
        assert_eq!(traffic_trend(&steady[..1]), None);
    }

    #[test]
    fn series_is_sorted_with_totals() {
        let rows = vec![row(3, 30, 1), row(1, 10, 1), row(2, 20, 1)];
        let series = MetricsSeries::from_rows(&rows);
        assert_eq!(series.dates, vec![day(1), day(2), day(3)]);
        assert_eq!(series.sessions, vec![10, 20, 30]);
        assert_eq!(series.totals.sessions, 60);
        assert_eq!(series.totals.page_views, 180);
    }

    #[test]
    fn last_days_is_inclusive() {
        let range = DateRange::last_days(day(7), 7).unwrap();
        assert_eq!(range.start, day(1));
        assert_eq!(range.days(), 7);
        assert!(range.contains(day(4)));
        assert!(!range.contains(day(8)));
        assert!(DateRange::last_days(day(7), 0).is_err());
        assert!(DateRange::new(day(2), day(1)).is_err());
    }

    #[test]
    fn last_days_past_calendar_start_is_error() {
        let result = DateRange::last_days(day(1), u32::MAX);
        assert!(matches!(result, Err(CoreError::InvalidData(_))));
    }
}
