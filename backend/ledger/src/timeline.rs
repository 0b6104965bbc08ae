//! # Emissions Timeline
//!
//! Totals per calendar bucket for the "emissions over time" chart.
//!
//! - Monthly buckets are labelled `2024-03`
//! - Quarterly buckets are labelled `2024-Q1`
//! - Yearly buckets are labelled `2024`
//!
//! Buckets use the UTC calendar and come out oldest first. Buckets with no records are omitted.
use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::EmissionWithCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "month" => Ok(Granularity::Monthly),
            "quarterly" | "quarter" => Ok(Granularity::Quarterly),
            "yearly" | "year" => Ok(Granularity::Yearly),
            other => Err(format!("Unknown granularity: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub period: String,
    pub amount: Decimal,
}

/// Sort key of a bucket: (year, index within the year).
fn bucket(date: DateTime<Utc>, granularity: Granularity) -> (i32, u32) {
    match granularity {
        Granularity::Monthly => (date.year(), date.month()),
        Granularity::Quarterly => (date.year(), (date.month() - 1) / 3 + 1),
        Granularity::Yearly => (date.year(), 0),
    }
}

fn label((year, index): (i32, u32), granularity: Granularity) -> String {
    match granularity {
        Granularity::Monthly => format!("{year:04}-{index:02}"),
        Granularity::Quarterly => format!("{year:04}-Q{index}"),
        Granularity::Yearly => format!("{year:04}"),
    }
}

pub fn timeline<I>(records: I, granularity: Granularity) -> Vec<TimelinePoint>
where
    I: IntoIterator<Item = (DateTime<Utc>, Decimal)>,
{
    let mut buckets: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();

    for (date, amount) in records {
        let sum = buckets.entry(bucket(date, granularity)).or_default();
        *sum = sum.saturating_add(amount);
    }

    buckets
        .into_iter()
        .map(|(key, amount)| TimelinePoint {
            period: label(key, granularity),
            amount,
        })
        .collect()
}

pub fn emissions_timeline(
    emissions: &[EmissionWithCategory],
    granularity: Granularity,
) -> Vec<TimelinePoint> {
    timeline(
        emissions
            .iter()
            .map(|record| (record.emission.date, record.emission.amount)),
        granularity,
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn points() -> Vec<(DateTime<Utc>, Decimal)> {
        vec![
            (at(2024, 3, 2), Decimal::new(250, 2)),
            (at(2023, 12, 31), Decimal::new(1, 0)),
            (at(2024, 1, 15), Decimal::new(4, 0)),
            (at(2024, 3, 30), Decimal::new(150, 2)),
            (at(2024, 4, 1), Decimal::new(2, 0)),
        ]
    }

    #[test]
    fn test_monthly() {
        let result = timeline(points(), Granularity::Monthly);
        let periods: Vec<&str> = result.iter().map(|p| p.period.as_str()).collect();

        assert_eq!(periods, vec!["2023-12", "2024-01", "2024-03", "2024-04"]);
        assert_eq!(result[2].amount, Decimal::new(4, 0));
    }

    #[test]
    fn test_quarterly() {
        let result = timeline(points(), Granularity::Quarterly);

        assert_eq!(
            result,
            vec![
                TimelinePoint {
                    period: "2023-Q4".to_string(),
                    amount: Decimal::new(1, 0),
                },
                TimelinePoint {
                    period: "2024-Q1".to_string(),
                    amount: Decimal::new(8, 0),
                },
                TimelinePoint {
                    period: "2024-Q2".to_string(),
                    amount: Decimal::new(2, 0),
                },
            ]
        );
    }

    #[test]
    fn test_yearly() {
        let result = timeline(points(), Granularity::Yearly);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].period, "2023");
        assert_eq!(result[1].amount, Decimal::new(10, 0));
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let points = timeline([(date, Decimal::MAX), (date, Decimal::MAX)], Granularity::Yearly);

        assert_eq!(points[0].amount, Decimal::MAX);
    }

    #[test]
    fn test_empty() {
        assert!(timeline(Vec::new(), Granularity::Monthly).is_empty());
    }

    #[test]
    fn test_granularity_parsing() {
        assert_eq!("Quarterly".parse(), Ok(Granularity::Quarterly));
        assert_eq!(" year ".parse(), Ok(Granularity::Yearly));
        assert!("weekly".parse::<Granularity>().is_err());
    }
}
