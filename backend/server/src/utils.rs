use chrono::{DateTime, NaiveDate, Utc};
use ledger::{
    filter::DateRange,
    models::{Scope, TicketStatus},
    timeline::Granularity,
    validate::Violations,
};
use serde::Deserialize;

use crate::error::AppError;

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid {field}: {value:?}")))
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub scope: Option<String>,
    pub granularity: Option<String>,
}

impl PeriodQuery {
    pub fn range(&self) -> Result<DateRange, AppError> {
        let start = blank_to_none(self.start_date.as_deref())
            .map(|value| parse_date("startDate", value))
            .transpose()?;
        let end = blank_to_none(self.end_date.as_deref())
            .map(|value| parse_date("endDate", value))
            .transpose()?;

        let range = DateRange::new(start, end);
        if !range.is_valid() {
            return Err(Violations::single("endDate", "End date must not be before start date").into());
        }

        Ok(range)
    }

    pub fn scope(&self) -> Result<Option<Scope>, AppError> {
        blank_to_none(self.scope.as_deref())
            .map(|value| {
                value
                    .parse::<Scope>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))
            })
            .transpose()
    }

    pub fn granularity(&self) -> Result<Granularity, AppError> {
        match blank_to_none(self.granularity.as_deref()) {
            Some(value) => value.parse::<Granularity>().map_err(AppError::BadRequest),
            None => Ok(Granularity::default()),
        }
    }
}

/// `all`, blank or absent mean no filter.
pub fn parse_ticket_status(value: Option<&str>) -> Result<Option<TicketStatus>, AppError> {
    match blank_to_none(value).map(str::to_lowercase).as_deref() {
        None | Some("all") => Ok(None),
        Some("open") => Ok(Some(TicketStatus::Open)),
        Some("closed") => Ok(Some(TicketStatus::Closed)),
        Some(other) => Err(AppError::BadRequest(format!("Unknown ticket status: {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_date_forms() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();

        assert_eq!(parse_date("startDate", "2024-03-15").unwrap(), midnight);
        assert_eq!(parse_date("startDate", "2024-03-15T00:00:00Z").unwrap(), midnight);
        assert_eq!(
            parse_date("startDate", "2024-03-15T02:00:00+02:00").unwrap(),
            midnight
        );
        assert!(parse_date("startDate", "15/03/2024").is_err());
    }

    #[test]
    fn test_inverted_period_is_rejected() {
        let query = PeriodQuery {
            start_date: Some("2024-06-01".into()),
            end_date: Some("2024-01-01".into()),
            ..Default::default()
        };

        assert!(matches!(query.range(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_params_are_ignored() {
        let query = PeriodQuery {
            start_date: Some(" ".into()),
            scope: Some(String::new()),
            ..Default::default()
        };

        assert_eq!(query.range().unwrap(), DateRange::default());
        assert_eq!(query.scope().unwrap(), None);
        assert_eq!(query.granularity().unwrap(), Granularity::Monthly);
    }

    #[test]
    fn test_ticket_status() {
        assert_eq!(parse_ticket_status(None).unwrap(), None);
        assert_eq!(parse_ticket_status(Some("all")).unwrap(), None);
        assert_eq!(
            parse_ticket_status(Some("Closed")).unwrap(),
            Some(TicketStatus::Closed)
        );
        assert!(parse_ticket_status(Some("pending")).is_err());
    }
}
