//! Listing filters shared by every storage backend.
use chrono::{DateTime, Utc};

use crate::models::{EmissionWithCategory, HelpArticle, Id, Scope, SupportTicket, TicketStatus};

/// Inclusive period. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmissionFilter {
    pub range: DateRange,
    pub scope: Option<Scope>,
}

impl EmissionFilter {
    pub fn matches(&self, record: &EmissionWithCategory) -> bool {
        self.range.contains(record.emission.date)
            && self.scope.is_none_or(|scope| record.category.scope == scope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &SupportTicket) -> bool {
        self.status.is_none_or(|status| ticket.status == status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArticleFilter {
    pub category_id: Option<Id>,
    pub published: Option<bool>,
}

impl ArticleFilter {
    pub fn matches(&self, article: &HelpArticle) -> bool {
        self.category_id
            .is_none_or(|category_id| article.category_id == Some(category_id))
            && self
                .published
                .is_none_or(|published| article.is_published == published)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = DateRange::between(day(1), day(10));

        assert!(range.contains(day(1)));
        assert!(range.contains(day(10)));
        assert!(range.contains(day(5)));
        assert!(!range.contains(day(11)));
    }

    #[test]
    fn test_open_bounds() {
        assert!(DateRange::default().contains(day(20)));
        assert!(DateRange::new(Some(day(3)), None).contains(day(30)));
        assert!(!DateRange::new(Some(day(3)), None).contains(day(2)));
        assert!(DateRange::new(None, Some(day(3))).contains(day(1)));
    }

    #[test]
    fn test_inverted_range_is_invalid() {
        assert!(!DateRange::between(day(9), day(2)).is_valid());
        assert!(DateRange::between(day(2), day(2)).is_valid());
        assert!(DateRange::new(Some(day(9)), None).is_valid());
    }
}
