//! # Validation
//!
//! Payload rules, checked before anything touches storage.
//!
//! Every rule of a payload is evaluated so a client gets all problems in one round trip.
//!
//! | Field | Rule |
//! |---|---|
//! | username | at least 3 characters |
//! | password | at least 6 characters |
//! | email | `local@domain.tld` |
//! | company name | at least 2 characters |
//! | emission amount | strictly positive, at most [`MAX_AMOUNT`] (10^12) |
//! | report name | at least 3 characters |
//! | report period | start not after end |
//! | ticket subject, message | not blank |
//! | article slug | lowercase words joined by single dashes |
use std::{fmt, sync::LazyLock};

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::filter::DateRange;

/// Largest accepted emission amount, 10^12 in the record's unit.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());
static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(pub Vec<Violation>);

impl std::error::Error for Violations {}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();

        write!(f, "{}", joined.join(", "))
    }
}

impl Violations {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![Violation {
            field,
            message: message.into(),
        }])
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|v| v.field).collect()
    }
}

#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) -> &mut Self {
        if !ok {
            self.violations.push(Violation {
                field,
                message: message.to_string(),
            });
        }

        self
    }

    pub fn min_len(
        &mut self,
        field: &'static str,
        value: &str,
        min: usize,
        message: &str,
    ) -> &mut Self {
        self.check(value.trim().chars().count() >= min, field, message)
    }

    pub fn not_blank(&mut self, field: &'static str, value: &str, message: &str) -> &mut Self {
        self.min_len(field, value, 1, message)
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(EMAIL.is_match(value.trim()), field, "Please enter a valid email")
    }

    pub fn positive(&mut self, field: &'static str, value: Decimal, message: &str) -> &mut Self {
        self.check(value > Decimal::ZERO, field, message)
    }

    pub fn at_most(
        &mut self,
        field: &'static str,
        value: Decimal,
        max: Decimal,
        message: &str,
    ) -> &mut Self {
        self.check(value <= max, field, message)
    }

    pub fn finish(&mut self) -> Result<(), Violations> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Violations(std::mem::take(&mut self.violations)))
        }
    }
}

pub fn registration(username: &str, password: &str, email: &str) -> Result<(), Violations> {
    Validator::new()
        .min_len("username", username, 3, "Username must be at least 3 characters")
        .check(
            password.chars().count() >= 6,
            "password",
            "Password must be at least 6 characters",
        )
        .email("email", email)
        .finish()
}

pub fn company_name(name: &str) -> Result<(), Violations> {
    Validator::new()
        .min_len("name", name, 2, "Company name must be at least 2 characters")
        .finish()
}

pub fn emission(amount: Decimal, unit: Option<&str>) -> Result<(), Violations> {
    Validator::new()
        .positive("amount", amount, "Amount must be positive")
        .at_most(
            "amount",
            amount,
            MAX_AMOUNT,
            "Amount must not exceed 1000000000000",
        )
        .check(
            unit.is_none_or(|unit| !unit.trim().is_empty()),
            "unit",
            "Unit must not be empty",
        )
        .finish()
}

pub fn report(name: &str, period: &DateRange) -> Result<(), Violations> {
    Validator::new()
        .min_len("name", name, 3, "Report name must be at least 3 characters")
        .check(
            period.is_valid(),
            "endDate",
            "End date must not be before start date",
        )
        .finish()
}

pub fn ticket(subject: &str) -> Result<(), Violations> {
    Validator::new()
        .not_blank("subject", subject, "Subject is required")
        .finish()
}

pub fn message(body: &str) -> Result<(), Violations> {
    Validator::new()
        .not_blank("message", body, "Message is required")
        .finish()
}

pub fn article(title: &str, slug: &str) -> Result<(), Violations> {
    Validator::new()
        .not_blank("title", title, "Title is required")
        .check(
            is_slug(slug),
            "slug",
            "Slug must be lowercase words joined by dashes",
        )
        .finish()
}

pub fn is_slug(value: &str) -> bool {
    SLUG.is_match(value)
}

pub fn slugify(title: &str) -> String {
    NON_SLUG
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_registration_collects_every_violation() {
        let err = registration("ab", "123", "not-an-email").unwrap_err();

        assert_eq!(err.fields(), vec!["username", "password", "email"]);
    }

    #[test]
    fn test_registration_ok() {
        assert!(registration("alice", "secret1", "alice@example.com").is_ok());
    }

    #[test]
    fn test_email() {
        assert!(Validator::new().email("email", "a@b.co").finish().is_ok());
        assert!(Validator::new().email("email", "a@b").finish().is_err());
        assert!(Validator::new().email("email", "a b@c.de").finish().is_err());
    }

    #[test]
    fn test_company_name_trims() {
        assert!(company_name("  A ").is_err());
        assert!(company_name("Acme").is_ok());
    }

    #[test]
    fn test_emission_amount_must_be_positive() {
        assert!(emission(Decimal::new(1, 2), None).is_ok());
        assert_eq!(
            emission(Decimal::ZERO, Some("kg")).unwrap_err().fields(),
            vec!["amount"]
        );
        assert_eq!(
            emission(Decimal::ONE, Some(" ")).unwrap_err().fields(),
            vec!["unit"]
        );
    }

    #[test]
    fn test_emission_amount_is_capped() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000_i64));
        assert!(emission(MAX_AMOUNT, None).is_ok());

        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let violations = emission(huge, None).unwrap_err();
        assert_eq!(violations.fields(), vec!["amount"]);
        assert_eq!(violations.0[0].message, "Amount must not exceed 1000000000000");
    }

    #[test]
    fn test_report_period() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(report("Q2 report", &DateRange::between(end, start)).is_ok());
        assert_eq!(
            report("Q2", &DateRange::between(start, end))
                .unwrap_err()
                .fields(),
            vec!["name", "endDate"]
        );
    }

    #[test]
    fn test_slugs() {
        assert_eq!(slugify("Getting Started with EcoMetrics!"), "getting-started-with-ecometrics");
        assert_eq!(slugify("  Scope 3 -- explained "), "scope-3-explained");
        assert!(is_slug("getting-started"));
        assert!(!is_slug("Getting-Started"));
        assert!(!is_slug("double--dash"));
    }

    #[test]
    fn test_article() {
        assert!(article("Getting Started", "getting-started").is_ok());
        assert_eq!(
            article(" ", "Getting Started").unwrap_err().fields(),
            vec!["title", "slug"]
        );
    }

    #[test]
    fn test_violations_serialize_as_list() {
        let json = serde_json::to_value(Violations::single("subject", "Subject is required")).unwrap();

        assert_eq!(json[0]["field"], "subject");
        assert_eq!(json[0]["message"], "Subject is required");
    }
}
