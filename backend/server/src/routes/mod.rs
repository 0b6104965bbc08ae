use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use ledger::models::Id;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use crate::{error::AppError, state::State};

pub mod account;
pub mod company;
pub mod emissions;
pub mod help;
pub mod reports;
pub mod subscriptions;
pub mod support;

pub fn api() -> Router<Arc<State>> {
    Router::new()
        .route("/register", post(account::register_handler))
        .route("/login", post(account::login_handler))
        .route("/logout", post(account::logout_handler))
        .route("/user", get(account::profile_handler))
        .route("/user/{id}", patch(account::update_profile_handler))
        .route(
            "/company",
            get(company::company_handler).post(company::create_company_handler),
        )
        .route("/company/{id}", patch(company::update_company_handler))
        .route("/emission-categories", get(emissions::categories_handler))
        .route(
            "/emissions",
            get(emissions::emissions_handler).post(emissions::create_emission_handler),
        )
        .route("/emissions/summary", get(emissions::summary_handler))
        .route("/emissions/timeline", get(emissions::timeline_handler))
        .route(
            "/emissions/{id}",
            get(emissions::emission_handler).patch(emissions::update_emission_handler),
        )
        .route(
            "/reports",
            get(reports::reports_handler).post(reports::create_report_handler),
        )
        .route(
            "/reports/{id}",
            get(reports::report_handler).patch(reports::update_report_handler),
        )
        .route("/subscription-plans", get(subscriptions::plans_handler))
        .route("/subscription", get(subscriptions::subscription_handler))
        .route("/support/categories", get(support::categories_handler))
        .route("/help/categories", get(support::categories_handler))
        .route(
            "/support/tickets",
            get(support::tickets_handler).post(support::create_ticket_handler),
        )
        .route(
            "/support/tickets/{id}",
            get(support::ticket_handler).patch(support::update_ticket_handler),
        )
        .route(
            "/support/tickets/{id}/messages",
            get(support::messages_handler).post(support::create_message_handler),
        )
        .route("/help/articles", get(help::articles_handler))
        .route("/help/articles/{slug}", get(help::article_handler))
        .route("/health", get(health_handler))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Tenant check shared by every company scoped record.
pub fn ensure_owner(owner: Id, caller: Id, what: &'static str) -> Result<(), AppError> {
    if owner == caller {
        Ok(())
    } else {
        Err(AppError::Forbidden(what))
    }
}

/// Decimal amounts arrive either as JSON numbers or numeric strings.
pub fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => return Err(de::Error::custom(format!("invalid decimal: {other}"))),
    };

    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|_| de::Error::custom(format!("invalid decimal: {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Amount {
        #[serde(default, deserialize_with = "decimal")]
        amount: Option<Decimal>,
    }

    fn amount(json: &str) -> Result<Option<Decimal>, serde_json::Error> {
        serde_json::from_str::<Amount>(json).map(|parsed| parsed.amount)
    }

    #[test]
    fn test_decimal_accepts_numbers_and_strings() {
        assert_eq!(amount(r#"{"amount": 12.5}"#).unwrap(), Some(Decimal::new(125, 1)));
        assert_eq!(amount(r#"{"amount": "12.50"}"#).unwrap(), Some(Decimal::new(1250, 2)));
        assert_eq!(amount(r#"{"amount": 3}"#).unwrap(), Some(Decimal::from(3)));
        assert_eq!(amount(r#"{"amount": null}"#).unwrap(), None);
        assert_eq!(amount("{}").unwrap(), None);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        assert!(amount(r#"{"amount": "abc"}"#).is_err());
        assert!(amount(r#"{"amount": true}"#).is_err());
    }
}
