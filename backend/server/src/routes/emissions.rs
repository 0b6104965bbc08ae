use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use ledger::{
    filter::EmissionFilter,
    models::{DEFAULT_UNIT, EmissionCategory, EmissionWithCategory, Id},
    summary::summarize,
    timeline::emissions_timeline,
    validate::{self, Violations},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{decimal, ensure_owner};
use crate::{
    auth::{AuthUser, CompanyUser},
    error::AppError,
    state::State,
    store::NewEmission,
    utils::{PeriodQuery, parse_date},
};

const FORBIDDEN: &str = "You do not have access to this emission";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionPayload {
    category_id: Id,
    #[serde(default, deserialize_with = "decimal")]
    amount: Option<Decimal>,
    unit: Option<String>,
    date: Option<String>,
    description: Option<String>,
    document_url: Option<String>,
    #[serde(default)]
    verified: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionPatch {
    category_id: Option<Id>,
    #[serde(default, deserialize_with = "decimal")]
    amount: Option<Decimal>,
    unit: Option<String>,
    date: Option<String>,
    description: Option<String>,
    document_url: Option<String>,
    verified: Option<bool>,
}

async fn existing_category(state: &State, id: Id) -> Result<EmissionCategory, AppError> {
    state
        .store
        .category(id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid emission category".to_string()))
}

async fn owned_emission(
    state: &State,
    id: Id,
    company_id: Id,
) -> Result<EmissionWithCategory, AppError> {
    let record = state
        .store
        .emission(id)
        .await?
        .ok_or(AppError::NotFound("Emission"))?;
    ensure_owner(record.emission.company_id, company_id, FORBIDDEN)?;

    Ok(record)
}

async fn filtered(
    state: &State,
    company_id: Id,
    query: &PeriodQuery,
) -> Result<Vec<EmissionWithCategory>, AppError> {
    let filter = EmissionFilter {
        range: query.range()?,
        scope: query.scope()?,
    };

    Ok(state.store.emissions(company_id, &filter).await?)
}

pub async fn categories_handler(
    AxumState(state): AxumState<Arc<State>>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.categories().await?))
}

pub async fn emissions_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(filtered(&state, caller.company_id, &query).await?))
}

pub async fn summary_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AppError> {
    let records = filtered(&state, caller.company_id, &query).await?;

    Ok(Json(summarize(&records)))
}

pub async fn timeline_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AppError> {
    let granularity = query.granularity()?;
    let records = filtered(&state, caller.company_id, &query).await?;

    Ok(Json(emissions_timeline(&records, granularity)))
}

pub async fn emission_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(owned_emission(&state, id, caller.company_id).await?))
}

pub async fn create_emission_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    payload: Result<Json<EmissionPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let amount = body
        .amount
        .ok_or_else(|| Violations::single("amount", "Amount is required"))?;
    validate::emission(amount, body.unit.as_deref())?;

    let date = match body.date.as_deref() {
        Some(date) => parse_date("date", date)?,
        None => Utc::now(),
    };
    existing_category(&state, body.category_id).await?;

    let record = state
        .store
        .create_emission(NewEmission {
            company_id: caller.company_id,
            category_id: body.category_id,
            description: body.description,
            amount,
            unit: body
                .unit
                .map(|unit| unit.trim().to_string())
                .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            date,
            document_url: body.document_url,
            verified_by: body.verified.then_some(caller.user.id),
            created_by: caller.user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_emission_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Path(id): Path<Id>,
    payload: Result<Json<EmissionPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(patch) = payload?;
    let EmissionWithCategory { mut emission, .. } =
        owned_emission(&state, id, caller.company_id).await?;

    validate::emission(
        patch.amount.unwrap_or(emission.amount),
        patch.unit.as_deref(),
    )?;

    if let Some(category_id) = patch.category_id {
        existing_category(&state, category_id).await?;
        emission.category_id = category_id;
    }
    if let Some(amount) = patch.amount {
        emission.amount = amount;
    }
    if let Some(unit) = patch.unit {
        emission.unit = unit.trim().to_string();
    }
    if let Some(date) = patch.date.as_deref() {
        emission.date = parse_date("date", date)?;
    }
    if patch.description.is_some() {
        emission.description = patch.description;
    }
    if patch.document_url.is_some() {
        emission.document_url = patch.document_url;
    }
    if let Some(verified) = patch.verified {
        emission.verified = verified;
        emission.verified_by = verified.then_some(caller.user.id);
    }

    Ok(Json(state.store.update_emission(emission).await?))
}
