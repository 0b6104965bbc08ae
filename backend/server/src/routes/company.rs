use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as AxumState, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use ledger::{models::Id, validate};
use serde::Deserialize;
use tracing::info;

use super::ensure_owner;
use crate::{
    auth::{AuthUser, CompanyUser},
    error::AppError,
    state::State,
    store::NewCompany,
};

#[derive(Deserialize)]
pub struct CompanyPayload {
    name: String,
    industry: Option<String>,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    size: Option<String>,
}

#[derive(Deserialize)]
pub struct CompanyPatch {
    name: Option<String>,
    industry: Option<String>,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    size: Option<String>,
}

pub async fn company_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let company_id = auth.user.company_id.ok_or(AppError::NotFound("Company"))?;
    let company = state
        .store
        .company(company_id)
        .await?
        .ok_or(AppError::NotFound("Company"))?;

    Ok(Json(company))
}

/// Creates a company and makes the caller a member of it.
pub async fn create_company_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    payload: Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    validate::company_name(&body.name)?;

    let company = state
        .store
        .create_company(NewCompany {
            name: body.name,
            industry: body.industry,
            address: body.address,
            city: body.city,
            country: body.country,
            size: body.size,
        })
        .await?;

    state
        .store
        .modify_user(auth.user.id, |user| user.company_id = Some(company.id))
        .await?;
    info!("Created company {}", company.id);

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn update_company_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Path(id): Path<Id>,
    payload: Result<Json<CompanyPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(id, caller.company_id, "You can only update your own company")?;

    let Json(patch) = payload?;
    let mut company = state
        .store
        .company(id)
        .await?
        .ok_or(AppError::NotFound("Company"))?;

    if let Some(name) = patch.name {
        validate::company_name(&name)?;
        company.name = name.trim().to_string();
    }
    if patch.industry.is_some() {
        company.industry = patch.industry;
    }
    if patch.address.is_some() {
        company.address = patch.address;
    }
    if patch.city.is_some() {
        company.city = patch.city;
    }
    if patch.country.is_some() {
        company.country = patch.country;
    }
    if patch.size.is_some() {
        company.size = patch.size;
    }

    Ok(Json(state.store.update_company(company).await?))
}
