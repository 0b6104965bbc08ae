use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as AxumState, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use ledger::{
    filter::{DateRange, EmissionFilter},
    models::{Id, Report, ReportStatus, ReportType},
    summary::{EmissionsSummary, summarize},
    validate,
};
use serde::Deserialize;
use tracing::info;

use super::ensure_owner;
use crate::{
    auth::CompanyUser,
    error::AppError,
    state::State,
    store::NewReport,
    utils::parse_date,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    name: String,
    description: Option<String>,
    start_date: String,
    end_date: String,
    #[serde(rename = "type")]
    kind: ReportType,
    #[serde(default)]
    status: ReportStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPatch {
    name: Option<String>,
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(rename = "type")]
    kind: Option<ReportType>,
    status: Option<ReportStatus>,
}

/// Summary of the company's emissions over the report period.
async fn generate(
    state: &State,
    company_id: Id,
    period: DateRange,
) -> Result<EmissionsSummary, AppError> {
    let filter = EmissionFilter {
        range: period,
        scope: None,
    };
    let records = state.store.emissions(company_id, &filter).await?;

    Ok(summarize(&records))
}

async fn owned_report(state: &State, id: Id, company_id: Id) -> Result<Report, AppError> {
    let report = state
        .store
        .report(id)
        .await?
        .ok_or(AppError::NotFound("Report"))?;
    ensure_owner(
        report.company_id,
        company_id,
        "You do not have access to this report",
    )?;

    Ok(report)
}

pub async fn reports_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.reports(caller.company_id).await?))
}

pub async fn report_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(owned_report(&state, id, caller.company_id).await?))
}

pub async fn create_report_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    payload: Result<Json<ReportPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let start_date = parse_date("startDate", &body.start_date)?;
    let end_date = parse_date("endDate", &body.end_date)?;
    let period = DateRange::between(start_date, end_date);
    validate::report(&body.name, &period)?;

    let data = generate(&state, caller.company_id, period).await?;

    let report = state
        .store
        .create_report(NewReport {
            company_id: caller.company_id,
            name: body.name.trim().to_string(),
            description: body.description,
            start_date,
            end_date,
            status: body.status,
            kind: body.kind,
            data: Some(data),
            created_by: caller.user.id,
        })
        .await?;
    info!("Generated report {} for company {}", report.id, caller.company_id);

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn update_report_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
    Path(id): Path<Id>,
    payload: Result<Json<ReportPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(patch) = payload?;
    let mut report = owned_report(&state, id, caller.company_id).await?;

    let start_date = match patch.start_date.as_deref() {
        Some(date) => parse_date("startDate", date)?,
        None => report.start_date,
    };
    let end_date = match patch.end_date.as_deref() {
        Some(date) => parse_date("endDate", date)?,
        None => report.end_date,
    };
    let name = patch.name.unwrap_or_else(|| report.name.clone());
    let period = DateRange::between(start_date, end_date);
    validate::report(&name, &period)?;

    let period_changed = start_date != report.start_date || end_date != report.end_date;

    report.name = name.trim().to_string();
    report.start_date = start_date;
    report.end_date = end_date;
    if patch.description.is_some() {
        report.description = patch.description;
    }
    if let Some(kind) = patch.kind {
        report.kind = kind;
    }
    if let Some(status) = patch.status {
        report.status = status;
    }
    if period_changed {
        report.data = Some(generate(&state, caller.company_id, period).await?);
    }

    Ok(Json(state.store.update_report(report).await?))
}
