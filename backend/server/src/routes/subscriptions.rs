use std::sync::Arc;

use axum::{Json, extract::State as AxumState, response::IntoResponse};

use crate::{auth::CompanyUser, error::AppError, state::State};

pub async fn plans_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.plans().await?))
}

/// The company's active subscription with its plan, `null` when there is none.
pub async fn subscription_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: CompanyUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state.store.active_subscription(caller.company_id).await?,
    ))
}
