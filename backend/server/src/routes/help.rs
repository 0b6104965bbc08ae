use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState, rejection::QueryRejection},
    response::IntoResponse,
};
use ledger::{filter::ArticleFilter, models::Id};
use serde::Deserialize;

use crate::{error::AppError, state::State};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    category_id: Option<Id>,
    published: Option<bool>,
}

pub async fn articles_handler(
    AxumState(state): AxumState<Arc<State>>,
    query: Result<Query<ArticleQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let filter = ArticleFilter {
        category_id: query.category_id,
        published: query.published,
    };

    Ok(Json(state.store.articles(&filter).await?))
}

/// Every read counts as a view.
pub async fn article_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut article = state
        .store
        .article_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound("Article"))?;

    article.views = state.store.record_view(article.id).await?;

    Ok(Json(article))
}
