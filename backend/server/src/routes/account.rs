use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as AxumState, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use ledger::{
    models::{Id, Profile, Role},
    validate::{self, Validator},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::{AuthUser, hash_password, verify_password},
    error::AppError,
    state::State,
    store::NewUser,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    username: String,
    password: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct Session {
    token: String,
    user: Profile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    language: Option<String>,
    avatar_url: Option<String>,
}

impl ProfilePatch {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.language.is_none()
            && self.avatar_url.is_none()
    }
}

pub async fn register_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    validate::registration(&body.username, &body.password, &body.email)?;
    let password_hash = hash_password(body.password, state.config.password_cost).await?;

    let user = state
        .store
        .create_user(NewUser {
            username: body.username,
            password_hash,
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
            role: Role::User,
            company_id: None,
        })
        .await
        .map_err(AppError::on_duplicate)?;

    let token = state
        .store
        .open_session(user.id, state.config.session_ttl)
        .await?;
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(Session {
            token,
            user: Profile::from(&user),
        }),
    ))
}

pub async fn login_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;

    let user = state
        .store
        .user_by_username(&body.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !verify_password(body.password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    let token = state
        .store
        .open_session(user.id, state.config.session_ttl)
        .await?;

    Ok(Json(Session {
        token,
        user: Profile::from(&user),
    }))
}

pub async fn logout_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.store.close_session(&auth.token).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile_handler(auth: AuthUser) -> Json<Profile> {
    Json(Profile::from(&auth.user))
}

pub async fn update_profile_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    Path(id): Path<Id>,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    if id != auth.user.id {
        return Err(AppError::Forbidden("You can only update your own profile"));
    }

    let Json(patch) = payload?;
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let mut validator = Validator::new();
    if let Some(email) = &patch.email {
        validator.email("email", email);
    }
    if let Some(language) = &patch.language {
        validator.not_blank("language", language, "Language must not be empty");
    }
    validator.finish()?;

    let user = state
        .store
        .modify_user(auth.user.id, |user| {
            if patch.first_name.is_some() {
                user.first_name = patch.first_name;
            }
            if patch.last_name.is_some() {
                user.last_name = patch.last_name;
            }
            if let Some(email) = patch.email {
                user.email = email;
            }
            if let Some(language) = patch.language {
                user.language = language.trim().to_string();
            }
            if patch.avatar_url.is_some() {
                user.avatar_url = patch.avatar_url;
            }
        })
        .await
        .map_err(AppError::on_duplicate)?;

    Ok(Json(Profile::from(&user)))
}
