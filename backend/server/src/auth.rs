//! # Authentication
//!
//! ## Passwords
//!
//! - Stored as bcrypt strings (`$2b$<cost>$<salt><hash>`), salt generated per hash
//! - Work factor comes from `PASSWORD_COST` (bcrypt default 12)
//! - Hashing and verification run on the blocking pool, never on a request worker
//!
//! ## Sessions
//!
//! - Login and registration hand out an opaque token (UUID v4)
//! - Token maps to a user id in the store with a TTL (`SESSION_TTL_SECS`)
//! - Clients send `Authorization: Bearer <token>`
//! - Logout drops the token early
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use ledger::models::{Id, User};
use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};

use crate::{error::AppError, state::State};

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password task failed: {0}")]
    Task(#[from] JoinError),
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    Ok(spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

/// Malformed stored hashes never verify.
pub async fn verify_password(password: String, stored: String) -> Result<bool, PasswordError> {
    Ok(spawn_blocking(move || bcrypt::verify(password, &stored).unwrap_or(false)).await?)
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Signed in user, resolved from the bearer token.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<Arc<State>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(AppError::Unauthenticated)?;
        let user = state
            .store
            .session_user(token)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self {
            user,
            token: token.to_string(),
        })
    }
}

/// Signed in user that belongs to a company.
pub struct CompanyUser {
    pub user: User,
    pub company_id: Id,
}

impl FromRequestParts<Arc<State>> for CompanyUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;
        let company_id = user.company_id.ok_or(AppError::CompanyRequired)?;

        Ok(Self { user, company_id })
    }
}
