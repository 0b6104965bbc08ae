//! # Support
//!
//! Tickets belong to the user who opened them. Admins see every ticket and their
//! replies are flagged as staff messages.
//!
//! - A ticket starts `open`, priority `medium` unless told otherwise
//! - Closing stamps `closedAt`, reopening clears it
//! - Closed tickets take no new messages
//! - Every new message bumps the ticket's `updatedAt`, which drives listing order
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use ledger::{
    filter::TicketFilter,
    models::{Id, Role, SupportTicket, TicketPriority, TicketStatus, User},
    validate,
};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::AppError,
    state::State,
    store::{NewMessage, NewTicket, StoreError},
    utils::parse_ticket_status,
};

#[derive(Deserialize)]
pub struct TicketQuery {
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPayload {
    subject: String,
    category_id: Option<Id>,
    #[serde(default)]
    priority: TicketPriority,
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    subject: Option<String>,
    category_id: Option<Id>,
    status: Option<TicketStatus>,
    priority: Option<TicketPriority>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    message: String,
    attachment_url: Option<String>,
}

fn can_access(user: &User, ticket: &SupportTicket) -> bool {
    ticket.user_id == user.id || user.role == Role::Admin
}

async fn accessible_ticket(state: &State, id: Id, user: &User) -> Result<SupportTicket, AppError> {
    let ticket = state
        .store
        .ticket(id)
        .await?
        .ok_or(AppError::NotFound("Ticket"))?;

    if !can_access(user, &ticket) {
        return Err(AppError::Forbidden("You do not have access to this ticket"));
    }

    Ok(ticket)
}

fn closed_ticket() -> AppError {
    AppError::BadRequest("Cannot add messages to a closed ticket".to_string())
}

async fn known_category(state: &State, id: Option<Id>) -> Result<(), AppError> {
    if let Some(id) = id {
        state
            .store
            .support_category(id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid support category".to_string()))?;
    }

    Ok(())
}

pub async fn categories_handler(
    AxumState(state): AxumState<Arc<State>>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.support_categories().await?))
}

pub async fn tickets_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    Query(query): Query<TicketQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = TicketFilter {
        status: parse_ticket_status(query.status.as_deref())?,
    };

    Ok(Json(state.store.tickets(auth.user.id, &filter).await?))
}

pub async fn ticket_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(accessible_ticket(&state, id, &auth.user).await?))
}

pub async fn create_ticket_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    payload: Result<Json<TicketPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    validate::ticket(&body.subject)?;
    if let Some(message) = &body.message {
        validate::message(message)?;
    }
    known_category(&state, body.category_id).await?;

    let ticket = state
        .store
        .create_ticket(
            NewTicket {
                user_id: auth.user.id,
                company_id: auth.user.company_id,
                category_id: body.category_id,
                subject: body.subject.trim().to_string(),
                priority: body.priority,
            },
            body.message,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn update_ticket_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    Path(id): Path<Id>,
    payload: Result<Json<TicketPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(patch) = payload?;
    accessible_ticket(&state, id, &auth.user).await?;

    if let Some(subject) = &patch.subject {
        validate::ticket(subject)?;
    }
    if patch.category_id.is_some() {
        known_category(&state, patch.category_id).await?;
    }

    let ticket = state
        .store
        .modify_ticket(id, |ticket| {
            if let Some(subject) = patch.subject {
                ticket.subject = subject.trim().to_string();
            }
            if patch.category_id.is_some() {
                ticket.category_id = patch.category_id;
            }
            if let Some(priority) = patch.priority {
                ticket.priority = priority;
            }
            if let Some(status) = patch.status {
                ticket.closed_at = match status {
                    TicketStatus::Closed => ticket.closed_at.or(Some(Utc::now())),
                    TicketStatus::Open => None,
                };
                ticket.status = status;
            }
        })
        .await?;

    Ok(Json(ticket))
}

pub async fn messages_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = accessible_ticket(&state, id, &auth.user).await?;

    Ok(Json(state.store.messages(ticket.id).await?))
}

pub async fn create_message_handler(
    AxumState(state): AxumState<Arc<State>>,
    auth: AuthUser,
    Path(id): Path<Id>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let ticket = accessible_ticket(&state, id, &auth.user).await?;

    if ticket.status == TicketStatus::Closed {
        return Err(closed_ticket());
    }
    validate::message(&body.message)?;

    let message = state
        .store
        .create_message(NewMessage {
            ticket_id: ticket.id,
            user_id: auth.user.id,
            is_staff: auth.user.role == Role::Admin,
            message: body.message,
            attachment_url: body.attachment_url,
        })
        .await
        .map_err(|e| match e {
            StoreError::Closed { .. } => closed_ticket(),
            other => AppError::Internal(other),
        })?;

    Ok((StatusCode::CREATED, Json(message)))
}
