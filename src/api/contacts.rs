//! Contact form endpoints: public submission plus the admin inbox.
//!
//! Contact messages hold third-party PII, so admin DELETE removes the
//! row outright instead of soft-deleting it.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, hard_delete, resource_types, ContactFilter, ContactMessage,
    CreateContactMessageRequest, ListQuery, ListSpec, Paginated, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_optional, validate_required, validate_uuid};

const CONTACTS: ListSpec = ListSpec {
    table: "contact_messages",
    search_columns: &["name", "email", "subject", "message"],
    active_column: None,
    order_by: "created_at DESC",
};

/// Public: submit a contact message
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContactMessageRequest>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&req.name, "Name", 200) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_optional(&req.phone, "Phone", 50) {
        errors.add("phone", e);
    }
    if let Err(e) = validate_optional(&req.subject, "Subject", 200) {
        errors.add("subject", e);
    }
    if let Err(e) = validate_required(&req.message, "Message", 10_000) {
        errors.add("message", e);
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO contact_messages (id, name, email, phone, subject, message, is_read, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.subject)
    .bind(&req.message)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let message: ContactMessage = sqlx::query_as("SELECT * FROM contact_messages WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Admin: inbox with `isRead` filter
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<ContactFilter>,
) -> Result<Json<Paginated<ContactMessage>>, ApiError> {
    let mut extra = Vec::new();
    if let Some(is_read) = filter.is_read {
        extra.push(("is_read", if is_read { "1" } else { "0" }.to_string()));
    }

    Ok(Json(
        fetch_page(&state.db, &CONTACTS, &query, &extra).await?,
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContactMessage>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<ContactMessage>(&state.db, "contact_messages", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Message not found"))
}

/// Admin: flip the read flag
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ContactMessage>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query("UPDATE contact_messages SET is_read = 1, updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Message not found"));
    }

    let message: ContactMessage = sqlx::query_as("SELECT * FROM contact_messages WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::CONTACT_MARK_READ,
        resource_types::CONTACT_MESSAGE,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(Json(message))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    if !hard_delete(&state.db, "contact_messages", &id).await? {
        return Err(ApiError::not_found("Message not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::CONTACT_MESSAGE, actions::DELETE),
        resource_types::CONTACT_MESSAGE,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
