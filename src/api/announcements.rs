//! Announcement endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, Announcement,
    CreateAnnouncementRequest, ListQuery, ListSpec, Paginated, UpdateAnnouncementRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_required, validate_timestamp, validate_uuid};

const ANNOUNCEMENTS: ListSpec = ListSpec {
    table: "announcements",
    search_columns: &["title", "body"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, created_at DESC",
};

fn validate_fields(
    title: Option<&String>,
    body: Option<&String>,
    starts_at: &Option<String>,
    ends_at: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Some(body) = body {
        if let Err(e) = validate_required(body, "Body", 10_000) {
            errors.add("body", e);
        }
    }
    if let Err(e) = validate_timestamp(starts_at, "startsAt") {
        errors.add("startsAt", e);
    }
    if let Err(e) = validate_timestamp(ends_at, "endsAt") {
        errors.add("endsAt", e);
    }

    errors.finish()
}

/// Public: active announcements in display order
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Announcement>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(
        fetch_page(&state.db, &ANNOUNCEMENTS, &query, &[]).await?,
    ))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Announcement>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &ANNOUNCEMENTS, &query, &[]).await?,
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Announcement>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Announcement>(&state.db, "announcements", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Announcement not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>), ApiError> {
    validate_fields(
        Some(&req.title),
        Some(&req.body),
        &req.starts_at,
        &req.ends_at,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO announcements (id, title, body, starts_at, ends_at, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.body)
    .bind(&req.starts_at)
    .bind(&req.ends_at)
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let announcement: Announcement = sqlx::query_as("SELECT * FROM announcements WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::ANNOUNCEMENT, actions::CREATE),
        resource_types::ANNOUNCEMENT,
        Some(&announcement.id),
        Some(&announcement.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(
        req.title.as_ref(),
        req.body.as_ref(),
        &req.starts_at,
        &req.ends_at,
    )?;

    let _existing = find_by_id::<Announcement>(&state.db, "announcements", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Announcement not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE announcements SET
            title = COALESCE(?, title),
            body = COALESCE(?, body),
            starts_at = COALESCE(?, starts_at),
            ends_at = COALESCE(?, ends_at),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.body)
    .bind(&req.starts_at)
    .bind(&req.ends_at)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let announcement: Announcement = sqlx::query_as("SELECT * FROM announcements WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::ANNOUNCEMENT, actions::UPDATE),
        resource_types::ANNOUNCEMENT,
        Some(&announcement.id),
        Some(&announcement.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(announcement))
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

    if !soft_delete(&state.db, "announcements", &id).await? {
        return Err(ApiError::not_found("Announcement not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::ANNOUNCEMENT, actions::DELETE),
        resource_types::ANNOUNCEMENT,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
