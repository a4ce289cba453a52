//! Event endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_active_by_id, find_by_id, resource_types, soft_delete,
    CreateEventRequest, Event, ListQuery, ListSpec, Paginated, UpdateEventRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_optional, validate_required, validate_timestamp, validate_url, validate_uuid,
};

const EVENTS: ListSpec = ListSpec {
    table: "events",
    search_columns: &["title", "description", "venue"],
    active_column: Some("is_active"),
    order_by: "starts_at DESC",
};

fn validate_fields(
    title: Option<&String>,
    description: Option<&String>,
    starts_at: Option<&String>,
    venue: &Option<String>,
    ends_at: &Option<String>,
    image_url: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Some(description) = description {
        if let Err(e) = validate_required(description, "Description", 50_000) {
            errors.add("description", e);
        }
    }
    if let Some(starts_at) = starts_at {
        if let Err(e) = validate_timestamp(&Some(starts_at.clone()), "startsAt") {
            errors.add("startsAt", e);
        }
    }
    if let Err(e) = validate_optional(venue, "Venue", 300) {
        errors.add("venue", e);
    }
    if let Err(e) = validate_timestamp(ends_at, "endsAt") {
        errors.add("endsAt", e);
    }
    if let Err(e) = validate_url(image_url, "imageUrl") {
        errors.add("imageUrl", e);
    }

    errors.finish()
}

/// Public: active events, newest first
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Event>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(fetch_page(&state.db, &EVENTS, &query, &[]).await?))
}

/// Public: one active event
pub async fn get_public(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    let event = find_active_by_id::<Event>(&state.db, "events", &id)
        .await?
        .filter(|e| e.is_active)
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    Ok(Json(event))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Event>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &EVENTS, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Event>(&state.db, "events", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    validate_fields(
        Some(&req.title),
        Some(&req.description),
        Some(&req.starts_at),
        &req.venue,
        &req.ends_at,
        &req.image_url,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO events (id, title, description, venue, starts_at, ends_at, image_url, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.venue)
    .bind(&req.starts_at)
    .bind(&req.ends_at)
    .bind(&req.image_url)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let event: Event = sqlx::query_as("SELECT * FROM events WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::EVENT, actions::CREATE),
        resource_types::EVENT,
        Some(&event.id),
        Some(&event.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(
        req.title.as_ref(),
        req.description.as_ref(),
        req.starts_at.as_ref(),
        &req.venue,
        &req.ends_at,
        &req.image_url,
    )?;

    let _existing = find_by_id::<Event>(&state.db, "events", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE events SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            venue = COALESCE(?, venue),
            starts_at = COALESCE(?, starts_at),
            ends_at = COALESCE(?, ends_at),
            image_url = COALESCE(?, image_url),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.venue)
    .bind(&req.starts_at)
    .bind(&req.ends_at)
    .bind(&req.image_url)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let event: Event = sqlx::query_as("SELECT * FROM events WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::EVENT, actions::UPDATE),
        resource_types::EVENT,
        Some(&event.id),
        Some(&event.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(event))
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

    if !soft_delete(&state.db, "events", &id).await? {
        return Err(ApiError::not_found("Event not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::EVENT, actions::DELETE),
        resource_types::EVENT,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
