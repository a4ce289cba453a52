//! Service catalogue endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CreateServiceRequest,
    ListQuery, ListSpec, Paginated, Service, UpdateServiceRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_required, validate_uuid};

const SERVICES: ListSpec = ListSpec {
    table: "services",
    search_columns: &["title", "summary", "body"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, title ASC",
};

fn validate_fields(
    title: Option<&String>,
    body: Option<&String>,
    summary: &Option<String>,
    icon: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Some(body) = body {
        if let Err(e) = validate_required(body, "Body", 100_000) {
            errors.add("body", e);
        }
    }
    if let Err(e) = validate_optional(summary, "Summary", 1000) {
        errors.add("summary", e);
    }
    if let Err(e) = validate_optional(icon, "Icon", 100) {
        errors.add("icon", e);
    }

    errors.finish()
}

/// Public: active services in display order
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Service>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(fetch_page(&state.db, &SERVICES, &query, &[]).await?))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Service>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &SERVICES, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Service>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Service>(&state.db, "services", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Service not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    validate_fields(Some(&req.title), Some(&req.body), &req.summary, &req.icon)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO services (id, title, summary, body, icon, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.summary)
    .bind(&req.body)
    .bind(&req.icon)
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let service: Service = sqlx::query_as("SELECT * FROM services WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::SERVICE, actions::CREATE),
        resource_types::SERVICE,
        Some(&service.id),
        Some(&service.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(req.title.as_ref(), req.body.as_ref(), &req.summary, &req.icon)?;

    let _existing = find_by_id::<Service>(&state.db, "services", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE services SET
            title = COALESCE(?, title),
            summary = COALESCE(?, summary),
            body = COALESCE(?, body),
            icon = COALESCE(?, icon),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.summary)
    .bind(&req.body)
    .bind(&req.icon)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let service: Service = sqlx::query_as("SELECT * FROM services WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::SERVICE, actions::UPDATE),
        resource_types::SERVICE,
        Some(&service.id),
        Some(&service.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(service))
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

    if !soft_delete(&state.db, "services", &id).await? {
        return Err(ApiError::not_found("Service not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::SERVICE, actions::DELETE),
        resource_types::SERVICE,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
