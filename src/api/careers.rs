//! Career (vacancy) endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_active_by_id, find_by_id, resource_types, soft_delete, Career,
    CreateCareerRequest, ListQuery, ListSpec, Paginated, UpdateCareerRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_required, validate_timestamp, validate_uuid};

const CAREERS: ListSpec = ListSpec {
    table: "careers",
    search_columns: &["title", "department", "location", "description"],
    active_column: Some("is_active"),
    order_by: "created_at DESC",
};

fn validate_fields(
    title: Option<&String>,
    description: Option<&String>,
    req_department: &Option<String>,
    req_location: &Option<String>,
    requirements: &Option<String>,
    deadline: &Option<String>,
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
    if let Err(e) = validate_optional(req_department, "Department", 100) {
        errors.add("department", e);
    }
    if let Err(e) = validate_optional(req_location, "Location", 200) {
        errors.add("location", e);
    }
    if let Err(e) = validate_optional(requirements, "Requirements", 50_000) {
        errors.add("requirements", e);
    }
    if let Err(e) = validate_timestamp(deadline, "deadline") {
        errors.add("deadline", e);
    }

    errors.finish()
}

/// Public: open vacancies
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Career>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(fetch_page(&state.db, &CAREERS, &query, &[]).await?))
}

/// Public: one open vacancy
pub async fn get_public(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Career>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    let career = find_active_by_id::<Career>(&state.db, "careers", &id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ApiError::not_found("Vacancy not found"))?;

    Ok(Json(career))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Career>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &CAREERS, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Career>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Career>(&state.db, "careers", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Vacancy not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateCareerRequest>,
) -> Result<(StatusCode, Json<Career>), ApiError> {
    validate_fields(
        Some(&req.title),
        Some(&req.description),
        &req.department,
        &req.location,
        &req.requirements,
        &req.deadline,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO careers (id, title, department, location, description, requirements, deadline, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.department)
    .bind(&req.location)
    .bind(&req.description)
    .bind(&req.requirements)
    .bind(&req.deadline)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let career: Career = sqlx::query_as("SELECT * FROM careers WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::CAREER, actions::CREATE),
        resource_types::CAREER,
        Some(&career.id),
        Some(&career.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(career)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateCareerRequest>,
) -> Result<Json<Career>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(
        req.title.as_ref(),
        req.description.as_ref(),
        &req.department,
        &req.location,
        &req.requirements,
        &req.deadline,
    )?;

    let _existing = find_by_id::<Career>(&state.db, "careers", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vacancy not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE careers SET
            title = COALESCE(?, title),
            department = COALESCE(?, department),
            location = COALESCE(?, location),
            description = COALESCE(?, description),
            requirements = COALESCE(?, requirements),
            deadline = COALESCE(?, deadline),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.department)
    .bind(&req.location)
    .bind(&req.description)
    .bind(&req.requirements)
    .bind(&req.deadline)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let career: Career = sqlx::query_as("SELECT * FROM careers WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::CAREER, actions::UPDATE),
        resource_types::CAREER,
        Some(&career.id),
        Some(&career.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(career))
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

    if !soft_delete(&state.db, "careers", &id).await? {
        return Err(ApiError::not_found("Vacancy not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::CAREER, actions::DELETE),
        resource_types::CAREER,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
