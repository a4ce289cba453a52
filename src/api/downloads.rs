//! Download (document library) endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CategoryFilter,
    CreateDownloadRequest, Download, ListQuery, ListSpec, Paginated, UpdateDownloadRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_required, validate_url, validate_uuid};

const DOWNLOADS: ListSpec = ListSpec {
    table: "downloads",
    search_columns: &["title", "description", "category"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, created_at DESC",
};

fn validate_fields(
    title: Option<&String>,
    file_url: Option<&String>,
    description: &Option<String>,
    category: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Some(file_url) = file_url {
        if file_url.is_empty() {
            errors.add("fileUrl", "File URL is required");
        } else if let Err(e) = validate_url(&Some(file_url.clone()), "fileUrl") {
            errors.add("fileUrl", e);
        }
    }
    if let Err(e) = validate_optional(description, "Description", 2000) {
        errors.add("description", e);
    }
    if let Err(e) = validate_optional(category, "Category", 100) {
        errors.add("category", e);
    }

    errors.finish()
}

fn category_extra(filter: &CategoryFilter) -> Vec<(&'static str, String)> {
    filter
        .category
        .as_ref()
        .map(|c| vec![("category", c.clone())])
        .unwrap_or_default()
}

/// Public: active downloads, optionally narrowed by category
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Json<Paginated<Download>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(
        fetch_page(&state.db, &DOWNLOADS, &query, &category_extra(&filter)).await?,
    ))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Json<Paginated<Download>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &DOWNLOADS, &query, &category_extra(&filter)).await?,
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Download>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Download>(&state.db, "downloads", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Download not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateDownloadRequest>,
) -> Result<(StatusCode, Json<Download>), ApiError> {
    validate_fields(
        Some(&req.title),
        Some(&req.file_url),
        &req.description,
        &req.category,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO downloads (id, title, description, file_url, category, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.file_url)
    .bind(&req.category)
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let download: Download = sqlx::query_as("SELECT * FROM downloads WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::DOWNLOAD, actions::CREATE),
        resource_types::DOWNLOAD,
        Some(&download.id),
        Some(&download.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(download)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateDownloadRequest>,
) -> Result<Json<Download>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(
        req.title.as_ref(),
        req.file_url.as_ref(),
        &req.description,
        &req.category,
    )?;

    let _existing = find_by_id::<Download>(&state.db, "downloads", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Download not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE downloads SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            file_url = COALESCE(?, file_url),
            category = COALESCE(?, category),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.file_url)
    .bind(&req.category)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let download: Download = sqlx::query_as("SELECT * FROM downloads WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::DOWNLOAD, actions::UPDATE),
        resource_types::DOWNLOAD,
        Some(&download.id),
        Some(&download.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(download))
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

    if !soft_delete(&state.db, "downloads", &id).await? {
        return Err(ApiError::not_found("Download not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::DOWNLOAD, actions::DELETE),
        resource_types::DOWNLOAD,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
