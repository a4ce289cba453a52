//! Site settings endpoints.
//!
//! The public endpoint flattens non-deleted settings into one
//! `{ key: value }` object; the admin surface manages the rows.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CreateSettingRequest,
    ListQuery, ListSpec, Paginated, Setting, UpdateSettingRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_setting_key, validate_uuid};

const SETTINGS: ListSpec = ListSpec {
    table: "settings",
    search_columns: &["key", "value", "description"],
    active_column: None,
    order_by: "key ASC",
};

/// Public: all settings as a flat key/value map
pub async fn get_public(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT key, value FROM settings WHERE deleted_at IS NULL ORDER BY key")
            .fetch_all(&state.db)
            .await?;

    let mut map = serde_json::Map::new();
    for (key, value) in rows {
        map.insert(key, serde_json::Value::String(value));
    }

    Ok(Json(serde_json::Value::Object(map)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Setting>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &SETTINGS, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Setting>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Setting>(&state.db, "settings", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Setting not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateSettingRequest>,
) -> Result<(StatusCode, Json<Setting>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_setting_key(&req.key) {
        errors.add("key", e);
    }
    if req.value.len() > 10_000 {
        errors.add("value", "Value is too long (max 10000 characters)");
    }
    if let Err(e) = validate_optional(&req.description, "Description", 500) {
        errors.add("description", e);
    }
    errors.finish()?;

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM settings WHERE key = ? AND deleted_at IS NULL")
            .bind(&req.key)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::validation_field("key", "Key is already in use"));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO settings (id, key, value, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.key)
    .bind(&req.value)
    .bind(&req.description)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let setting: Setting = sqlx::query_as("SELECT * FROM settings WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::SETTING, actions::CREATE),
        resource_types::SETTING,
        Some(&setting.id),
        Some(&setting.key),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(setting)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateSettingRequest>,
) -> Result<Json<Setting>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(value) = &req.value {
        if value.len() > 10_000 {
            errors.add("value", "Value is too long (max 10000 characters)");
        }
    }
    if let Err(e) = validate_optional(&req.description, "Description", 500) {
        errors.add("description", e);
    }
    errors.finish()?;

    let _existing = find_by_id::<Setting>(&state.db, "settings", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Setting not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE settings SET
            value = COALESCE(?, value),
            description = COALESCE(?, description),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.value)
    .bind(&req.description)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let setting: Setting = sqlx::query_as("SELECT * FROM settings WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::SETTING, actions::UPDATE),
        resource_types::SETTING,
        Some(&setting.id),
        Some(&setting.key),
        &user,
        &headers,
    )
    .await;

    Ok(Json(setting))
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

    if !soft_delete(&state.db, "settings", &id).await? {
        return Err(ApiError::not_found("Setting not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::SETTING, actions::DELETE),
        resource_types::SETTING,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
