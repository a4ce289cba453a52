//! Board and management profile endpoints.
//!
//! The two tables share a shape, so each handler pair delegates to a
//! generic body parameterized on the row type and table.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, BoardMember,
    CreateProfileRequest, ListQuery, ListSpec, ManagementMember, Paginated,
    UpdateProfileRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_required, validate_url, validate_uuid};

const BOARD: ListSpec = ListSpec {
    table: "board_members",
    search_columns: &["name", "position", "bio"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, name ASC",
};

const MANAGEMENT: ListSpec = ListSpec {
    table: "management_members",
    search_columns: &["name", "position", "bio"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, name ASC",
};

fn validate_fields(
    name: Option<&String>,
    position: Option<&String>,
    bio: &Option<String>,
    photo_url: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(name) = name {
        if let Err(e) = validate_required(name, "Name", 200) {
            errors.add("name", e);
        }
    }
    if let Some(position) = position {
        if let Err(e) = validate_required(position, "Position", 200) {
            errors.add("position", e);
        }
    }
    if let Err(e) = validate_optional(bio, "Bio", 10_000) {
        errors.add("bio", e);
    }
    if let Err(e) = validate_url(photo_url, "photoUrl") {
        errors.add("photoUrl", e);
    }

    errors.finish()
}

/// A profile row from either leadership table.
trait Profile: for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Unpin {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl Profile for BoardMember {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Profile for ManagementMember {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

async fn get_profile<T: Profile>(
    state: &AppState,
    table: &str,
    id: &str,
) -> Result<Json<T>, ApiError> {
    if let Err(e) = validate_uuid(id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<T>(&state.db, table, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Profile not found"))
}

async fn create_profile<T: Profile>(
    state: &AppState,
    table: &str,
    resource_type: &str,
    user: &User,
    headers: &HeaderMap,
    req: CreateProfileRequest,
) -> Result<(StatusCode, Json<T>), ApiError> {
    validate_fields(Some(&req.name), Some(&req.position), &req.bio, &req.photo_url)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let sql = format!(
        "INSERT INTO {} (id, name, position, bio, photo_url, sort_order, is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        table
    );
    sqlx::query(&sql)
        .bind(&id)
        .bind(&req.name)
        .bind(&req.position)
        .bind(&req.bio)
        .bind(&req.photo_url)
        .bind(req.sort_order.unwrap_or(0))
        .bind(req.is_active.unwrap_or(true))
        .bind(&now)
        .bind(&now)
        .execute(&state.db)
        .await?;

    let sql = format!("SELECT * FROM {} WHERE id = ?", table);
    let profile: T = sqlx::query_as(&sql).bind(&id).fetch_one(&state.db).await?;

    audit_log(
        state,
        &actions::named(resource_type, actions::CREATE),
        resource_type,
        Some(profile.id()),
        Some(profile.name()),
        user,
        headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(profile)))
}

async fn update_profile<T: Profile>(
    state: &AppState,
    table: &str,
    resource_type: &str,
    user: &User,
    headers: &HeaderMap,
    id: &str,
    req: UpdateProfileRequest,
) -> Result<Json<T>, ApiError> {
    if let Err(e) = validate_uuid(id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(req.name.as_ref(), req.position.as_ref(), &req.bio, &req.photo_url)?;

    let _existing = find_by_id::<T>(&state.db, table, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    let sql = format!(
        "UPDATE {} SET
            name = COALESCE(?, name),
            position = COALESCE(?, position),
            bio = COALESCE(?, bio),
            photo_url = COALESCE(?, photo_url),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
         WHERE id = ?",
        table
    );
    sqlx::query(&sql)
        .bind(&req.name)
        .bind(&req.position)
        .bind(&req.bio)
        .bind(&req.photo_url)
        .bind(req.sort_order)
        .bind(req.is_active)
        .bind(&now)
        .bind(id)
        .execute(&state.db)
        .await?;

    let sql = format!("SELECT * FROM {} WHERE id = ?", table);
    let profile: T = sqlx::query_as(&sql).bind(id).fetch_one(&state.db).await?;

    audit_log(
        state,
        &actions::named(resource_type, actions::UPDATE),
        resource_type,
        Some(profile.id()),
        Some(profile.name()),
        user,
        headers,
    )
    .await;

    Ok(Json(profile))
}

async fn delete_profile(
    state: &AppState,
    table: &str,
    resource_type: &str,
    user: &User,
    headers: &HeaderMap,
    id: &str,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    if !soft_delete(&state.db, table, id).await? {
        return Err(ApiError::not_found("Profile not found"));
    }

    audit_log(
        state,
        &actions::named(resource_type, actions::DELETE),
        resource_type,
        Some(id),
        None,
        user,
        headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// Board

/// Public: active board profiles in display order
pub async fn list_board_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<BoardMember>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(fetch_page(&state.db, &BOARD, &query, &[]).await?))
}

pub async fn list_board(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<BoardMember>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &BOARD, &query, &[]).await?))
}

pub async fn get_board(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BoardMember>, ApiError> {
    get_profile(&state, "board_members", &id).await
}

pub async fn create_board(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<BoardMember>), ApiError> {
    create_profile(
        &state,
        "board_members",
        resource_types::BOARD_MEMBER,
        &user,
        &headers,
        req,
    )
    .await
}

pub async fn update_board(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<BoardMember>, ApiError> {
    update_profile(
        &state,
        "board_members",
        resource_types::BOARD_MEMBER,
        &user,
        &headers,
        &id,
        req,
    )
    .await
}

pub async fn delete_board(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_profile(
        &state,
        "board_members",
        resource_types::BOARD_MEMBER,
        &user,
        &headers,
        &id,
    )
    .await
}

// Management

/// Public: active management profiles in display order
pub async fn list_management_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<ManagementMember>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(
        fetch_page(&state.db, &MANAGEMENT, &query, &[]).await?,
    ))
}

pub async fn list_management(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<ManagementMember>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &MANAGEMENT, &query, &[]).await?,
    ))
}

pub async fn get_management(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ManagementMember>, ApiError> {
    get_profile(&state, "management_members", &id).await
}

pub async fn create_management(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ManagementMember>), ApiError> {
    create_profile(
        &state,
        "management_members",
        resource_types::MANAGEMENT_MEMBER,
        &user,
        &headers,
        req,
    )
    .await
}

pub async fn update_management(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ManagementMember>, ApiError> {
    update_profile(
        &state,
        "management_members",
        resource_types::MANAGEMENT_MEMBER,
        &user,
        &headers,
        &id,
        req,
    )
    .await
}

pub async fn delete_management(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_profile(
        &state,
        "management_members",
        resource_types::MANAGEMENT_MEMBER,
        &user,
        &headers,
        &id,
    )
    .await
}
