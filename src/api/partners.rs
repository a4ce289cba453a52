//! Partner logo strip endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CreatePartnerRequest,
    ListQuery, ListSpec, Paginated, Partner, UpdatePartnerRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_required, validate_url, validate_uuid};

const PARTNERS: ListSpec = ListSpec {
    table: "partners",
    search_columns: &["name"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, name ASC",
};

fn validate_fields(
    name: Option<&String>,
    logo_url: &Option<String>,
    website_url: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(name) = name {
        if let Err(e) = validate_required(name, "Name", 200) {
            errors.add("name", e);
        }
    }
    if let Err(e) = validate_url(logo_url, "logoUrl") {
        errors.add("logoUrl", e);
    }
    if let Err(e) = validate_url(website_url, "websiteUrl") {
        errors.add("websiteUrl", e);
    }

    errors.finish()
}

/// Public: active partners in display order
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Partner>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(fetch_page(&state.db, &PARTNERS, &query, &[]).await?))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Partner>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &PARTNERS, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Partner>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Partner>(&state.db, "partners", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Partner not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreatePartnerRequest>,
) -> Result<(StatusCode, Json<Partner>), ApiError> {
    validate_fields(Some(&req.name), &req.logo_url, &req.website_url)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO partners (id, name, logo_url, website_url, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.logo_url)
    .bind(&req.website_url)
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let partner: Partner = sqlx::query_as("SELECT * FROM partners WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::PARTNER, actions::CREATE),
        resource_types::PARTNER,
        Some(&partner.id),
        Some(&partner.name),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdatePartnerRequest>,
) -> Result<Json<Partner>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(req.name.as_ref(), &req.logo_url, &req.website_url)?;

    let _existing = find_by_id::<Partner>(&state.db, "partners", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE partners SET
            name = COALESCE(?, name),
            logo_url = COALESCE(?, logo_url),
            website_url = COALESCE(?, website_url),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.logo_url)
    .bind(&req.website_url)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let partner: Partner = sqlx::query_as("SELECT * FROM partners WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::PARTNER, actions::UPDATE),
        resource_types::PARTNER,
        Some(&partner.id),
        Some(&partner.name),
        &user,
        &headers,
    )
    .await;

    Ok(Json(partner))
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

    if !soft_delete(&state.db, "partners", &id).await? {
        return Err(ApiError::not_found("Partner not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::PARTNER, actions::DELETE),
        resource_types::PARTNER,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
