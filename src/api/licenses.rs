//! License type and license endpoints.
//!
//! License numbers are unique across non-deleted licenses; the
//! pre-check turns a duplicate into a field-level validation error
//! and the UNIQUE constraint backstops races.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_active_by_id, find_by_id, resource_types, soft_delete,
    CreateLicenseRequest, CreateLicenseTypeRequest, License, LicenseFilter, LicenseType,
    ListQuery, ListSpec, Member, Paginated, UpdateLicenseRequest, UpdateLicenseTypeRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_optional, validate_required, validate_timestamp, validate_uuid,
};

const LICENSE_TYPES: ListSpec = ListSpec {
    table: "license_types",
    search_columns: &["name", "description"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, name ASC",
};

const LICENSES: ListSpec = ListSpec {
    table: "licenses",
    search_columns: &["license_number"],
    active_column: Some("is_active"),
    order_by: "issued_at DESC, created_at DESC",
};

// License types

fn validate_type_fields(
    name: Option<&String>,
    description: &Option<String>,
    annual_fee_cents: Option<i64>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(name) = name {
        if let Err(e) = validate_required(name, "Name", 200) {
            errors.add("name", e);
        }
    }
    if let Err(e) = validate_optional(description, "Description", 2000) {
        errors.add("description", e);
    }
    if let Some(fee) = annual_fee_cents {
        if fee < 0 {
            errors.add("annualFeeCents", "Annual fee must not be negative");
        }
    }

    errors.finish()
}

/// Public: active license types and their fees
pub async fn list_types_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<LicenseType>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(
        fetch_page(&state.db, &LICENSE_TYPES, &query, &[]).await?,
    ))
}

pub async fn list_types(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<LicenseType>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &LICENSE_TYPES, &query, &[]).await?,
    ))
}

pub async fn get_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LicenseType>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<LicenseType>(&state.db, "license_types", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("License type not found"))
}

pub async fn create_type(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateLicenseTypeRequest>,
) -> Result<(StatusCode, Json<LicenseType>), ApiError> {
    validate_type_fields(Some(&req.name), &req.description, req.annual_fee_cents)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO license_types (id, name, description, annual_fee_cents, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.annual_fee_cents.unwrap_or(0))
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let license_type: LicenseType = sqlx::query_as("SELECT * FROM license_types WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::LICENSE_TYPE, actions::CREATE),
        resource_types::LICENSE_TYPE,
        Some(&license_type.id),
        Some(&license_type.name),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(license_type)))
}

pub async fn update_type(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateLicenseTypeRequest>,
) -> Result<Json<LicenseType>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_type_fields(req.name.as_ref(), &req.description, req.annual_fee_cents)?;

    let _existing = find_by_id::<LicenseType>(&state.db, "license_types", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("License type not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE license_types SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            annual_fee_cents = COALESCE(?, annual_fee_cents),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.annual_fee_cents)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let license_type: LicenseType = sqlx::query_as("SELECT * FROM license_types WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::LICENSE_TYPE, actions::UPDATE),
        resource_types::LICENSE_TYPE,
        Some(&license_type.id),
        Some(&license_type.name),
        &user,
        &headers,
    )
    .await;

    Ok(Json(license_type))
}

pub async fn delete_type(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    if !soft_delete(&state.db, "license_types", &id).await? {
        return Err(ApiError::not_found("License type not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::LICENSE_TYPE, actions::DELETE),
        resource_types::LICENSE_TYPE,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// Licenses

fn license_extras(filter: &LicenseFilter) -> Vec<(&'static str, String)> {
    let mut extra = Vec::new();
    if let Some(member_id) = &filter.member_id {
        extra.push(("member_id", member_id.clone()));
    }
    if let Some(type_id) = &filter.license_type_id {
        extra.push(("license_type_id", type_id.clone()));
    }
    extra
}

async fn license_number_taken(
    state: &AppState,
    number: &str,
    exclude_id: Option<&str>,
) -> Result<bool, ApiError> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM licenses WHERE license_number = ? AND deleted_at IS NULL")
            .bind(number)
            .fetch_optional(&state.db)
            .await?;

    Ok(match existing {
        Some((id,)) => exclude_id != Some(id.as_str()),
        None => false,
    })
}

async fn ensure_member_exists(state: &AppState, member_id: &str) -> Result<(), ApiError> {
    if validate_uuid(member_id, "memberId").is_err()
        || find_active_by_id::<Member>(&state.db, "members", member_id)
            .await?
            .is_none()
    {
        return Err(ApiError::validation_field("memberId", "Unknown member"));
    }
    Ok(())
}

async fn ensure_type_exists(state: &AppState, type_id: &str) -> Result<(), ApiError> {
    if validate_uuid(type_id, "licenseTypeId").is_err()
        || find_active_by_id::<LicenseType>(&state.db, "license_types", type_id)
            .await?
            .is_none()
    {
        return Err(ApiError::validation_field(
            "licenseTypeId",
            "Unknown license type",
        ));
    }
    Ok(())
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<LicenseFilter>,
) -> Result<Json<Paginated<License>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &LICENSES, &query, &license_extras(&filter)).await?,
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<License>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<License>(&state.db, "licenses", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("License not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateLicenseRequest>,
) -> Result<(StatusCode, Json<License>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&req.license_number, "License number", 100) {
        errors.add("licenseNumber", e);
    }
    if let Err(e) = validate_timestamp(&req.issued_at, "issuedAt") {
        errors.add("issuedAt", e);
    }
    if let Err(e) = validate_timestamp(&req.expires_at, "expiresAt") {
        errors.add("expiresAt", e);
    }
    errors.finish()?;

    ensure_member_exists(&state, &req.member_id).await?;
    ensure_type_exists(&state, &req.license_type_id).await?;

    if license_number_taken(&state, &req.license_number, None).await? {
        return Err(ApiError::validation_field(
            "licenseNumber",
            "License number is already in use",
        ));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO licenses (id, member_id, license_type_id, license_number, issued_at, expires_at, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.member_id)
    .bind(&req.license_type_id)
    .bind(&req.license_number)
    .bind(&req.issued_at)
    .bind(&req.expires_at)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let license: License = sqlx::query_as("SELECT * FROM licenses WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::LICENSE, actions::CREATE),
        resource_types::LICENSE,
        Some(&license.id),
        Some(&license.license_number),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(license)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateLicenseRequest>,
) -> Result<Json<License>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(number) = &req.license_number {
        if let Err(e) = validate_required(number, "License number", 100) {
            errors.add("licenseNumber", e);
        }
    }
    if let Err(e) = validate_timestamp(&req.issued_at, "issuedAt") {
        errors.add("issuedAt", e);
    }
    if let Err(e) = validate_timestamp(&req.expires_at, "expiresAt") {
        errors.add("expiresAt", e);
    }
    errors.finish()?;

    let _existing = find_by_id::<License>(&state.db, "licenses", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("License not found"))?;

    if let Some(type_id) = &req.license_type_id {
        ensure_type_exists(&state, type_id).await?;
    }
    if let Some(number) = &req.license_number {
        if license_number_taken(&state, number, Some(&id)).await? {
            return Err(ApiError::validation_field(
                "licenseNumber",
                "License number is already in use",
            ));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE licenses SET
            license_type_id = COALESCE(?, license_type_id),
            license_number = COALESCE(?, license_number),
            issued_at = COALESCE(?, issued_at),
            expires_at = COALESCE(?, expires_at),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.license_type_id)
    .bind(&req.license_number)
    .bind(&req.issued_at)
    .bind(&req.expires_at)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let license: License = sqlx::query_as("SELECT * FROM licenses WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::LICENSE, actions::UPDATE),
        resource_types::LICENSE,
        Some(&license.id),
        Some(&license.license_number),
        &user,
        &headers,
    )
    .await;

    Ok(Json(license))
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

    if !soft_delete(&state.db, "licenses", &id).await? {
        return Err(ApiError::not_found("License not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::LICENSE, actions::DELETE),
        resource_types::LICENSE,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
