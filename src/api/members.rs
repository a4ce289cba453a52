//! Member registry and fee waiver endpoints. Admin-only.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_active_by_id, find_by_id, resource_types, soft_delete,
    CreateMemberRequest, CreateWaiverRequest, ListQuery, ListSpec, Member, MemberFilter,
    Paginated, UpdateMemberRequest, UpdateWaiverRequest, User, Waiver,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_optional, validate_optional_email, validate_required, validate_timestamp,
    validate_uuid,
};

const MEMBERS: ListSpec = ListSpec {
    table: "members",
    search_columns: &["name", "email", "phone", "category"],
    active_column: Some("is_active"),
    order_by: "name ASC",
};

const WAIVERS: ListSpec = ListSpec {
    table: "waivers",
    search_columns: &["reason"],
    active_column: None,
    order_by: "granted_at DESC, created_at DESC",
};

fn validate_member_fields(
    name: Option<&String>,
    email: &Option<String>,
    phone: &Option<String>,
    category: &Option<String>,
    joined_at: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(name) = name {
        if let Err(e) = validate_required(name, "Name", 200) {
            errors.add("name", e);
        }
    }
    if let Err(e) = validate_optional_email(email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_optional(phone, "Phone", 50) {
        errors.add("phone", e);
    }
    if let Err(e) = validate_optional(category, "Category", 100) {
        errors.add("category", e);
    }
    if let Err(e) = validate_timestamp(joined_at, "joinedAt") {
        errors.add("joinedAt", e);
    }

    errors.finish()
}

// Members

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Member>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &MEMBERS, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Member>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Member>(&state.db, "members", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Member not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    validate_member_fields(
        Some(&req.name),
        &req.email,
        &req.phone,
        &req.category,
        &req.joined_at,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO members (id, name, email, phone, category, joined_at, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.category)
    .bind(&req.joined_at)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let member: Member = sqlx::query_as("SELECT * FROM members WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::MEMBER, actions::CREATE),
        resource_types::MEMBER,
        Some(&member.id),
        Some(&member.name),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<Member>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_member_fields(
        req.name.as_ref(),
        &req.email,
        &req.phone,
        &req.category,
        &req.joined_at,
    )?;

    let _existing = find_by_id::<Member>(&state.db, "members", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE members SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            category = COALESCE(?, category),
            joined_at = COALESCE(?, joined_at),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.category)
    .bind(&req.joined_at)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let member: Member = sqlx::query_as("SELECT * FROM members WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::MEMBER, actions::UPDATE),
        resource_types::MEMBER,
        Some(&member.id),
        Some(&member.name),
        &user,
        &headers,
    )
    .await;

    Ok(Json(member))
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

    if !soft_delete(&state.db, "members", &id).await? {
        return Err(ApiError::not_found("Member not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::MEMBER, actions::DELETE),
        resource_types::MEMBER,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// Waivers

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

pub async fn list_waivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<MemberFilter>,
) -> Result<Json<Paginated<Waiver>>, ApiError> {
    let extra = filter
        .member_id
        .as_ref()
        .map(|id| vec![("member_id", id.clone())])
        .unwrap_or_default();

    Ok(Json(fetch_page(&state.db, &WAIVERS, &query, &extra).await?))
}

pub async fn get_waiver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Waiver>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Waiver>(&state.db, "waivers", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Waiver not found"))
}

pub async fn create_waiver(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateWaiverRequest>,
) -> Result<(StatusCode, Json<Waiver>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&req.reason, "Reason", 2000) {
        errors.add("reason", e);
    }
    if let Some(amount) = req.amount_cents {
        if amount < 0 {
            errors.add("amountCents", "Amount must not be negative");
        }
    }
    if let Err(e) = validate_timestamp(&req.granted_at, "grantedAt") {
        errors.add("grantedAt", e);
    }
    errors.finish()?;

    ensure_member_exists(&state, &req.member_id).await?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO waivers (id, member_id, reason, amount_cents, granted_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.member_id)
    .bind(&req.reason)
    .bind(req.amount_cents.unwrap_or(0))
    .bind(&req.granted_at)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let waiver: Waiver = sqlx::query_as("SELECT * FROM waivers WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::WAIVER, actions::CREATE),
        resource_types::WAIVER,
        Some(&waiver.id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(waiver)))
}

pub async fn update_waiver(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateWaiverRequest>,
) -> Result<Json<Waiver>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(reason) = &req.reason {
        if let Err(e) = validate_required(reason, "Reason", 2000) {
            errors.add("reason", e);
        }
    }
    if let Some(amount) = req.amount_cents {
        if amount < 0 {
            errors.add("amountCents", "Amount must not be negative");
        }
    }
    if let Err(e) = validate_timestamp(&req.granted_at, "grantedAt") {
        errors.add("grantedAt", e);
    }
    errors.finish()?;

    let _existing = find_by_id::<Waiver>(&state.db, "waivers", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Waiver not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE waivers SET
            reason = COALESCE(?, reason),
            amount_cents = COALESCE(?, amount_cents),
            granted_at = COALESCE(?, granted_at),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.reason)
    .bind(req.amount_cents)
    .bind(&req.granted_at)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let waiver: Waiver = sqlx::query_as("SELECT * FROM waivers WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::WAIVER, actions::UPDATE),
        resource_types::WAIVER,
        Some(&waiver.id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(Json(waiver))
}

pub async fn delete_waiver(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    if !soft_delete(&state.db, "waivers", &id).await? {
        return Err(ApiError::not_found("Waiver not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::WAIVER, actions::DELETE),
        resource_types::WAIVER,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
