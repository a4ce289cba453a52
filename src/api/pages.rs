//! Content page endpoints: public fetch by slug plus admin CRUD.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CreatePageRequest, ListQuery,
    ListSpec, Page, Paginated, UpdatePageRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{slugify, validate_required, validate_slug, validate_uuid};

const PAGES: ListSpec = ListSpec {
    table: "pages",
    search_columns: &["title", "body"],
    active_column: Some("is_active"),
    order_by: "title ASC",
};

fn validate_fields(
    title: Option<&String>,
    body: Option<&String>,
    slug: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Some(body) = body {
        if let Err(e) = validate_required(body, "Body", 500_000) {
            errors.add("body", e);
        }
    }
    if let Some(slug) = slug {
        if let Err(e) = validate_slug(slug) {
            errors.add("slug", e);
        }
    }

    errors.finish()
}

async fn slug_taken(
    state: &AppState,
    slug: &str,
    exclude_id: Option<&str>,
) -> Result<bool, ApiError> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM pages WHERE slug = ? AND deleted_at IS NULL")
            .bind(slug)
            .fetch_optional(&state.db)
            .await?;

    Ok(match existing {
        Some((id,)) => exclude_id != Some(id.as_str()),
        None => false,
    })
}

/// Public: fetch one page by slug
pub async fn get_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Page>, ApiError> {
    let page: Option<Page> = sqlx::query_as(
        "SELECT * FROM pages WHERE slug = ? AND is_active = 1 AND deleted_at IS NULL",
    )
    .bind(&slug)
    .fetch_optional(&state.db)
    .await?;

    page.map(Json)
        .ok_or_else(|| ApiError::not_found("Page not found"))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Page>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &PAGES, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Page>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Page>(&state.db, "pages", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Page not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreatePageRequest>,
) -> Result<(StatusCode, Json<Page>), ApiError> {
    validate_fields(Some(&req.title), Some(&req.body), &req.slug)?;

    let slug = match &req.slug {
        Some(slug) => slug.clone(),
        None => slugify(&req.title),
    };
    if slug.is_empty() {
        return Err(ApiError::validation_field(
            "slug",
            "Slug could not be derived from the title",
        ));
    }
    if slug_taken(&state, &slug, None).await? {
        return Err(ApiError::validation_field("slug", "Slug is already in use"));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO pages (id, title, slug, body, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&slug)
    .bind(&req.body)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let page: Page = sqlx::query_as("SELECT * FROM pages WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::PAGE, actions::CREATE),
        resource_types::PAGE,
        Some(&page.id),
        Some(&page.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdatePageRequest>,
) -> Result<Json<Page>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(req.title.as_ref(), req.body.as_ref(), &req.slug)?;

    let _existing = find_by_id::<Page>(&state.db, "pages", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    if let Some(slug) = &req.slug {
        if slug_taken(&state, slug, Some(&id)).await? {
            return Err(ApiError::validation_field("slug", "Slug is already in use"));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE pages SET
            title = COALESCE(?, title),
            slug = COALESCE(?, slug),
            body = COALESCE(?, body),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.slug)
    .bind(&req.body)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let page: Page = sqlx::query_as("SELECT * FROM pages WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::PAGE, actions::UPDATE),
        resource_types::PAGE,
        Some(&page.id),
        Some(&page.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(page))
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

    if !soft_delete(&state.db, "pages", &id).await? {
        return Err(ApiError::not_found("Page not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::PAGE, actions::DELETE),
        resource_types::PAGE,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
