//! News endpoints: public listing by slug plus admin CRUD.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CreateNewsRequest, ListQuery,
    ListSpec, News, Paginated, UpdateNewsRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    slugify, validate_optional, validate_required, validate_slug, validate_timestamp,
    validate_url, validate_uuid,
};

const NEWS: ListSpec = ListSpec {
    table: "news",
    search_columns: &["title", "excerpt", "body"],
    active_column: Some("is_active"),
    order_by: "published_at DESC, created_at DESC",
};

fn validate_create_request(req: &CreateNewsRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required(&req.title, "Title", 200) {
        errors.add("title", e);
    }
    if let Some(slug) = &req.slug {
        if let Err(e) = validate_slug(slug) {
            errors.add("slug", e);
        }
    }
    if let Err(e) = validate_required(&req.body, "Body", 100_000) {
        errors.add("body", e);
    }
    if let Err(e) = validate_optional(&req.excerpt, "Excerpt", 1000) {
        errors.add("excerpt", e);
    }
    if let Err(e) = validate_url(&req.image_url, "imageUrl") {
        errors.add("imageUrl", e);
    }
    if let Err(e) = validate_timestamp(&req.published_at, "publishedAt") {
        errors.add("publishedAt", e);
    }

    errors.finish()
}

fn validate_update_request(req: &UpdateNewsRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = &req.title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Some(slug) = &req.slug {
        if let Err(e) = validate_slug(slug) {
            errors.add("slug", e);
        }
    }
    if let Some(body) = &req.body {
        if let Err(e) = validate_required(body, "Body", 100_000) {
            errors.add("body", e);
        }
    }
    if let Err(e) = validate_optional(&req.excerpt, "Excerpt", 1000) {
        errors.add("excerpt", e);
    }
    if let Err(e) = validate_url(&req.image_url, "imageUrl") {
        errors.add("imageUrl", e);
    }
    if let Err(e) = validate_timestamp(&req.published_at, "publishedAt") {
        errors.add("publishedAt", e);
    }

    errors.finish()
}

async fn slug_taken(
    state: &AppState,
    slug: &str,
    exclude_id: Option<&str>,
) -> Result<bool, ApiError> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM news WHERE slug = ? AND deleted_at IS NULL")
            .bind(slug)
            .fetch_optional(&state.db)
            .await?;

    Ok(match existing {
        Some((id,)) => exclude_id != Some(id.as_str()),
        None => false,
    })
}

/// Public: list published articles
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<News>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(fetch_page(&state.db, &NEWS, &query, &[]).await?))
}

/// Public: fetch one article by slug
pub async fn get_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<News>, ApiError> {
    let article: Option<News> = sqlx::query_as(
        "SELECT * FROM news WHERE slug = ? AND deleted_at IS NULL AND is_active = 1",
    )
    .bind(&slug)
    .fetch_optional(&state.db)
    .await?;

    article
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Article not found"))
}

/// Admin: list articles with the common filters
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<News>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &NEWS, &query, &[]).await?))
}

/// Admin: fetch one article, soft-deleted included
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<News>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<News>(&state.db, "news", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Article not found"))
}

/// Admin: create an article
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateNewsRequest>,
) -> Result<(StatusCode, Json<News>), ApiError> {
    validate_create_request(&req)?;

    let slug = match &req.slug {
        Some(s) => s.clone(),
        None => {
            let derived = slugify(&req.title);
            if derived.is_empty() {
                return Err(ApiError::validation_field(
                    "slug",
                    "Slug could not be derived from the title",
                ));
            }
            derived
        }
    };

    if slug_taken(&state, &slug, None).await? {
        return Err(ApiError::validation_field(
            "slug",
            "An article with this slug already exists",
        ));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO news (id, title, slug, excerpt, body, image_url, published_at, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&slug)
    .bind(&req.excerpt)
    .bind(&req.body)
    .bind(&req.image_url)
    .bind(&req.published_at)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let article: News = sqlx::query_as("SELECT * FROM news WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::NEWS, actions::CREATE),
        resource_types::NEWS,
        Some(&article.id),
        Some(&article.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(article)))
}

/// Admin: update an article
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateNewsRequest>,
) -> Result<Json<News>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_update_request(&req)?;

    let _existing = find_by_id::<News>(&state.db, "news", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    if let Some(slug) = &req.slug {
        if slug_taken(&state, slug, Some(&id)).await? {
            return Err(ApiError::validation_field(
                "slug",
                "An article with this slug already exists",
            ));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE news SET
            title = COALESCE(?, title),
            slug = COALESCE(?, slug),
            excerpt = COALESCE(?, excerpt),
            body = COALESCE(?, body),
            image_url = COALESCE(?, image_url),
            published_at = COALESCE(?, published_at),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.slug)
    .bind(&req.excerpt)
    .bind(&req.body)
    .bind(&req.image_url)
    .bind(&req.published_at)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let article: News = sqlx::query_as("SELECT * FROM news WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::NEWS, actions::UPDATE),
        resource_types::NEWS,
        Some(&article.id),
        Some(&article.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(article))
}

/// Admin: soft-delete an article
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    if !soft_delete(&state.db, "news", &id).await? {
        return Err(ApiError::not_found("Article not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::NEWS, actions::DELETE),
        resource_types::NEWS,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
