//! SEO metadata endpoints.
//!
//! Each entry is keyed by the site path it decorates; creating or
//! moving an entry onto a path that already has one is a validation
//! error.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CreateSeoMetaRequest,
    ListQuery, ListSpec, Paginated, SeoMeta, UpdateSeoMetaRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_optional, validate_required, validate_site_path, validate_url, validate_uuid,
};

const SEO: ListSpec = ListSpec {
    table: "seo_meta",
    search_columns: &["path", "title", "description", "keywords"],
    active_column: None,
    order_by: "path ASC",
};

#[derive(Debug, Deserialize)]
pub struct SeoLookup {
    pub path: String,
}

fn validate_fields(
    path: Option<&String>,
    title: Option<&String>,
    description: &Option<String>,
    keywords: &Option<String>,
    og_image_url: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(path) = path {
        if let Err(e) = validate_site_path(path) {
            errors.add("path", e);
        }
    }
    if let Some(title) = title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Err(e) = validate_optional(description, "Description", 500) {
        errors.add("description", e);
    }
    if let Err(e) = validate_optional(keywords, "Keywords", 500) {
        errors.add("keywords", e);
    }
    if let Err(e) = validate_url(og_image_url, "ogImageUrl") {
        errors.add("ogImageUrl", e);
    }

    errors.finish()
}

async fn path_taken(
    state: &AppState,
    path: &str,
    exclude_id: Option<&str>,
) -> Result<bool, ApiError> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM seo_meta WHERE path = ? AND deleted_at IS NULL")
            .bind(path)
            .fetch_optional(&state.db)
            .await?;

    Ok(match existing {
        Some((id,)) => exclude_id != Some(id.as_str()),
        None => false,
    })
}

/// Public: metadata for one site path
pub async fn get_by_path(
    State(state): State<Arc<AppState>>,
    Query(lookup): Query<SeoLookup>,
) -> Result<Json<SeoMeta>, ApiError> {
    let meta: Option<SeoMeta> =
        sqlx::query_as("SELECT * FROM seo_meta WHERE path = ? AND deleted_at IS NULL")
            .bind(&lookup.path)
            .fetch_optional(&state.db)
            .await?;

    meta.map(Json)
        .ok_or_else(|| ApiError::not_found("No SEO entry for that path"))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<SeoMeta>>, ApiError> {
    Ok(Json(fetch_page(&state.db, &SEO, &query, &[]).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SeoMeta>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<SeoMeta>(&state.db, "seo_meta", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("SEO entry not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateSeoMetaRequest>,
) -> Result<(StatusCode, Json<SeoMeta>), ApiError> {
    validate_fields(
        Some(&req.path),
        Some(&req.title),
        &req.description,
        &req.keywords,
        &req.og_image_url,
    )?;

    if path_taken(&state, &req.path, None).await? {
        return Err(ApiError::validation_field(
            "path",
            "An SEO entry already exists for that path",
        ));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO seo_meta (id, path, title, description, keywords, og_image_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.path)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.keywords)
    .bind(&req.og_image_url)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let meta: SeoMeta = sqlx::query_as("SELECT * FROM seo_meta WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::SEO_META, actions::CREATE),
        resource_types::SEO_META,
        Some(&meta.id),
        Some(&meta.path),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(meta)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateSeoMetaRequest>,
) -> Result<Json<SeoMeta>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(
        req.path.as_ref(),
        req.title.as_ref(),
        &req.description,
        &req.keywords,
        &req.og_image_url,
    )?;

    let _existing = find_by_id::<SeoMeta>(&state.db, "seo_meta", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("SEO entry not found"))?;

    if let Some(path) = &req.path {
        if path_taken(&state, path, Some(&id)).await? {
            return Err(ApiError::validation_field(
                "path",
                "An SEO entry already exists for that path",
            ));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE seo_meta SET
            path = COALESCE(?, path),
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            keywords = COALESCE(?, keywords),
            og_image_url = COALESCE(?, og_image_url),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.path)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.keywords)
    .bind(&req.og_image_url)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let meta: SeoMeta = sqlx::query_as("SELECT * FROM seo_meta WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::SEO_META, actions::UPDATE),
        resource_types::SEO_META,
        Some(&meta.id),
        Some(&meta.path),
        &user,
        &headers,
    )
    .await;

    Ok(Json(meta))
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

    if !soft_delete(&state.db, "seo_meta", &id).await? {
        return Err(ApiError::not_found("SEO entry not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::SEO_META, actions::DELETE),
        resource_types::SEO_META,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_path_taken_respects_exclusion() {
        let db = test_pool().await;
        let state = AppState {
            config: crate::config::Config::default(),
            db,
        };

        // The seeder creates the "/" entry
        let (home_id,): (String,) = sqlx::query_as("SELECT id FROM seo_meta WHERE path = '/'")
            .fetch_one(&state.db)
            .await
            .unwrap();

        assert!(path_taken(&state, "/", None).await.unwrap());
        assert!(!path_taken(&state, "/", Some(&home_id)).await.unwrap());
        assert!(!path_taken(&state, "/about", None).await.unwrap());
    }
}
