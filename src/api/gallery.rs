//! Photo gallery endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CategoryFilter,
    CreateGalleryItemRequest, GalleryItem, ListQuery, ListSpec, Paginated,
    UpdateGalleryItemRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_required, validate_url, validate_uuid};

const GALLERY: ListSpec = ListSpec {
    table: "gallery_items",
    search_columns: &["title", "caption", "category"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, created_at DESC",
};

fn validate_fields(
    title: Option<&String>,
    image_url: Option<&String>,
    caption: &Option<String>,
    category: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(title) = title {
        if let Err(e) = validate_required(title, "Title", 200) {
            errors.add("title", e);
        }
    }
    if let Some(image_url) = image_url {
        if image_url.is_empty() {
            errors.add("imageUrl", "Image URL is required");
        } else if let Err(e) = validate_url(&Some(image_url.clone()), "imageUrl") {
            errors.add("imageUrl", e);
        }
    }
    if let Err(e) = validate_optional(caption, "Caption", 1000) {
        errors.add("caption", e);
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

/// Public: active gallery items, optionally narrowed by category
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Json<Paginated<GalleryItem>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(
        fetch_page(&state.db, &GALLERY, &query, &category_extra(&filter)).await?,
    ))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Json<Paginated<GalleryItem>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &GALLERY, &query, &category_extra(&filter)).await?,
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GalleryItem>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<GalleryItem>(&state.db, "gallery_items", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Gallery item not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateGalleryItemRequest>,
) -> Result<(StatusCode, Json<GalleryItem>), ApiError> {
    validate_fields(
        Some(&req.title),
        Some(&req.image_url),
        &req.caption,
        &req.category,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO gallery_items (id, title, caption, image_url, category, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.caption)
    .bind(&req.image_url)
    .bind(&req.category)
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let item: GalleryItem = sqlx::query_as("SELECT * FROM gallery_items WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::GALLERY_ITEM, actions::CREATE),
        resource_types::GALLERY_ITEM,
        Some(&item.id),
        Some(&item.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateGalleryItemRequest>,
) -> Result<Json<GalleryItem>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(
        req.title.as_ref(),
        req.image_url.as_ref(),
        &req.caption,
        &req.category,
    )?;

    let _existing = find_by_id::<GalleryItem>(&state.db, "gallery_items", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Gallery item not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE gallery_items SET
            title = COALESCE(?, title),
            caption = COALESCE(?, caption),
            image_url = COALESCE(?, image_url),
            category = COALESCE(?, category),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.caption)
    .bind(&req.image_url)
    .bind(&req.category)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let item: GalleryItem = sqlx::query_as("SELECT * FROM gallery_items WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::GALLERY_ITEM, actions::UPDATE),
        resource_types::GALLERY_ITEM,
        Some(&item.id),
        Some(&item.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(item))
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

    if !soft_delete(&state.db, "gallery_items", &id).await? {
        return Err(ApiError::not_found("Gallery item not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::GALLERY_ITEM, actions::DELETE),
        resource_types::GALLERY_ITEM,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
