//! Home-page hero carousel endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CreateHeroSlideRequest,
    HeroSlide, ListQuery, ListSpec, Paginated, UpdateHeroSlideRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_required, validate_url, validate_uuid};

const HERO_SLIDES: ListSpec = ListSpec {
    table: "hero_slides",
    search_columns: &["title", "subtitle"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, created_at ASC",
};

fn validate_fields(
    title: Option<&String>,
    image_url: Option<&String>,
    subtitle: &Option<String>,
    cta_label: &Option<String>,
    cta_url: &Option<String>,
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
    if let Err(e) = validate_optional(subtitle, "Subtitle", 500) {
        errors.add("subtitle", e);
    }
    if let Err(e) = validate_optional(cta_label, "CTA label", 100) {
        errors.add("ctaLabel", e);
    }
    if let Err(e) = validate_url(cta_url, "ctaUrl") {
        errors.add("ctaUrl", e);
    }

    errors.finish()
}

/// Public: active slides in carousel order
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<HeroSlide>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(
        fetch_page(&state.db, &HERO_SLIDES, &query, &[]).await?,
    ))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<HeroSlide>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &HERO_SLIDES, &query, &[]).await?,
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<HeroSlide>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<HeroSlide>(&state.db, "hero_slides", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Hero slide not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateHeroSlideRequest>,
) -> Result<(StatusCode, Json<HeroSlide>), ApiError> {
    validate_fields(
        Some(&req.title),
        Some(&req.image_url),
        &req.subtitle,
        &req.cta_label,
        &req.cta_url,
    )?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO hero_slides (id, title, subtitle, image_url, cta_label, cta_url, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.subtitle)
    .bind(&req.image_url)
    .bind(&req.cta_label)
    .bind(&req.cta_url)
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let slide: HeroSlide = sqlx::query_as("SELECT * FROM hero_slides WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::HERO_SLIDE, actions::CREATE),
        resource_types::HERO_SLIDE,
        Some(&slide.id),
        Some(&slide.title),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(slide)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateHeroSlideRequest>,
) -> Result<Json<HeroSlide>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(
        req.title.as_ref(),
        req.image_url.as_ref(),
        &req.subtitle,
        &req.cta_label,
        &req.cta_url,
    )?;

    let _existing = find_by_id::<HeroSlide>(&state.db, "hero_slides", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hero slide not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE hero_slides SET
            title = COALESCE(?, title),
            subtitle = COALESCE(?, subtitle),
            image_url = COALESCE(?, image_url),
            cta_label = COALESCE(?, cta_label),
            cta_url = COALESCE(?, cta_url),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.subtitle)
    .bind(&req.image_url)
    .bind(&req.cta_label)
    .bind(&req.cta_url)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let slide: HeroSlide = sqlx::query_as("SELECT * FROM hero_slides WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::HERO_SLIDE, actions::UPDATE),
        resource_types::HERO_SLIDE,
        Some(&slide.id),
        Some(&slide.title),
        &user,
        &headers,
    )
    .await;

    Ok(Json(slide))
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

    if !soft_delete(&state.db, "hero_slides", &id).await? {
        return Err(ApiError::not_found("Hero slide not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::HERO_SLIDE, actions::DELETE),
        resource_types::HERO_SLIDE,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
