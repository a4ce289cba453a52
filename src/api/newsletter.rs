//! Newsletter subscription endpoints.
//!
//! Subscriber rows are plain PII, so admin DELETE removes them outright.
//! A duplicate email surfaces as 409 through the UNIQUE constraint.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, hard_delete, resource_types, ListQuery, ListSpec, NewsletterSubscriber,
    Paginated, SubscribeRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::ApiError;
use super::validation::{validate_email, validate_uuid};

const SUBSCRIBERS: ListSpec = ListSpec {
    table: "newsletter_subscribers",
    search_columns: &["email"],
    active_column: Some("is_active"),
    order_by: "created_at DESC",
};

/// Public: subscribe an email address
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<NewsletterSubscriber>), ApiError> {
    let email = req.email.trim().to_lowercase();
    if let Err(e) = validate_email(&email) {
        return Err(ApiError::validation_field("email", e));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO newsletter_subscribers (id, email, is_active, created_at, updated_at)
        VALUES (?, ?, 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&email)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let subscriber: NewsletterSubscriber =
        sqlx::query_as("SELECT * FROM newsletter_subscribers WHERE id = ?")
            .bind(&id)
            .fetch_one(&state.db)
            .await?;

    Ok((StatusCode::CREATED, Json(subscriber)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<NewsletterSubscriber>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &SUBSCRIBERS, &query, &[]).await?,
    ))
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

    if !hard_delete(&state.db, "newsletter_subscribers", &id).await? {
        return Err(ApiError::not_found("Subscriber not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::NEWSLETTER_SUBSCRIBER, actions::DELETE),
        resource_types::NEWSLETTER_SUBSCRIBER,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
