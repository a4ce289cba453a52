//! FAQ endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, fetch_page, find_by_id, resource_types, soft_delete, CategoryFilter,
    CreateFaqRequest, Faq, ListQuery, ListSpec, Paginated, UpdateFaqRequest, User,
};
use crate::AppState;

use super::audit::audit_log;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_optional, validate_required, validate_uuid};

const FAQS: ListSpec = ListSpec {
    table: "faqs",
    search_columns: &["question", "answer"],
    active_column: Some("is_active"),
    order_by: "sort_order ASC, created_at ASC",
};

fn validate_fields(
    question: Option<&String>,
    answer: Option<&String>,
    category: &Option<String>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(question) = question {
        if let Err(e) = validate_required(question, "Question", 500) {
            errors.add("question", e);
        }
    }
    if let Some(answer) = answer {
        if let Err(e) = validate_required(answer, "Answer", 10_000) {
            errors.add("answer", e);
        }
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

/// Public: active FAQs in display order
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Json<Paginated<Faq>>, ApiError> {
    let query = ListQuery {
        is_active: Some(true),
        ..query
    };
    Ok(Json(
        fetch_page(&state.db, &FAQS, &query, &category_extra(&filter)).await?,
    ))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Json<Paginated<Faq>>, ApiError> {
    Ok(Json(
        fetch_page(&state.db, &FAQS, &query, &category_extra(&filter)).await?,
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Faq>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }

    find_by_id::<Faq>(&state.db, "faqs", &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("FAQ not found"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Json(req): Json<CreateFaqRequest>,
) -> Result<(StatusCode, Json<Faq>), ApiError> {
    validate_fields(Some(&req.question), Some(&req.answer), &req.category)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO faqs (id, question, answer, category, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.question)
    .bind(&req.answer)
    .bind(&req.category)
    .bind(req.sort_order.unwrap_or(0))
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let faq: Faq = sqlx::query_as("SELECT * FROM faqs WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::FAQ, actions::CREATE),
        resource_types::FAQ,
        Some(&faq.id),
        Some(&faq.question),
        &user,
        &headers,
    )
    .await;

    Ok((StatusCode::CREATED, Json(faq)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateFaqRequest>,
) -> Result<Json<Faq>, ApiError> {
    if let Err(e) = validate_uuid(&id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    validate_fields(req.question.as_ref(), req.answer.as_ref(), &req.category)?;

    let _existing = find_by_id::<Faq>(&state.db, "faqs", &id)
        .await?
        .ok_or_else(|| ApiError::not_found("FAQ not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE faqs SET
            question = COALESCE(?, question),
            answer = COALESCE(?, answer),
            category = COALESCE(?, category),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.question)
    .bind(&req.answer)
    .bind(&req.category)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let faq: Faq = sqlx::query_as("SELECT * FROM faqs WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        &actions::named(resource_types::FAQ, actions::UPDATE),
        resource_types::FAQ,
        Some(&faq.id),
        Some(&faq.question),
        &user,
        &headers,
    )
    .await;

    Ok(Json(faq))
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

    if !soft_delete(&state.db, "faqs", &id).await? {
        return Err(ApiError::not_found("FAQ not found"));
    }

    audit_log(
        &state,
        &actions::named(resource_types::FAQ, actions::DELETE),
        resource_types::FAQ,
        Some(&id),
        None,
        &user,
        &headers,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
