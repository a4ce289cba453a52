//! HTTP API: public site endpoints plus the session-gated admin surface.

pub mod announcements;
pub mod audit;
pub mod auth;
pub mod careers;
pub mod contacts;
pub mod downloads;
pub mod error;
pub mod events;
pub mod faqs;
pub mod gallery;
pub mod hero_slides;
pub mod leadership;
pub mod licenses;
pub mod members;
pub mod news;
pub mod newsletter;
pub mod pages;
pub mod partners;
pub mod seo;
pub mod services;
pub mod settings;
pub mod validation;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Routes readable without a session.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/announcements", get(announcements::list_public))
        .route("/api/board-members", get(leadership::list_board_public))
        .route(
            "/api/management-members",
            get(leadership::list_management_public),
        )
        .route("/api/careers", get(careers::list_public))
        .route("/api/careers/:id", get(careers::get_public))
        .route("/api/contact", post(contacts::submit))
        .route("/api/downloads", get(downloads::list_public))
        .route("/api/events", get(events::list_public))
        .route("/api/events/:id", get(events::get_public))
        .route("/api/faqs", get(faqs::list_public))
        .route("/api/gallery", get(gallery::list_public))
        .route("/api/hero-slides", get(hero_slides::list_public))
        .route("/api/license-types", get(licenses::list_types_public))
        .route("/api/news", get(news::list_public))
        .route("/api/news/:slug", get(news::get_by_slug))
        .route("/api/newsletter", post(newsletter::subscribe))
        .route("/api/pages/:slug", get(pages::get_by_slug))
        .route("/api/partners", get(partners::list_public))
        .route("/api/seo", get(seo::get_by_path))
        .route("/api/services", get(services::list_public))
        .route("/api/settings", get(settings::get_public))
}

/// The admin surface. Every route here sits behind `require_admin`.
fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/announcements",
            get(announcements::list).post(announcements::create),
        )
        .route(
            "/announcements/:id",
            get(announcements::get)
                .patch(announcements::update)
                .delete(announcements::delete),
        )
        .route(
            "/board-members",
            get(leadership::list_board).post(leadership::create_board),
        )
        .route(
            "/board-members/:id",
            get(leadership::get_board)
                .patch(leadership::update_board)
                .delete(leadership::delete_board),
        )
        .route(
            "/management-members",
            get(leadership::list_management).post(leadership::create_management),
        )
        .route(
            "/management-members/:id",
            get(leadership::get_management)
                .patch(leadership::update_management)
                .delete(leadership::delete_management),
        )
        .route("/careers", get(careers::list).post(careers::create))
        .route(
            "/careers/:id",
            get(careers::get).patch(careers::update).delete(careers::delete),
        )
        .route("/contact-messages", get(contacts::list))
        .route(
            "/contact-messages/:id",
            get(contacts::get).delete(contacts::delete),
        )
        .route("/contact-messages/:id/read", patch(contacts::mark_read))
        .route("/downloads", get(downloads::list).post(downloads::create))
        .route(
            "/downloads/:id",
            get(downloads::get)
                .patch(downloads::update)
                .delete(downloads::delete),
        )
        .route("/events", get(events::list).post(events::create))
        .route(
            "/events/:id",
            get(events::get).patch(events::update).delete(events::delete),
        )
        .route("/faqs", get(faqs::list).post(faqs::create))
        .route(
            "/faqs/:id",
            get(faqs::get).patch(faqs::update).delete(faqs::delete),
        )
        .route("/gallery", get(gallery::list).post(gallery::create))
        .route(
            "/gallery/:id",
            get(gallery::get).patch(gallery::update).delete(gallery::delete),
        )
        .route(
            "/hero-slides",
            get(hero_slides::list).post(hero_slides::create),
        )
        .route(
            "/hero-slides/:id",
            get(hero_slides::get)
                .patch(hero_slides::update)
                .delete(hero_slides::delete),
        )
        .route(
            "/license-types",
            get(licenses::list_types).post(licenses::create_type),
        )
        .route(
            "/license-types/:id",
            get(licenses::get_type)
                .patch(licenses::update_type)
                .delete(licenses::delete_type),
        )
        .route("/licenses", get(licenses::list).post(licenses::create))
        .route(
            "/licenses/:id",
            get(licenses::get)
                .patch(licenses::update)
                .delete(licenses::delete),
        )
        .route("/members", get(members::list).post(members::create))
        .route(
            "/members/:id",
            get(members::get).patch(members::update).delete(members::delete),
        )
        .route(
            "/waivers",
            get(members::list_waivers).post(members::create_waiver),
        )
        .route(
            "/waivers/:id",
            get(members::get_waiver)
                .patch(members::update_waiver)
                .delete(members::delete_waiver),
        )
        .route("/news", get(news::list).post(news::create))
        .route(
            "/news/:id",
            get(news::get).patch(news::update).delete(news::delete),
        )
        .route("/newsletter-subscribers", get(newsletter::list))
        .route("/newsletter-subscribers/:id", delete(newsletter::delete))
        .route("/pages", get(pages::list).post(pages::create))
        .route(
            "/pages/:id",
            get(pages::get).patch(pages::update).delete(pages::delete),
        )
        .route("/partners", get(partners::list).post(partners::create))
        .route(
            "/partners/:id",
            get(partners::get)
                .patch(partners::update)
                .delete(partners::delete),
        )
        .route("/seo", get(seo::list).post(seo::create))
        .route(
            "/seo/:id",
            get(seo::get).patch(seo::update).delete(seo::delete),
        )
        .route("/services", get(services::list).post(services::create))
        .route(
            "/services/:id",
            get(services::get)
                .patch(services::update)
                .delete(services::delete),
        )
        .route("/settings", get(settings::list).post(settings::create))
        .route(
            "/settings/:id",
            get(settings::get)
                .patch(settings::update)
                .delete(settings::delete),
        )
        .route("/audit-logs", get(audit::list_logs))
        .route("/audit-logs/actions", get(audit::list_action_types))
        .layer(middleware::from_fn_with_state(state, auth::require_admin))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public_routes())
        .nest("/api/admin", admin_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{test_pool, DbPool, ROLE_ADMIN, ROLE_EDITOR};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use sha2::{Digest, Sha256};
    use tower::ServiceExt;

    async fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            config: Config::default(),
            db: test_pool().await,
        })
    }

    /// Insert a user with the given role and mint a live session,
    /// returning the bearer token.
    async fn seed_session(db: &DbPool, email: &str, role: &str) -> String {
        let now = chrono::Utc::now().to_rfc3339();
        let user_id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, created_at, updated_at)
            VALUES (?, ?, 'x', 'Test User', ?, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(email)
        .bind(role)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await
        .unwrap();

        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let token_hash = hex::encode(hasher.finalize());
        let expires_at = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&user_id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(db)
        .await
        .unwrap();

        token
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_admin_routes_are_gated_by_role() {
        let state = test_state().await;
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(get_request("/api/admin/news", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let editor = seed_session(&state.db, "editor@example.org", ROLE_EDITOR).await;
        let response = app
            .clone()
            .oneshot(get_request("/api/admin/news", Some(&editor)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin = seed_session(&state.db, "admin@example.org", ROLE_ADMIN).await;
        let response = app
            .oneshot(get_request("/api/admin/news", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_created_article_round_trips_all_fields() {
        let state = test_state().await;
        let app = router(state.clone());
        let admin = seed_session(&state.db, "admin@example.org", ROLE_ADMIN).await;

        let payload = serde_json::json!({
            "title": "Annual Report Published",
            "slug": "annual-report-published",
            "excerpt": "Highlights from the year",
            "body": "The full report is now available.",
            "imageUrl": "https://example.org/report.png",
            "publishedAt": "2026-08-01T09:00:00Z",
            "isActive": false,
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/admin/news")
            .header(header::AUTHORIZATION, format!("Bearer {}", admin))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(get_request(&format!("/api/admin/news/{}", id), Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;

        for field in [
            "title",
            "slug",
            "excerpt",
            "body",
            "imageUrl",
            "publishedAt",
            "isActive",
        ] {
            assert_eq!(fetched[field], payload[field], "field {} did not survive", field);
        }
        assert_eq!(fetched["deletedAt"], serde_json::Value::Null);
    }
}
