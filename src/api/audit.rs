//! Audit log endpoints and helpers.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use std::{net::SocketAddr, sync::Arc};

use crate::db::{
    list_audit_logs, log_audit, AuditLog, AuditLogFilter, ListQuery, Paginated, User,
};
use crate::AppState;

use super::error::ApiError;

/// Extract the client IP from forwarding headers, falling back to the
/// connection address.
pub fn extract_client_ip(headers: &HeaderMap, conn_info: Option<&SocketAddr>) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first_ip) = forwarded.split(',').next() {
            let ip = first_ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        let ip = real_ip.trim();
        if !ip.is_empty() {
            return Some(ip.to_string());
        }
    }

    conn_info.map(|addr| addr.ip().to_string())
}

/// Record an audit event without failing the request on error.
pub async fn audit_log(
    state: &AppState,
    action: &str,
    resource_type: &str,
    resource_id: Option<&str>,
    resource_name: Option<&str>,
    user: &User,
    headers: &HeaderMap,
) {
    let ip = extract_client_ip(headers, None);
    if let Err(e) = log_audit(
        &state.db,
        action,
        resource_type,
        resource_id,
        resource_name,
        Some(&user.id),
        ip.as_deref(),
    )
    .await
    {
        tracing::warn!(
            action = action,
            resource_type = resource_type,
            error = %e,
            "Failed to create audit log entry"
        );
    }
}

/// List audit logs with filtering and pagination
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<AuditLogFilter>,
) -> Result<Json<Paginated<AuditLog>>, ApiError> {
    let result = list_audit_logs(&state.db, &query, &filter).await?;
    Ok(Json(result))
}

/// Distinct action types, for the filtering UI
pub async fn list_action_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let actions: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT action FROM audit_logs ORDER BY action")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(actions.into_iter().map(|(a,)| a).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(
            extract_client_ip(&headers, None),
            Some("203.0.113.9".to_string())
        );
    }

    #[test]
    fn test_extract_client_ip_falls_back() {
        let headers = HeaderMap::new();
        let addr: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        assert_eq!(
            extract_client_ip(&headers, Some(&addr)),
            Some("192.0.2.4".to_string())
        );
        assert_eq!(extract_client_ip(&headers, None), None);
    }
}
