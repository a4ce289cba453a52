//! Audit log of admin actions.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::common::{last_page, ListMeta, ListQuery, Paginated, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub created_at: String,
}

/// Entity-specific filters for the audit list, combined with the common
/// `ListQuery` at the handler.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditLogFilter {
    /// Filter by action (e.g. "news.create")
    pub action: Option<String>,
    /// Filter by resource type (e.g. "news")
    #[serde(rename = "resourceType")]
    pub resource_type: Option<String>,
    /// Filter by resource ID
    #[serde(rename = "resourceId")]
    pub resource_id: Option<String>,
    /// Filter by acting user ID
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    /// Inclusive start of a created_at range (RFC 3339)
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    /// Inclusive end of a created_at range (RFC 3339)
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

/// Audit action names, `<resource>.<verb>`.
pub mod actions {
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";

    pub const AUTH_LOGIN: &str = "auth.login";
    pub const AUTH_LOGOUT: &str = "auth.logout";
    pub const CONTACT_MARK_READ: &str = "contact.mark_read";

    pub fn named(resource_type: &str, verb: &str) -> String {
        format!("{}.{}", resource_type, verb)
    }
}

/// Resource types recorded in the audit log.
pub mod resource_types {
    pub const ANNOUNCEMENT: &str = "announcement";
    pub const BOARD_MEMBER: &str = "board_member";
    pub const CAREER: &str = "career";
    pub const CONTACT_MESSAGE: &str = "contact_message";
    pub const DOWNLOAD: &str = "download";
    pub const EVENT: &str = "event";
    pub const FAQ: &str = "faq";
    pub const GALLERY_ITEM: &str = "gallery_item";
    pub const HERO_SLIDE: &str = "hero_slide";
    pub const LICENSE: &str = "license";
    pub const LICENSE_TYPE: &str = "license_type";
    pub const MANAGEMENT_MEMBER: &str = "management_member";
    pub const MEMBER: &str = "member";
    pub const NEWS: &str = "news";
    pub const NEWSLETTER_SUBSCRIBER: &str = "newsletter_subscriber";
    pub const PAGE: &str = "page";
    pub const PARTNER: &str = "partner";
    pub const SEO_META: &str = "seo_meta";
    pub const SERVICE: &str = "service";
    pub const SETTING: &str = "setting";
    pub const USER: &str = "user";
    pub const WAIVER: &str = "waiver";
}

/// Record an audit event.
pub async fn log_audit(
    db: &SqlitePool,
    action: &str,
    resource_type: &str,
    resource_id: Option<&str>,
    resource_name: Option<&str>,
    user_id: Option<&str>,
    ip_address: Option<&str>,
) -> Result<(), sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, action, resource_type, resource_id, resource_name, user_id, ip_address, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(action)
    .bind(resource_type)
    .bind(resource_id)
    .bind(resource_name)
    .bind(user_id)
    .bind(ip_address)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::debug!(
        action = action,
        resource_type = resource_type,
        resource_id = resource_id,
        user_id = user_id,
        "Audit log recorded"
    );

    Ok(())
}

/// List audit logs with filtering and pagination.
///
/// The audit table has no soft deletes or active flag, so it builds its
/// own WHERE clause instead of going through `fetch_page`.
pub async fn list_audit_logs(
    db: &SqlitePool,
    query: &ListQuery,
    filter: &AuditLogFilter,
) -> Result<Paginated<AuditLog>, sqlx::Error> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    let equality_filters = [
        ("action", &filter.action),
        ("resource_type", &filter.resource_type),
        ("resource_id", &filter.resource_id),
        ("user_id", &filter.user_id),
    ];
    for (column, value) in equality_filters {
        if let Some(value) = value {
            conditions.push(format!("{} = ?", column));
            bindings.push(value.clone());
        }
    }

    if let Some(start) = &filter.start_date {
        conditions.push("created_at >= ?".to_string());
        bindings.push(start.clone());
    }
    if let Some(end) = &filter.end_date {
        conditions.push("created_at <= ?".to_string());
        bindings.push(end.clone());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM audit_logs {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for binding in &bindings {
        count_query = count_query.bind(binding);
    }
    let total = count_query.fetch_one(db).await?;

    let sql = format!(
        "SELECT * FROM audit_logs {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut rows_query = sqlx::query_as::<_, AuditLog>(&sql);
    for binding in &bindings {
        rows_query = rows_query.bind(binding);
    }
    let data = rows_query.bind(limit).bind(offset).fetch_all(db).await?;

    Ok(Paginated {
        data,
        meta: ListMeta {
            total,
            page,
            limit,
            last_page: last_page(total, limit),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_log_and_filter() {
        let db = test_pool().await;

        log_audit(&db, "news.create", resource_types::NEWS, Some("n1"), Some("Launch"), Some("u1"), None)
            .await
            .unwrap();
        log_audit(&db, "news.delete", resource_types::NEWS, Some("n1"), Some("Launch"), Some("u1"), None)
            .await
            .unwrap();
        log_audit(&db, "faq.create", resource_types::FAQ, Some("f1"), None, Some("u2"), None)
            .await
            .unwrap();

        let all = list_audit_logs(&db, &ListQuery::default(), &AuditLogFilter::default())
            .await
            .unwrap();
        assert_eq!(all.meta.total, 3);

        let filter = AuditLogFilter {
            resource_type: Some(resource_types::NEWS.to_string()),
            ..Default::default()
        };
        let news_only = list_audit_logs(&db, &ListQuery::default(), &filter)
            .await
            .unwrap();
        assert_eq!(news_only.meta.total, 2);

        let filter = AuditLogFilter {
            action: Some("faq.create".to_string()),
            ..Default::default()
        };
        let one = list_audit_logs(&db, &ListQuery::default(), &filter)
            .await
            .unwrap();
        assert_eq!(one.meta.total, 1);
        assert_eq!(one.data[0].user_id.as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn test_action_naming() {
        assert_eq!(actions::named(resource_types::NEWS, actions::CREATE), "news.create");
    }
}
