//! The shared list convention: every admin list endpoint accepts
//! `page`/`limit`/`search`/`isActive`, builds a WHERE clause that always
//! excludes soft-deleted rows, and returns `{ data, meta }`.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters common to every list endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListQuery {
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
    /// Items per page (defaults to 20, max 100)
    pub limit: Option<i64>,
    /// Case-insensitive substring match over the entity's search columns
    pub search: Option<String>,
    /// Filter on the active flag
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
}

/// Pagination metadata returned with every list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "lastPage")]
    pub last_page: i64,
}

/// List response envelope: `{ "data": [...], "meta": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

/// Static description of how one table participates in the list convention.
pub struct ListSpec {
    pub table: &'static str,
    /// Columns matched by the `search` parameter
    pub search_columns: &'static [&'static str],
    /// Column behind the `isActive` filter, None for tables without one
    pub active_column: Option<&'static str>,
    pub order_by: &'static str,
}

pub fn last_page(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Fetch one page of rows plus the total count.
///
/// `extra` holds entity-specific equality filters, e.g. `("category", value)`
/// or `("member_id", id)`. Column names come from call sites, never from
/// request input; only values are bound.
pub async fn fetch_page<T>(
    db: &SqlitePool,
    spec: &ListSpec,
    query: &ListQuery,
    extra: &[(&str, String)],
) -> Result<Paginated<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let mut conditions = vec!["deleted_at IS NULL".to_string()];
    let mut bindings: Vec<String> = Vec::new();

    if let (Some(active), Some(column)) = (query.is_active, spec.active_column) {
        conditions.push(format!("{} = ?", column));
        bindings.push(if active { "1" } else { "0" }.to_string());
    }

    if let Some(term) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let clause = spec
            .search_columns
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
            .collect::<Vec<_>>()
            .join(" OR ");
        conditions.push(format!("({})", clause));
        let pattern = format!("%{}%", escape_like(term));
        for _ in spec.search_columns {
            bindings.push(pattern.clone());
        }
    }

    for (column, value) in extra {
        conditions.push(format!("{} = ?", column));
        bindings.push(value.clone());
    }

    let where_clause = format!("WHERE {}", conditions.join(" AND "));

    let count_sql = format!("SELECT COUNT(*) FROM {} {}", spec.table, where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for binding in &bindings {
        count_query = count_query.bind(binding);
    }
    let total = count_query.fetch_one(db).await?;

    let sql = format!(
        "SELECT * FROM {} {} ORDER BY {} LIMIT ? OFFSET ?",
        spec.table, where_clause, spec.order_by
    );
    let mut rows_query = sqlx::query_as::<_, T>(&sql);
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

/// Escape LIKE wildcards in user-supplied search terms.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Fetch a row by id, including soft-deleted ones. Admin detail views
/// use this so a deleted record can still be inspected.
pub async fn find_by_id<T>(db: &SqlitePool, table: &str, id: &str) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {} WHERE id = ?", table);
    sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(db).await
}

/// Fetch a non-deleted row by id.
pub async fn find_active_by_id<T>(
    db: &SqlitePool,
    table: &str,
    id: &str,
) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {} WHERE id = ? AND deleted_at IS NULL", table);
    sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(db).await
}

/// Soft-delete a row by stamping `deleted_at`. Returns false when the
/// row does not exist or is already deleted.
pub async fn soft_delete(db: &SqlitePool, table: &str, id: &str) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();
    let sql = format!(
        "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        table
    );
    let result = sqlx::query(&sql)
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove a row outright. Used only for entities holding third-party
/// PII (contact messages, newsletter subscribers).
pub async fn hard_delete(db: &SqlitePool, table: &str, id: &str) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table);
    let result = sqlx::query(&sql).bind(id).execute(db).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, Faq};

    #[test]
    fn test_last_page_is_ceil() {
        assert_eq!(last_page(0, 20), 0);
        assert_eq!(last_page(1, 20), 1);
        assert_eq!(last_page(20, 20), 1);
        assert_eq!(last_page(21, 20), 2);
        assert_eq!(last_page(100, 7), 15);
        assert_eq!(last_page(5, 0), 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
    }

    const FAQS: ListSpec = ListSpec {
        table: "faqs",
        search_columns: &["question", "answer"],
        active_column: Some("is_active"),
        order_by: "sort_order ASC, created_at ASC",
    };

    async fn insert_faq(db: &SqlitePool, question: &str, active: bool, order: i64) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO faqs (id, question, answer, sort_order, is_active, created_at, updated_at)
             VALUES (?, ?, 'answer text', ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(question)
        .bind(order)
        .bind(active)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_fetch_page_pagination_meta() {
        let db = test_pool().await;
        for i in 0..25 {
            insert_faq(&db, &format!("question {}", i), true, i).await;
        }

        let query = ListQuery {
            page: Some(2),
            limit: Some(10),
            ..Default::default()
        };
        let page: Paginated<Faq> = fetch_page(&db, &FAQS, &query, &[]).await.unwrap();

        assert_eq!(page.meta.total, 25);
        assert_eq!(page.meta.page, 2);
        assert_eq!(page.meta.limit, 10);
        assert_eq!(page.meta.last_page, 3);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.data[0].question, "question 10");
    }

    #[tokio::test]
    async fn test_fetch_page_excludes_soft_deleted() {
        let db = test_pool().await;
        let keep = insert_faq(&db, "kept", true, 0).await;
        let gone = insert_faq(&db, "dropped", true, 1).await;

        assert!(soft_delete(&db, "faqs", &gone).await.unwrap());

        let page: Paginated<Faq> = fetch_page(&db, &FAQS, &ListQuery::default(), &[])
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].id, keep);

        // Detail lookups: the default one misses, the admin one still sees it
        assert!(find_active_by_id::<Faq>(&db, "faqs", &gone)
            .await
            .unwrap()
            .is_none());
        let deleted = find_by_id::<Faq>(&db, "faqs", &gone).await.unwrap().unwrap();
        assert!(deleted.deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_page_search_and_active_filter() {
        let db = test_pool().await;
        insert_faq(&db, "How do I pay my Membership fee?", true, 0).await;
        insert_faq(&db, "Where are your offices?", true, 1).await;
        insert_faq(&db, "membership renewals", false, 2).await;

        let query = ListQuery {
            search: Some("membership".to_string()),
            ..Default::default()
        };
        let page: Paginated<Faq> = fetch_page(&db, &FAQS, &query, &[]).await.unwrap();
        assert_eq!(page.meta.total, 2);

        let query = ListQuery {
            search: Some("membership".to_string()),
            is_active: Some(true),
            ..Default::default()
        };
        let page: Paginated<Faq> = fetch_page(&db, &FAQS, &query, &[]).await.unwrap();
        assert_eq!(page.meta.total, 1);
        assert!(page.data[0].question.contains("Membership"));
    }

    #[tokio::test]
    async fn test_soft_delete_twice_reports_missing() {
        let db = test_pool().await;
        let id = insert_faq(&db, "once", true, 0).await;

        assert!(soft_delete(&db, "faqs", &id).await.unwrap());
        assert!(!soft_delete(&db, "faqs", &id).await.unwrap());
        assert!(!soft_delete(&db, "faqs", "missing").await.unwrap());
    }
}
