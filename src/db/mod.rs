pub mod models;
mod seeders;

pub use models::*;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("sitewright.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = connect(&db_url).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Open a pool against the given URL, apply pragmas, run migrations
/// and seed defaults. Split out of `init` so tests can run against
/// an in-memory database.
pub async fn connect(db_url: &str) -> Result<DbPool> {
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // All statements are idempotent (IF NOT EXISTS), so every migration
    // runs on every startup.
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;
    execute_sql(pool, include_str!("../../migrations/002_users.sql")).await?;
    execute_sql(pool, include_str!("../../migrations/003_audit_logs.sql")).await?;

    // Seed default settings and SEO entries (INSERT OR IGNORE)
    seeders::seed_defaults(pool).await?;

    info!("Migrations completed");
    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> DbPool {
    connect("sqlite::memory:")
        .await
        .expect("in-memory database should initialize")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_slug_is_reusable_after_soft_delete() {
        let pool = test_pool().await;
        let now = chrono::Utc::now().to_rfc3339();

        let insert = |id: &str| {
            sqlx::query(
                r#"
                INSERT INTO news (id, title, slug, body, created_at, updated_at)
                VALUES (?, 'Launch', 'launch', 'Body', ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(now.clone())
            .bind(now.clone())
        };

        insert("a").execute(&pool).await.unwrap();

        // A second live row with the same slug is rejected...
        assert!(insert("b").execute(&pool).await.is_err());

        // ...but once the first is soft-deleted the slug is free again.
        assert!(soft_delete(&pool, "news", "a").await.unwrap());
        insert("b").execute(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_defaults_are_seeded() {
        let pool = test_pool().await;

        let settings: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(settings.0 > 0);

        let home: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seo_meta WHERE path = '/'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(home.0, 1);
    }
}
