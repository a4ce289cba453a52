//! Default rows inserted on first startup.

use sqlx::SqlitePool;

const DEFAULT_SETTINGS: &[(&str, &str, &str)] = &[
    ("site_name", "My Organization", "Name shown in the site header and titles"),
    ("contact_email", "info@example.org", "Public contact email address"),
    ("contact_phone", "", "Public contact phone number"),
    ("facebook_url", "", "Facebook page link"),
    ("twitter_url", "", "X/Twitter profile link"),
    ("instagram_url", "", "Instagram profile link"),
];

/// Seed default settings and the home-page SEO entry.
///
/// Uses INSERT OR IGNORE so admin edits survive restarts.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    for (key, value, description) in DEFAULT_SETTINGS {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO settings (id, key, value, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO seo_meta (id, path, title, description, created_at, updated_at)
        VALUES (?, '/', 'Home', 'Welcome to our website', ?, ?)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}
