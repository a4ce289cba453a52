//! News articles.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: String,
    pub title: String,
    /// URL slug, unique among non-deleted articles
    pub slug: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub title: String,
    /// Derived from the title when omitted
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub is_active: Option<bool>,
}
