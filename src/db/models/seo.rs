//! Per-path SEO metadata.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SeoMeta {
    pub id: String,
    /// Site path this entry applies to, e.g. "/about". Unique.
    pub path: String,
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_image_url: Option<String>,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeoMetaRequest {
    pub path: String,
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_image_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSeoMetaRequest {
    pub path: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_image_url: Option<String>,
}
