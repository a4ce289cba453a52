//! Photo gallery items.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub category: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGalleryItemRequest {
    pub title: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub category: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGalleryItemRequest {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}
