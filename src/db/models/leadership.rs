//! Board and management profiles.
//!
//! The two tables are identical in shape but deliberately separate:
//! they are curated and ordered independently on the site.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BoardMember {
    pub id: String,
    pub name: String,
    pub position: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ManagementMember {
    pub id: String,
    pub name: String,
    pub position: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Shared request shape for both profile tables.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub name: String,
    pub position: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub position: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}
