//! Job vacancy postings.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    pub id: String,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    /// Application deadline (RFC 3339); listings stay visible past it
    pub deadline: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCareerRequest {
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    pub deadline: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCareerRequest {
    pub title: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub deadline: Option<String>,
    pub is_active: Option<bool>,
}
