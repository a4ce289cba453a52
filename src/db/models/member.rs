//! Registered members and fee waivers granted to them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub category: Option<String>,
    pub joined_at: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Waiver {
    pub id: String,
    pub member_id: String,
    pub reason: String,
    pub amount_cents: i64,
    pub granted_at: Option<String>,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub category: Option<String>,
    pub joined_at: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub category: Option<String>,
    pub joined_at: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWaiverRequest {
    pub member_id: String,
    pub reason: String,
    pub amount_cents: Option<i64>,
    pub granted_at: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWaiverRequest {
    pub reason: Option<String>,
    pub amount_cents: Option<i64>,
    pub granted_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemberFilter {
    #[serde(rename = "memberId")]
    pub member_id: Option<String>,
}
