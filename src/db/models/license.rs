//! Licenses issued to members, and the fee schedule behind them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LicenseType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub annual_fee_cents: i64,
    pub sort_order: i64,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: String,
    pub member_id: String,
    pub license_type_id: String,
    pub license_number: String,
    pub issued_at: Option<String>,
    pub expires_at: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicenseTypeRequest {
    pub name: String,
    pub description: Option<String>,
    pub annual_fee_cents: Option<i64>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLicenseTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub annual_fee_cents: Option<i64>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicenseRequest {
    pub member_id: String,
    pub license_type_id: String,
    pub license_number: String,
    pub issued_at: Option<String>,
    pub expires_at: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLicenseRequest {
    pub license_type_id: Option<String>,
    pub license_number: Option<String>,
    pub issued_at: Option<String>,
    pub expires_at: Option<String>,
    pub is_active: Option<bool>,
}

/// Entity-specific list filters for licenses.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LicenseFilter {
    #[serde(rename = "memberId")]
    pub member_id: Option<String>,
    #[serde(rename = "licenseTypeId")]
    pub license_type_id: Option<String>,
}
