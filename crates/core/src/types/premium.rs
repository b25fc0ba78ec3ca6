//! Premium membership requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccessCode, PremiumRequestId, PremiumStatus};

/// A premium request as stored in the `premium_requests` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumRequest {
    pub id: PremiumRequestId,
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub tiktok: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub engagement_rate: Option<f64>,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub status: PremiumStatus,
    /// Assigned only on approval.
    #[serde(default)]
    pub access_code: Option<AccessCode>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Insert shape submitted by the public request form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPremiumRequest {
    pub full_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
}

/// Review decision written by the back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRequestPatch {
    pub status: PremiumStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<AccessCode>,
}

impl PremiumRequestPatch {
    /// Approve, attaching a freshly generated access code.
    #[must_use]
    pub fn approve() -> Self {
        Self {
            status: PremiumStatus::Approved,
            access_code: Some(AccessCode::generate()),
        }
    }

    /// Reject without an access code.
    #[must_use]
    pub const fn reject() -> Self {
        Self {
            status: PremiumStatus::Rejected,
            access_code: None,
        }
    }
}
