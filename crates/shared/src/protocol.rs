//! Wire payloads exchanged with the NuOrder wholesale API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CompanyCode, OrderId, StyleNumber};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_number: OrderId,
    pub status: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_code: Option<CompanyCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePayload {
    pub wholesale: f64,
    pub retail: f64,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizePayload {
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_group: Option<String>,
    /// Keyed by ISO currency code.
    pub pricing: BTreeMap<String, PricePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPayload {
    pub style_number: StyleNumber,
    pub name: String,
    pub external_id: String,
    pub unique_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<SizePayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub size_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<String>,
    pub pricing: BTreeMap<String, PricePayload>,
    pub available_now: bool,
    pub active: bool,
    pub cancelled: bool,
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_closing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPayload {
    pub name: String,
    pub code: CompanyCode,
}

impl CompanyPayload {
    /// Company codes on the wire are the lowercase MD5 hex digest of the name.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let code = CompanyCode(format!("{:x}", md5::compute(name.as_bytes())));
        Self { name, code }
    }
}

/// Response of the OAuth bootstrap endpoints (`/api/initiate`, `/api/token`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthTokenPair {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}
