use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Verdict status assigned by the verification service.
///
/// Any value outside the known set (including `null` or an absent field)
/// deserializes to `Unknown` instead of failing the whole response.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "Option<String>")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum VerdictStatus {
    Authentic,
    Expired,
    Counterfeit,
    Suspicious,
    Unverified,
    #[default]
    Unknown,
}

impl From<Option<String>> for VerdictStatus {
    fn from(raw: Option<String>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

/// Categorical risk, used both for the verdict's overall risk level and for
/// the severity of individual risk factors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "Option<String>")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    #[default]
    Unknown,
}

impl From<Option<String>> for RiskLevel {
    fn from(raw: Option<String>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

/// One discrete reason contributing to an elevated risk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactor {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: RiskLevel,
    #[serde(default)]
    pub message: String,
}

/// Verdict returned by `POST /verify`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationResponse {
    #[serde(default)]
    pub status: VerdictStatus,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub gtin: Option<String>,
    #[serde(default)]
    pub gtin_verified: bool,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub details: VerificationDetails,
    #[serde(default)]
    pub raw_data: RawData,
}

/// Per-check breakdown computed by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerificationDetails {
    pub expiry_check: Option<ExpiryCheck>,
    pub gtin_check: Option<GtinCheck>,
    pub product_consistency: Option<IssueList>,
    pub batch_validity: Option<BatchValidity>,
    pub regulatory_warnings: Option<RegulatoryWarnings>,
    pub packaging_issues: Option<IssueList>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExpiryCheck {
    pub found: Option<bool>,
    pub is_expired: bool,
    pub expiry_date: Option<String>,
    pub days_until_expiry: Option<i64>,
    pub status: Option<String>,
    pub note: Option<String>,
}

impl ExpiryCheck {
    /// Whether the service reports having read an expiry date.
    pub fn date_found(&self) -> bool {
        self.found.unwrap_or(false) || self.expiry_date.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GtinCheck {
    pub verified: bool,
    pub gtin: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub reason: Option<String>,
}

/// Shared shape of `product_consistency` and `packaging_issues`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IssueList {
    pub consistent: Option<bool>,
    pub has_issues: Option<bool>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchValidity {
    pub valid: bool,
    pub batch_number: Option<String>,
    pub issues: Vec<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegulatoryWarnings {
    pub has_warnings: bool,
    /// Plain strings or alert objects, depending on the regulator feed.
    pub warnings: Vec<serde_json::Value>,
    pub count: usize,
}

/// Raw evidence collected by the service before classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawData {
    pub barcodes: Vec<BarcodeEntry>,
    pub ocr_texts: Vec<OcrEntry>,
    pub gs1_verification: Option<RegistryLookup>,
    pub cdsco_verification: Option<RegistryLookup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BarcodeEntry {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Option<String>,
    pub parsed: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrEntry {
    pub quality_score: Option<f64>,
    pub text_preview: Option<String>,
}

/// Result of a GS1 or drug-regulator lookup. Fields beyond the ones read
/// here are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryLookup {
    pub found: Option<bool>,
    pub country: Option<String>,
    pub company_name: Option<String>,
    pub warnings: Option<Vec<serde_json::Value>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistryLookup {
    pub fn was_found(&self) -> bool {
        self.found.unwrap_or(false)
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tesseract_configured: Option<bool>,
}
