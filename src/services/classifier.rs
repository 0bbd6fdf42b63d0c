use chrono::NaiveDate;

use crate::models::assessment::{
    CheckKind, CheckScore, DerivedAssessment, NarrativeStage, NarrativeStep, ProductFacts,
    ScoreBand, StatusDescriptor, StepOutcome,
};
use crate::models::verification::{RiskLevel, VerdictStatus, VerificationResponse};

/// Barcode score when no barcode was decoded. Absence is ambiguous (the photo
/// may simply not show the barcode), so it earns partial credit.
const BARCODE_ABSENT_SCORE: f64 = 50.0;

/// Map a verdict into its display-ready assessment.
///
/// Pure and infallible: every missing optional field falls into the
/// corresponding "unknown" or "absent" branch.
pub fn classify(response: &VerificationResponse) -> DerivedAssessment {
    let risk_value = risk_value(response.risk_level);

    DerivedAssessment {
        status: status_descriptor(response.status),
        risk_level: response.risk_level,
        risk_value,
        safety_score: 100 - risk_value,
        check_scores: check_scores(response),
        narrative: narrative(response),
        product: ProductFacts {
            product_name: response.product_name.clone(),
            manufacturer: response.manufacturer.clone(),
            batch_number: response.batch_number.clone(),
            gtin: response.gtin.clone(),
            gtin_verified: response.gtin_verified,
            country: response.country.clone(),
            expiry_date: response.expiry_date.clone(),
            is_expired: response.is_expired,
        },
        risk_factors: response.risk_factors.clone(),
        recommendations: response.recommendations.clone(),
    }
}

// ── Status table ──────────────────────────────────────────────────────

pub fn status_descriptor(status: VerdictStatus) -> StatusDescriptor {
    let (label, message) = match status {
        VerdictStatus::Authentic => (
            "Medicine Authentic",
            "This medicine appears to be genuine and safe to use.",
        ),
        VerdictStatus::Expired => (
            "Medicine Expired",
            "This medicine has passed its expiry date. Do not use.",
        ),
        VerdictStatus::Counterfeit => (
            "Counterfeit Detected",
            "Warning! This medicine may be counterfeit. Do not use.",
        ),
        VerdictStatus::Suspicious => (
            "Suspicious Medicine",
            "Some verification checks failed. Consult a pharmacist.",
        ),
        VerdictStatus::Unverified | VerdictStatus::Unknown => {
            ("Unverified", "Unable to fully verify this medicine.")
        }
    };

    StatusDescriptor {
        status,
        label,
        message,
    }
}

// ── Risk table ────────────────────────────────────────────────────────

pub fn risk_value(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::Low => 25,
        RiskLevel::Medium => 50,
        RiskLevel::High => 75,
        RiskLevel::Critical => 100,
        RiskLevel::Unknown => 0,
    }
}

// ── Per-check scores ──────────────────────────────────────────────────

fn check_scores(response: &VerificationResponse) -> Vec<CheckScore> {
    let expiry_found = response.expiry_date.is_some()
        || response
            .details
            .expiry_check
            .as_ref()
            .is_some_and(|check| check.date_found());

    let ocr_quality = response
        .raw_data
        .ocr_texts
        .first()
        .and_then(|entry| entry.quality_score)
        .filter(|q| q.is_finite())
        .map(|q| q.clamp(0.0, 100.0))
        .unwrap_or(0.0);

    vec![
        score(CheckKind::Expiry, if expiry_found { 100.0 } else { 0.0 }),
        score(CheckKind::Gtin, if response.gtin_verified { 100.0 } else { 0.0 }),
        score(
            CheckKind::Barcode,
            if response.raw_data.barcodes.is_empty() {
                BARCODE_ABSENT_SCORE
            } else {
                100.0
            },
        ),
        score(CheckKind::Ocr, ocr_quality),
    ]
}

fn score(check: CheckKind, value: f64) -> CheckScore {
    CheckScore {
        check,
        label: check.label(),
        score: value,
        band: ScoreBand::for_score(value),
    }
}

// ── Narrative ─────────────────────────────────────────────────────────

fn narrative(response: &VerificationResponse) -> Vec<NarrativeStep> {
    vec![
        barcode_scan_step(response),
        code_authenticity_step(response),
        regulatory_step(response),
        label_read_step(response),
        cross_source_step(),
    ]
}

fn pick(ok: bool, completed: &'static str, attention: &'static str) -> (StepOutcome, &'static str) {
    if ok {
        (StepOutcome::Completed, completed)
    } else {
        (StepOutcome::Attention, attention)
    }
}

fn barcode_scan_step(response: &VerificationResponse) -> NarrativeStep {
    let (outcome, message) = pick(
        response.gtin.is_some(),
        "Found unique product code on your medicine package",
        "Could not find a barcode on the packaging - try taking a clearer photo",
    );

    NarrativeStep {
        stage: NarrativeStage::BarcodeScan,
        title: "Scanned Package Barcode",
        outcome,
        message,
        details: response
            .gtin
            .iter()
            .map(|gtin| format!("Product Code: {gtin}"))
            .collect(),
    }
}

fn code_authenticity_step(response: &VerificationResponse) -> NarrativeStep {
    let (outcome, message) = pick(
        response.gtin_verified,
        "Product code is valid and follows international standards",
        "Product code structure appears invalid - this could be a counterfeit",
    );

    let country = response
        .raw_data
        .gs1_verification
        .as_ref()
        .filter(|gs1| gs1.was_found())
        .and_then(|gs1| gs1.country.as_ref());

    NarrativeStep {
        stage: NarrativeStage::CodeAuthenticity,
        title: "Checked Product Code Authenticity",
        outcome,
        message,
        details: country
            .map(|c| format!("Manufacturing Country: {c}"))
            .into_iter()
            .collect(),
    }
}

fn regulatory_step(response: &VerificationResponse) -> NarrativeStep {
    let mut warnings: Vec<String> = response
        .raw_data
        .cdsco_verification
        .as_ref()
        .and_then(|lookup| lookup.warnings.as_ref())
        .map(|w| w.iter().map(warning_text).collect())
        .unwrap_or_default();

    if warnings.is_empty() {
        if let Some(details) = &response.details.regulatory_warnings {
            warnings = details.warnings.iter().map(warning_text).collect();
        }
    }

    let (outcome, message) = pick(
        warnings.is_empty(),
        "Verified your medicine against government health databases and official registries - no safety alerts or recalls found",
        "Safety alerts were found for this medicine in government health databases",
    );

    NarrativeStep {
        stage: NarrativeStage::RegulatoryCrossCheck,
        title: "Cross-Checked with Health Authorities",
        outcome,
        message,
        details: warnings,
    }
}

fn label_read_step(response: &VerificationResponse) -> NarrativeStep {
    let (outcome, message) = pick(
        response.expiry_date.is_some(),
        "Found and verified the expiry date printed on your medicine",
        "Couldn't read expiry date clearly - please take a sharper photo of the label",
    );

    let mut details = Vec::new();
    if let Some(date) = &response.expiry_date {
        details.push(format!("Expiry Date: {}", display_date(date)));
        details.push(
            if response.is_expired {
                "This medicine has expired - do not use"
            } else {
                "Medicine is still within validity period"
            }
            .to_string(),
        );
    }
    if let Some(batch) = &response.batch_number {
        details.push(format!("Batch Number: {batch}"));
    }

    NarrativeStep {
        stage: NarrativeStage::LabelRead,
        title: "Read Package Label & Expiry Date",
        outcome,
        message,
        details,
    }
}

fn cross_source_step() -> NarrativeStep {
    NarrativeStep {
        stage: NarrativeStage::CrossSourceSearch,
        title: "AI-Powered Smart Verification",
        outcome: StepOutcome::Completed,
        message: "Our AI searched multiple official health & drug regulatory websites to confirm authenticity",
        details: vec![
            "Drug Regulatory Authority".to_string(),
            "International Databases".to_string(),
            "Ministry of Health".to_string(),
            "Safety Alerts Database".to_string(),
        ],
    }
}

/// Render a regulator alert: strings verbatim, objects by `message` or `type`.
fn warning_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("type"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// `2020-01-01` becomes `1 Jan 2020`; anything else is shown as received.
fn display_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%-d %b %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
