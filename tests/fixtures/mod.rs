//! Verdict bodies and image files used by the integration tests

use mediscan_client::models::image::CandidateFile;
use serde_json::json;

/// Smallest valid PNG header; the service never decodes it in these tests.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

/// JPEG start-of-image marker followed by a JFIF APP0 segment.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

pub fn png(name: &str) -> CandidateFile {
    CandidateFile::new(name, "image/png", PNG_BYTES.to_vec())
}

pub fn jpeg(name: &str) -> CandidateFile {
    CandidateFile::new(name, "image/jpeg", JPEG_BYTES.to_vec())
}

pub fn text_file(name: &str) -> CandidateFile {
    CandidateFile::new(name, "text/plain", b"batch notes".to_vec())
}

/// Expired package with a verified GTIN.
pub fn expired_verdict() -> String {
    json!({
        "status": "EXPIRED",
        "risk_level": "HIGH",
        "is_expired": true,
        "expiry_date": "2020-01-01",
        "gtin": "012345",
        "gtin_verified": true
    })
    .to_string()
}

/// Genuine package with full evidence from every source.
pub fn authentic_verdict() -> String {
    json!({
        "status": "AUTHENTIC",
        "risk_level": "LOW",
        "is_expired": false,
        "expiry_date": "2027-06-30",
        "gtin": "08901234567890",
        "gtin_verified": true,
        "product_name": "Paracetamol 500mg",
        "batch_number": "B12345",
        "manufacturer": "Acme Pharma Ltd",
        "country": "India",
        "risk_factors": [],
        "recommendations": ["Store below 25°C"],
        "details": {
            "expiry_check": { "found": true, "is_expired": false, "expiry_date": "2027-06-30" },
            "gtin_check": { "verified": true, "gtin": "08901234567890", "country": "India" },
            "regulatory_warnings": { "has_warnings": false, "warnings": [], "count": 0 }
        },
        "raw_data": {
            "barcodes": [{ "type": "EAN13", "data": "8901234567890" }],
            "ocr_texts": [{ "quality_score": 82.5, "text_preview": "PARACETAMOL 500mg" }],
            "gs1_verification": { "found": true, "country": "India", "company_name": "Acme Pharma Ltd" },
            "cdsco_verification": { "found": true, "warnings": [] }
        }
    })
    .to_string()
}

/// Counterfeit verdict carrying a regulator alert and risk factors.
pub fn counterfeit_verdict() -> String {
    json!({
        "status": "COUNTERFEIT",
        "risk_level": "CRITICAL",
        "gtin": "0000000000000",
        "gtin_verified": false,
        "risk_factors": [
            { "type": "gtin", "severity": "CRITICAL", "message": "GTIN not registered" }
        ],
        "recommendations": ["Do not consume", "Report to the drug regulator"],
        "raw_data": {
            "cdsco_verification": {
                "found": false,
                "warnings": [{ "type": "NSQ_ALERT", "message": "Batch flagged as not of standard quality" }]
            }
        }
    })
    .to_string()
}
