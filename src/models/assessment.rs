use serde::Serialize;
use strum::{Display, EnumString};

use crate::models::verification::{RiskFactor, RiskLevel, VerdictStatus};

/// Display-ready view of a verdict, derived by the result classifier.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DerivedAssessment {
    pub status: StatusDescriptor,
    pub risk_level: RiskLevel,
    /// 0 (no risk) to 100 (critical).
    pub risk_value: u8,
    /// `100 - risk_value`.
    pub safety_score: u8,
    pub check_scores: Vec<CheckScore>,
    pub narrative: Vec<NarrativeStep>,
    pub product: ProductFacts,
    pub risk_factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
}

impl DerivedAssessment {
    pub fn check_score(&self, check: CheckKind) -> Option<&CheckScore> {
        self.check_scores.iter().find(|c| c.check == check)
    }

    pub fn step(&self, stage: NarrativeStage) -> Option<&NarrativeStep> {
        self.narrative.iter().find(|s| s.stage == stage)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusDescriptor {
    /// The service's status, carried through unmodified.
    pub status: VerdictStatus,
    pub label: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckKind {
    Expiry,
    Gtin,
    Barcode,
    Ocr,
}

impl CheckKind {
    pub fn label(self) -> &'static str {
        match self {
            CheckKind::Expiry => "Expiry Date Check",
            CheckKind::Gtin => "GTIN Verification",
            CheckKind::Barcode => "Barcode Detection",
            CheckKind::Ocr => "Text Recognition Quality",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckScore {
    pub check: CheckKind,
    pub label: &'static str,
    /// Percentage in `0.0..=100.0`.
    pub score: f64,
    pub band: ScoreBand,
}

/// Coarse bucket used to colour a check score.
#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoreBand {
    Full,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 100.0 {
            ScoreBand::Full
        } else if score >= 70.0 {
            ScoreBand::Good
        } else if score >= 40.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NarrativeStage {
    BarcodeScan,
    CodeAuthenticity,
    RegulatoryCrossCheck,
    LabelRead,
    CrossSourceSearch,
}

#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Attention,
}

/// One "how we checked" entry: a canned message selected by a presence check.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NarrativeStep {
    pub stage: NarrativeStage,
    pub title: &'static str,
    pub outcome: StepOutcome,
    pub message: &'static str,
    /// Supporting facts already present on the verdict (codes, dates, alerts).
    pub details: Vec<String>,
}

/// Descriptive fields passed through from the verdict for display.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProductFacts {
    pub product_name: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub gtin: Option<String>,
    pub gtin_verified: bool,
    pub country: Option<String>,
    pub expiry_date: Option<String>,
    pub is_expired: bool,
}
