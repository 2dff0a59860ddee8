
use serde::{Deserialize, Serialize};

/// Root of the CPIC guideline site, used whenever we do not have a gene-drug specific link
pub const CPIC_ROOT_URL: &str = "https://cpicpgx.org/";

/// Predicted metabolizer class for a diplotype
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::Display, strum_macros::EnumIter, strum_macros::EnumString)]
pub enum Phenotype {
    #[strum(to_string = "PM")]
    #[serde(rename = "PM")]
    PoorMetabolizer,
    #[strum(to_string = "IM")]
    #[serde(rename = "IM")]
    IntermediateMetabolizer,
    #[strum(to_string = "NM")]
    #[serde(rename = "NM")]
    NormalMetabolizer,
    #[strum(to_string = "RM")]
    #[serde(rename = "RM")]
    RapidMetabolizer,
    #[strum(to_string = "URM")]
    #[serde(rename = "URM")]
    UltrarapidMetabolizer,
    /// Diplotype was not found in the guideline table
    #[default]
    Unknown
}

impl Phenotype {
    /// Long form of the phenotype code
    pub fn full_name(&self) -> &'static str {
        match self {
            Phenotype::PoorMetabolizer => "Poor Metabolizer",
            Phenotype::IntermediateMetabolizer => "Intermediate Metabolizer",
            Phenotype::NormalMetabolizer => "Normal Metabolizer",
            Phenotype::RapidMetabolizer => "Rapid Metabolizer",
            Phenotype::UltrarapidMetabolizer => "Ultrarapid Metabolizer",
            Phenotype::Unknown => "Unknown"
        }
    }

    /// Plain language description of the enzyme activity
    pub fn activity_description(&self) -> &'static str {
        match self {
            Phenotype::PoorMetabolizer => "reduced or absent enzyme activity",
            Phenotype::IntermediateMetabolizer => "reduced enzyme activity",
            Phenotype::NormalMetabolizer => "normal enzyme activity",
            Phenotype::RapidMetabolizer => "increased enzyme activity",
            Phenotype::UltrarapidMetabolizer => "greatly increased enzyme activity",
            Phenotype::Unknown => "unknown enzyme activity"
        }
    }
}

/// The clinical risk category reported to the user
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display)]
pub enum RiskLabel {
    Safe,
    #[strum(to_string = "Adjust Dosage")]
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    Ineffective,
    #[default]
    Unknown,
    /// Only produced when the analysis itself could not run
    Error
}

impl RiskLabel {
    /// Labels where the drug should be swapped rather than dose-adjusted
    pub fn warrants_alternative(&self) -> bool {
        matches!(self, RiskLabel::Toxic | RiskLabel::Ineffective)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    None,
    Moderate,
    High,
    Critical,
    #[default]
    Unknown
}

/// Guideline recommendation for a single phenotype
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RiskInfo {
    risk_label: RiskLabel,
    severity: Severity,
    /// Recommended clinical action
    action: String,
    /// Guideline alternative therapy, if any
    alternative: Option<String>,
    /// Link to the CPIC guideline
    #[serde(alias = "cpic_url")]
    guideline_url: String
}

impl RiskInfo {
    pub fn new(risk_label: RiskLabel, severity: Severity, action: &str, alternative: Option<&str>, guideline_url: &str) -> RiskInfo {
        RiskInfo {
            risk_label,
            severity,
            action: action.to_string(),
            alternative: alternative.map(|a| a.to_string()),
            guideline_url: guideline_url.to_string()
        }
    }

    /// The recommendation returned when a phenotype has no guideline entry
    pub fn unknown() -> RiskInfo {
        RiskInfo::new(RiskLabel::Unknown, Severity::Unknown, "Consult physician", None, CPIC_ROOT_URL)
    }

    // getters
    pub fn risk_label(&self) -> RiskLabel {
        self.risk_label
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn alternative(&self) -> Option<&str> {
        self.alternative.as_deref()
    }

    pub fn guideline_url(&self) -> &str {
        &self.guideline_url
    }
}
