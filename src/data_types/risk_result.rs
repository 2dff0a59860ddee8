
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data_types::risk_info::{Phenotype, RiskLabel, Severity};
use crate::database::guideline_database::KbMetadata;

/// Intended to be serialized to JSON as the final result of the CLI
#[derive(Debug, Deserialize, Serialize)]
pub struct RiskReport {
    /// Version of the tool that generated the results
    pgxrisk_version: String,
    /// Metadata for the guideline tables that were used
    knowledge_base_metadata: KbMetadata,
    /// One result per requested drug, in request order
    results: Vec<RiskResult>
}

impl RiskReport {
    pub fn new(knowledge_base_metadata: KbMetadata) -> Self {
        Self {
            pgxrisk_version: crate::cli::core::FULL_VERSION.to_string(),
            knowledge_base_metadata,
            results: vec![]
        }
    }

    pub fn push(&mut self, result: RiskResult) {
        self.results.push(result);
    }

    pub fn knowledge_base_metadata(&self) -> &KbMetadata {
        &self.knowledge_base_metadata
    }

    pub fn results(&self) -> &[RiskResult] {
        &self.results
    }
}

/// The full analysis of one drug against one VCF
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RiskResult {
    /// The sample declared in the VCF, or the caller provided ID
    pub(crate) patient_id: String,
    /// Upper-case drug name
    pub(crate) drug: String,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) risk_assessment: RiskAssessment,
    pub(crate) pharmacogenomic_profile: PharmacogenomicProfile,
    pub(crate) clinical_recommendation: ClinicalRecommendation,
    pub(crate) patient_advice: PatientAdvice,
    /// Templated explanation; an external text generator may replace this
    pub(crate) llm_generated_explanation: Explanation,
    pub(crate) quality_metrics: QualityMetrics
}

impl RiskResult {
    /// Returns true if this result describes a failed analysis
    pub fn is_error(&self) -> bool {
        self.risk_assessment.risk_label == RiskLabel::Error
    }

    // getters
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn drug(&self) -> &str {
        &self.drug
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn risk_assessment(&self) -> &RiskAssessment {
        &self.risk_assessment
    }

    pub fn pharmacogenomic_profile(&self) -> &PharmacogenomicProfile {
        &self.pharmacogenomic_profile
    }

    pub fn clinical_recommendation(&self) -> &ClinicalRecommendation {
        &self.clinical_recommendation
    }

    pub fn patient_advice(&self) -> &PatientAdvice {
        &self.patient_advice
    }

    pub fn explanation(&self) -> &Explanation {
        &self.llm_generated_explanation
    }

    pub fn quality_metrics(&self) -> &QualityMetrics {
        &self.quality_metrics
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk_label: RiskLabel,
    /// Heuristic confidence in [0, 1]
    pub confidence_score: f64,
    pub severity: Severity
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PharmacogenomicProfile {
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub detected_variants: Vec<DetectedVariant>
}

/// A gene variant as reported in the output
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DetectedVariant {
    pub rsid: String,
    pub genotype: String
}

impl DetectedVariant {
    /// Placeholder reported when the gene has no variants in the file
    pub fn not_detected() -> DetectedVariant {
        DetectedVariant {
            rsid: "Not detected".to_string(),
            genotype: "N/A".to_string()
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClinicalRecommendation {
    pub action: String,
    /// Only populated when the drug should be swapped out
    pub alternative_suggestion: Option<String>,
    pub cpic_guideline_link: String
}

/// Plain language advice for the patient
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PatientAdvice {
    pub patient_friendly_summary: String,
    pub best_medicine_suggestion: String,
    /// At most three points
    pub doctor_talking_points: Vec<String>
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Explanation {
    pub summary: String
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub gene_detected: bool,
    /// Number of gene variants used, the "not detected" placeholder is not counted
    pub variants_found: usize
}
