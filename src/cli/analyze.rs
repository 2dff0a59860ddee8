
use clap::Args;
use itertools::Itertools;
use log::{info, warn};
use simple_error::bail;
use std::path::PathBuf;

use crate::cli::core::{AFTER_HELP, check_optional_filename, check_required_filename};
use crate::util::file_io::load_file_lines;

#[derive(Args, Clone, Default)]
#[clap(author, about,
    after_help = &**AFTER_HELP)]
pub struct AnalyzeSettings {
    /// Input variant file in VCF format, optionally gzipped
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub vcf_filename: PathBuf,

    /// Drug to analyze, can be specified multiple times
    #[clap(short = 'd')]
    #[clap(long = "drug")]
    #[clap(value_name = "DRUG")]
    #[clap(help_heading = Some("Input/Output"))]
    pub drugs: Vec<String>,

    /// Optional file with additional drugs to analyze, one per line
    #[clap(long = "drug-list")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub drug_list_fn: Option<PathBuf>,

    /// Patient identifier, used when the VCF does not declare a sample
    #[clap(short = 'p')]
    #[clap(long = "patient-id")]
    #[clap(value_name = "ID")]
    #[clap(default_value = "PATIENT_001")]
    #[clap(help_heading = Some("Input/Output"))]
    pub patient_id: String,

    /// Optional knowledge base file (JSON) to use instead of the built-in guideline tables
    #[clap(short = 'g')]
    #[clap(long = "guidelines")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub guidelines_fn: Option<PathBuf>,

    /// Output risk report file (JSON)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// Optional per-drug summary file (TSV)
    #[clap(long = "output-tsv")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_tsv: Option<PathBuf>,

    /// Disables the htslib parser and only uses the built-in VCF tokenizer
    #[clap(long = "fallback-parser")]
    #[clap(help_heading = Some("Parsing"))]
    pub fallback_parser: bool,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_analyze_settings(mut settings: AnalyzeSettings) -> Result<AnalyzeSettings, Box<dyn std::error::Error>> {
    info!("Inputs:");

    check_required_filename(&settings.vcf_filename, "VCF file");
    check_optional_filename(settings.drug_list_fn.as_deref(), "Drug list");
    check_optional_filename(settings.guidelines_fn.as_deref(), "Guidelines JSON");

    info!("\tVCF: {:?}", settings.vcf_filename);
    info!("\tPatient ID: {}", settings.patient_id);
    if let Some(gfn) = settings.guidelines_fn.as_ref() {
        info!("\tGuidelines: {gfn:?}");
    } else {
        info!("\tGuidelines: built-in CPIC tables");
    }

    // merge the drug list into the CLI drugs
    if let Some(dfn) = settings.drug_list_fn.as_ref() {
        info!("\tDrug list: {dfn:?}");
        let listed = load_file_lines(dfn)?;
        settings.drugs.extend(listed);
    }
    let drug_count = settings.drugs.len();
    settings.drugs = settings.drugs.iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unique_by(|d| d.to_uppercase())
        .collect();
    if settings.drugs.is_empty() {
        bail!("Must provide at least one drug with --drug or --drug-list.");
    }
    if settings.drugs.len() < drug_count {
        warn!("\tIgnoring {} duplicate or empty drug entries", drug_count - settings.drugs.len());
    }
    info!("\tDrugs: {}", settings.drugs.join(", "));

    // outputs
    info!("Outputs:");
    info!("\tRisk report: {:?}", settings.output_filename);
    if let Some(filename) = settings.output_tsv.as_ref() {
        info!("\tSummary TSV: {:?}", filename);
    }

    if settings.fallback_parser {
        info!("Parsing:");
        info!("\tFallback parser only: {}", settings.fallback_parser);
    }

    Ok(settings)
}
