
use log::{LevelFilter, error, info};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use pgxrisk::cli::analyze::{AnalyzeSettings, check_analyze_settings};
use pgxrisk::cli::core::{Commands, get_cli};
use pgxrisk::cli::kb_export::{KbExportSettings, check_kb_export_settings};
use pgxrisk::cli::kb_stat::{KbStatSettings, check_kb_stat_settings};
use pgxrisk::data_types::risk_result::RiskReport;
use pgxrisk::database::guideline_database::{KnowledgeBase, cpic_knowledge_base};
use pgxrisk::parser::VariantParser;
use pgxrisk::risk_engine::RiskEngine;
use pgxrisk::util::file_io::{load_variant_text, save_json};

/// Sets up the logger, this should be called first in every mode
/// # Arguments
/// * `verbosity` - the count of -v flags provided
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };

    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Loads the user provided knowledge base, or exits on failure
/// # Arguments
/// * `filename` - the JSON file to load
fn load_knowledge_base(filename: &Path) -> KnowledgeBase {
    info!("Loading knowledge base from {filename:?}...");
    match KnowledgeBase::from_json(filename) {
        Ok(kb) => kb,
        Err(e) => {
            error!("Error while loading knowledge base file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }
}

/// This will run the "analyze" mode of the tool
/// # Arguments
/// * `settings` - the AnalyzeSettings object
fn run_analyze(settings: AnalyzeSettings) {
    // immediately setup logging first
    init_logging(settings.verbosity);

    // okay, now we can check all the other settings
    let cli_settings: AnalyzeSettings = match check_analyze_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while processing CLI settings: {e}");
            std::process::exit(exitcode::USAGE);
        }
    };

    // the loaded tables need to outlive the engine
    let loaded_kb: Option<KnowledgeBase> = cli_settings.guidelines_fn.as_deref().map(load_knowledge_base);
    let knowledge_base: &KnowledgeBase = loaded_kb.as_ref().unwrap_or_else(|| cpic_knowledge_base());

    info!("Loading variants from {:?}...", cli_settings.vcf_filename);
    let vcf_text: String = match load_variant_text(&cli_settings.vcf_filename) {
        Ok(t) => t,
        Err(e) => {
            error!("Error while loading VCF file: {e}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    let parser = VariantParser::new(!cli_settings.fallback_parser);
    let engine = RiskEngine::new(knowledge_base, parser);
    let (variants, metadata) = engine.parse(&vcf_text);
    info!("Parsed {} variants for sample {} ({})", variants.len(), metadata.sample_id(), metadata.source_label());

    let timestamp = chrono::Utc::now();
    let mut report = RiskReport::new(knowledge_base.metadata().clone());
    for drug in cli_settings.drugs.iter() {
        let result = engine.analyze_parsed(&variants, &metadata, drug, &cli_settings.patient_id, timestamp);
        if result.is_error() {
            error!("{}", result.clinical_recommendation().action);
        }
        report.push(result);
    }

    info!("Saving risk report to {:?}", cli_settings.output_filename);
    if let Err(e) = save_json(&report, &cli_settings.output_filename) {
        error!("Error while writing risk report to file: {e}");
        std::process::exit(exitcode::IOERR);
    }

    if let Some(filename) = cli_settings.output_tsv.as_ref() {
        info!("Saving risk summary to {:?}", filename);
        if let Err(e) = save_risk_tsv(&report, filename) {
            error!("Error while writing risk summary to file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // every drug failed, report it as bad input
    if report.results().iter().all(|r| r.is_error()) {
        error!("None of the requested drugs are supported.");
        std::process::exit(exitcode::DATAERR);
    }
}

/// Wrapper for the summary output
#[derive(Serialize)]
struct RiskSummaryRow {
    drug: String,
    gene: String,
    diplotype: String,
    phenotype: String,
    risk_label: String,
    confidence_score: f64
}

/// Helper function to save the basic TSV summary, one row per drug
/// # Arguments
/// * `report` - our risk results
/// * `filename` - the output filename, TSV
/// # Errors
/// * if we have any errors opening or writing to the file
fn save_risk_tsv(report: &RiskReport, filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let delimiter: u8 = b'\t';
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(filename)?;

    for result in report.results().iter() {
        let profile = result.pharmacogenomic_profile();
        let row = RiskSummaryRow {
            drug: result.drug().to_string(),
            gene: profile.primary_gene.clone(),
            diplotype: profile.diplotype.clone(),
            phenotype: profile.phenotype.to_string(),
            risk_label: result.risk_assessment().risk_label.to_string(),
            confidence_score: result.risk_assessment().confidence_score
        };
        csv_writer.serialize(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// This will run the "kb-stat" mode of the tool
/// # Arguments
/// * `settings` - the KbStatSettings object
fn run_kb_stat(settings: KbStatSettings) {
    init_logging(settings.verbosity);
    let cli_settings: KbStatSettings = check_kb_stat_settings(settings);

    let loaded_kb: Option<KnowledgeBase> = cli_settings.guidelines_fn.as_deref().map(load_knowledge_base);
    let knowledge_base: &KnowledgeBase = loaded_kb.as_ref().unwrap_or_else(|| cpic_knowledge_base());
    info!("Knowledge base loaded successfully.");

    // display the knowledge base statistics
    pgxrisk::kb_stat::print_stats(knowledge_base);
}

/// This will run the "kb-export" mode of the tool
/// # Arguments
/// * `settings` - the KbExportSettings object
fn run_kb_export(settings: KbExportSettings) {
    init_logging(settings.verbosity);
    let cli_settings: KbExportSettings = check_kb_export_settings(settings);

    let exported = cpic_knowledge_base().with_export_time();
    info!("Saving knowledge base to {:?}", cli_settings.output_filename);
    match save_json(&exported, &cli_settings.output_filename) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while writing knowledge base to file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Analyze(settings) => {
            run_analyze(*settings);
        },
        Commands::KbStat(settings) => {
            run_kb_stat(*settings);
        },
        Commands::KbExport(settings) => {
            run_kb_export(*settings);
        }
    }

    info!("Process finished successfully.");
}
