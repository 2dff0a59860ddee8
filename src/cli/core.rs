
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use log::error;
use std::path::Path;

use crate::cli::analyze::AnalyzeSettings;
use crate::cli::kb_export::KbExportSettings;
use crate::cli::kb_stat::KbStatSettings;

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.3.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.3.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string containing the legalese.
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2024-{}     pgxrisk contributors
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// pgxrisk, a tool for pharmacogenomic drug risk assessment from VCF files.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Assess drug risks for a VCF file
    Analyze(Box<AnalyzeSettings>),
    /// Generate statistics about a knowledge base
    KbStat(Box<KbStatSettings>),
    /// Write the built-in knowledge base to a JSON file
    KbExport(Box<KbExportSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) {
    if !filename.exists() {
        error!("{} does not exist: \"{}\"", label, filename.display());
        std::process::exit(exitcode::NOINPUT);
    } else {
        // file exists, we're good
    }
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `opt_filename` - the optional file path to check for
/// * `label` - the label to use for error messages
pub fn check_optional_filename(opt_filename: Option<&Path>, label: &str) {
    if let Some(filename) = opt_filename {
        check_required_filename(filename, label);
    }
}
