
use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, AFTER_HELP};

#[derive(Clone, Args)]
#[clap(author, about,
    after_help = &**AFTER_HELP)]
pub struct KbStatSettings {
    /// Optional knowledge base file (JSON); the built-in tables are used if not provided
    #[clap(short = 'g')]
    #[clap(long = "guidelines")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub guidelines_fn: Option<PathBuf>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_kb_stat_settings(settings: KbStatSettings) -> KbStatSettings {
    // dump stuff to the logger
    check_optional_filename(settings.guidelines_fn.as_deref(), "Guidelines JSON");

    match settings.guidelines_fn.as_ref() {
        Some(gfn) => info!("Input knowledge base: {gfn:?}"),
        None => info!("Input knowledge base: built-in CPIC tables")
    };

    settings
}
