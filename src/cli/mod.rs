
/// the main CLI module
pub mod core;
/// the analyze CLI subcommand for assessing drug risks from a VCF
pub mod analyze;
/// The kb-export CLI subcommand for writing the built-in guideline tables to file
pub mod kb_export;
/// The kb-stat CLI subcommand for displaying knowledge base statistics
pub mod kb_stat;
