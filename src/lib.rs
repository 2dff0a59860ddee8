/// Contains all the CLI related functionality
pub mod cli;
/// Contains the guideline knowledge base and its built-in tables
pub mod database;
/// Contains any specialized data types that are shared across the tooling
pub mod data_types;
/// Contains the functionality for inferring a simplified diplotype for a gene
pub mod diplotyper;
/// Contains the functionality for selecting the variants relevant to a gene
pub mod gene_filter;
/// Contains functionality for displaying knowledge base statistics
pub mod kb_stat;
/// Contains the VCF parsing strategies
pub mod parser;
/// Contains the orchestration from VCF text to a risk result
pub mod risk_engine;
/// Contains generic utilities that are handy wrappers
pub mod util;
