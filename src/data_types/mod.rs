
/// Contains the simplified two-allele diplotype representation
pub mod pgx_diplotype;
/// Contains phenotype, risk label, and guideline recommendation types
pub mod risk_info;
/// Contains the serializable risk results and the final report
pub mod risk_result;
/// Contains the parsed variant record and parse metadata
pub mod variant;
