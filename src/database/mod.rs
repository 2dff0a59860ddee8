
/// Constants that are hard-coded into the built-in guideline tables
pub mod db_const;
/// Contains the guideline knowledge base: genes -> drugs -> diplotype/phenotype/risk tables
pub mod guideline_database;
