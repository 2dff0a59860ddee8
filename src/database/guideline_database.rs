
use lazy_static::lazy_static;
use log::debug;
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleError, bail};
use std::collections::BTreeMap;
use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::path::Path;

use crate::data_types::risk_info::{Phenotype, RiskInfo};
use crate::database::db_const::{ALTERNATIVE_DRUGS, CPIC_GUIDELINES, DEFAULT_ALTERNATIVE, GENE_DEFINITIONS, STAR_ALLELE_VARIANTS};
use crate::util::file_io::load_json;

lazy_static! {
    /// The built-in CPIC knowledge base, constructed once on first access and never modified
    pub static ref CPIC_KNOWLEDGE_BASE: KnowledgeBase = KnowledgeBase::cpic_default();

    /// Returned for any phenotype that has no guideline entry
    static ref UNKNOWN_RISK: RiskInfo = RiskInfo::unknown();

    /// Returned for any drug without registered alternatives
    static ref DEFAULT_ALTERNATIVES: Vec<String> = vec![DEFAULT_ALTERNATIVE.to_string()];
}

/// Read-only accessor for the built-in knowledge base
pub fn cpic_knowledge_base() -> &'static KnowledgeBase {
    &CPIC_KNOWLEDGE_BASE
}

/// Contains metadata about where the guideline tables came from
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct KbMetadata {
    /// The version of pgxrisk that generated the tables
    pub pgxrisk_version: String,
    /// Free-text description of the guideline source
    pub guideline_source: String,
    /// Set when the tables were exported to a file
    pub export_time: Option<chrono::DateTime<chrono::Utc>>
}

/// Guideline tables for a single gene-drug pair
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GuidelineEntry {
    /// The gene this guideline is for
    gene: String,
    /// The drug the CPIC guideline was written for
    reference_drug: String,
    /// Diplotype string -> phenotype
    diplotypes: BTreeMap<String, Phenotype>,
    /// Phenotype -> recommendation
    phenotype_risks: BTreeMap<Phenotype, RiskInfo>,
    /// Variants commonly tested for this guideline
    common_variants: Vec<String>
}

impl GuidelineEntry {
    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn reference_drug(&self) -> &str {
        &self.reference_drug
    }

    pub fn diplotypes(&self) -> &BTreeMap<String, Phenotype> {
        &self.diplotypes
    }

    pub fn phenotype_risks(&self) -> &BTreeMap<Phenotype, RiskInfo> {
        &self.phenotype_risks
    }

    pub fn common_variants(&self) -> &[String] {
        &self.common_variants
    }
}

/// Everything we know about one pharmacogene
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeneEntry {
    gene: String,
    /// Chromosome without a "chr" prefix
    chromosome: String,
    /// Plain language description, used in explanations
    description: String,
    /// All drugs that are resolved through this gene
    drugs: Vec<String>,
    /// Known functional rsIDs for this gene -> short description
    functional_variants: BTreeMap<String, String>,
    /// Guideline tables in priority order; the first entry is the reference for drugs without their own
    guidelines: Vec<GuidelineEntry>
}

impl GeneEntry {
    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn drugs(&self) -> &[String] {
        &self.drugs
    }

    pub fn functional_variants(&self) -> &BTreeMap<String, String> {
        &self.functional_variants
    }

    pub fn guidelines(&self) -> &[GuidelineEntry] {
        &self.guidelines
    }
}

/// A star allele that is tagged by a single rsID
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StarAllele {
    /// Star allele designation, e.g. "*2"
    allele: String,
    /// Functional status, e.g. "non-functional"
    function: String
}

impl StarAllele {
    pub fn allele(&self) -> &str {
        &self.allele
    }

    pub fn function(&self) -> &str {
        &self.function
    }
}

/// The raw serializable tables; see `KnowledgeBase` for the indexed form
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct KnowledgeBaseTables {
    metadata: KbMetadata,
    /// Genes in registration order
    genes: Vec<GeneEntry>,
    /// rsID -> star allele, shared across all genes
    star_alleles: BTreeMap<String, StarAllele>,
    /// Drug -> ordered list of alternative therapies
    alternatives: BTreeMap<String, Vec<String>>
}

/// Summary of the guideline coverage for a single drug
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrugInfo {
    pub drug: String,
    pub gene: String,
    pub guideline_source_drug: String,
    pub diplotypes: Vec<String>,
    pub phenotypes: Vec<Phenotype>,
    pub common_variants: Vec<String>
}

/// Guideline knowledge base: genes -> drugs -> diplotype/phenotype/risk tables.
/// This is immutable after construction, all lookups are read-only.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "KnowledgeBaseTables")]
pub struct KnowledgeBase {
    #[serde(flatten)]
    tables: KnowledgeBaseTables,
    /// gene name -> index into `tables.genes`
    #[serde(skip)]
    gene_index: HashMap<String, usize>,
    /// drug name -> index into `tables.genes`
    #[serde(skip)]
    drug_index: HashMap<String, usize>
}

impl TryFrom<KnowledgeBaseTables> for KnowledgeBase {
    type Error = SimpleError;

    fn try_from(tables: KnowledgeBaseTables) -> Result<Self, Self::Error> {
        KnowledgeBase::new(tables)
    }
}

impl KnowledgeBase {
    /// Creates the indexed knowledge base from raw tables
    /// # Arguments
    /// * `tables` - the full set of guideline tables
    /// # Errors
    /// * if the tables fail validation, see `validate()`
    pub fn new(tables: KnowledgeBaseTables) -> Result<KnowledgeBase, SimpleError> {
        let mut gene_index: HashMap<String, usize> = Default::default();
        let mut drug_index: HashMap<String, usize> = Default::default();
        for (i, gene_entry) in tables.genes.iter().enumerate() {
            match gene_index.entry(gene_entry.gene.clone()) {
                Vacant(entry) => entry.insert(i),
                Occupied(entry) => bail!("Gene {} is defined more than once", entry.key())
            };
            for drug in gene_entry.drugs.iter() {
                match drug_index.entry(drug.to_uppercase()) {
                    Vacant(entry) => entry.insert(i),
                    Occupied(entry) => bail!("Drug {} is assigned to more than one gene", entry.key())
                };
            }
        }

        let kb = KnowledgeBase {
            tables,
            gene_index,
            drug_index
        };
        kb.validate()?;
        Ok(kb)
    }

    /// Builds the knowledge base from the hard-coded CPIC tables
    pub fn cpic_default() -> KnowledgeBase {
        let mut genes: Vec<GeneEntry> = GENE_DEFINITIONS.iter()
            .map(|gd| GeneEntry {
                gene: gd.gene.to_string(),
                chromosome: gd.chromosome.to_string(),
                description: gd.description.to_string(),
                drugs: gd.drugs.iter().map(|d| d.to_string()).collect(),
                functional_variants: gd.functional_variants.iter()
                    .map(|(rsid, desc)| (rsid.to_string(), desc.to_string()))
                    .collect(),
                guidelines: vec![]
            })
            .collect();

        for guideline in CPIC_GUIDELINES.iter() {
            let entry = GuidelineEntry {
                gene: guideline.gene.to_string(),
                reference_drug: guideline.drug.to_string(),
                diplotypes: guideline.diplotypes.iter()
                    .map(|(diplotype, phenotype)| (diplotype.to_string(), *phenotype))
                    .collect(),
                phenotype_risks: guideline.risks.iter()
                    .map(|&(phenotype, label, severity, action, alternative)| {
                        (phenotype, RiskInfo::new(label, severity, action, alternative, guideline.url))
                    })
                    .collect(),
                common_variants: guideline.common_variants.iter().map(|v| v.to_string()).collect()
            };
            if let Some(gene_entry) = genes.iter_mut().find(|g| g.gene == guideline.gene) {
                gene_entry.guidelines.push(entry);
            }
        }

        let tables = KnowledgeBaseTables {
            metadata: KbMetadata {
                pgxrisk_version: crate::cli::core::FULL_VERSION.to_string(),
                guideline_source: "CPIC (built-in)".to_string(),
                export_time: None
            },
            genes,
            star_alleles: STAR_ALLELE_VARIANTS.iter()
                .map(|&(rsid, allele, function)| (rsid.to_string(), StarAllele { allele: allele.to_string(), function: function.to_string() }))
                .collect(),
            alternatives: ALTERNATIVE_DRUGS.iter()
                .map(|(drug, alts)| (drug.to_string(), alts.iter().map(|a| a.to_string()).collect()))
                .collect()
        };

        // the built-in tables are covered by unit tests, so a failure here is a programming error
        KnowledgeBase::new(tables).unwrap_or_else(|e| panic!("Built-in CPIC tables are invalid: {e}"))
    }

    /// Loads a knowledge base from a JSON file (optionally gzipped); indices are rebuilt and validated
    /// # Arguments
    /// * `filename` - the JSON file to load
    /// # Errors
    /// * if the file cannot be opened or parsed
    /// * if the parsed tables are not valid
    pub fn from_json(filename: &Path) -> Result<KnowledgeBase, Box<dyn std::error::Error>> {
        let kb: KnowledgeBase = load_json(filename)?;
        debug!("Loaded knowledge base with {} genes and {} drugs", kb.tables.genes.len(), kb.drug_index.len());
        Ok(kb)
    }

    /// Validates the loaded tables where possible.
    /// This does not prevent data errors, but it will prevent lookups from silently missing.
    /// # Errors
    /// * if a gene has no chromosome, drugs, or guideline tables
    /// * if a guideline table is labeled with the wrong gene
    pub fn validate(&self) -> Result<(), SimpleError> {
        for gene_entry in self.tables.genes.iter() {
            let gene = &gene_entry.gene;
            if gene_entry.chromosome.is_empty() {
                bail!("Gene {gene} is missing a chromosome");
            }
            if gene_entry.drugs.is_empty() {
                bail!("Gene {gene} has no drugs");
            }
            if gene_entry.guidelines.is_empty() {
                bail!("Gene {gene} has no guideline tables");
            }
            for guideline in gene_entry.guidelines.iter() {
                if guideline.gene != *gene {
                    bail!("Guideline for {} is listed under gene {gene}", guideline.gene);
                }
                if guideline.diplotypes.is_empty() || guideline.phenotype_risks.is_empty() {
                    bail!("Guideline {gene}/{} has empty tables", guideline.reference_drug);
                }
            }
        }
        Ok(())
    }

    pub fn metadata(&self) -> &KbMetadata {
        &self.tables.metadata
    }

    /// Marks the tables as exported right now, used when writing to file
    pub fn with_export_time(&self) -> KnowledgeBase {
        let mut kb = self.clone();
        kb.tables.metadata.export_time = Some(chrono::Utc::now());
        kb
    }

    pub fn genes(&self) -> &[GeneEntry] {
        &self.tables.genes
    }

    pub fn gene(&self, gene: &str) -> Option<&GeneEntry> {
        self.gene_index.get(gene).map(|&i| &self.tables.genes[i])
    }

    /// Reverse lookup of the gene that governs a drug
    pub fn gene_for_drug(&self, drug: &str) -> Option<&str> {
        self.drug_index.get(&drug.to_uppercase()).map(|&i| self.tables.genes[i].gene.as_str())
    }

    /// All drugs, in gene registration order
    pub fn supported_drugs(&self) -> Vec<&str> {
        self.tables.genes.iter()
            .flat_map(|g| g.drugs.iter().map(|d| d.as_str()))
            .collect()
    }

    pub fn supported_genes(&self) -> Vec<&str> {
        self.tables.genes.iter().map(|g| g.gene.as_str()).collect()
    }

    pub fn gene_chromosome(&self, gene: &str) -> Option<&str> {
        self.gene(gene).map(|g| g.chromosome.as_str())
    }

    pub fn gene_description(&self, gene: &str) -> &str {
        self.gene(gene).map(|g| g.description.as_str()).unwrap_or("a drug-metabolizing enzyme")
    }

    /// Returns true if the rsID is one of the gene's known functional variants
    pub fn is_gene_functional_variant(&self, gene: &str, rsid: &str) -> bool {
        self.gene(gene).map(|g| g.functional_variants.contains_key(rsid)).unwrap_or(false)
    }

    pub fn star_allele(&self, rsid: &str) -> Option<&StarAllele> {
        self.tables.star_alleles.get(rsid)
    }

    /// Returns true if the rsID tags any star allele, regardless of gene
    pub fn is_known_functional(&self, rsid: &str) -> bool {
        self.tables.star_alleles.contains_key(rsid)
    }

    /// Resolves the drug whose guideline table is used for lookups.
    /// A drug with its own guideline is returned as-is, otherwise the gene's first registered guideline is used.
    /// # Arguments
    /// * `gene` - the gene to search
    /// * `drug` - the requested drug, case-insensitive
    pub fn resolve_reference_drug(&self, gene: &str, drug: &str) -> Option<&str> {
        let guideline = self.guideline(gene, drug)?;
        Some(&guideline.reference_drug)
    }

    /// Returns the guideline used for a gene-drug pair, following reference drug resolution
    pub fn guideline(&self, gene: &str, drug: &str) -> Option<&GuidelineEntry> {
        let gene_entry = self.gene(gene)?;
        let drug_upper = drug.to_uppercase();
        gene_entry.guidelines.iter()
            .find(|g| g.reference_drug == drug_upper)
            .or_else(|| gene_entry.guidelines.first())
    }

    /// Diplotype -> phenotype, `Phenotype::Unknown` if there is no entry
    pub fn phenotype_of(&self, gene: &str, drug: &str, diplotype: &str) -> Phenotype {
        self.guideline(gene, drug)
            .and_then(|g| g.diplotypes.get(diplotype).copied())
            .unwrap_or(Phenotype::Unknown)
    }

    /// Phenotype -> recommendation, the "Unknown" recommendation if there is no entry
    pub fn risk_of(&self, gene: &str, drug: &str, phenotype: Phenotype) -> &RiskInfo {
        self.guideline(gene, drug)
            .and_then(|g| g.phenotype_risks.get(&phenotype))
            .unwrap_or(&*UNKNOWN_RISK)
    }

    /// Ordered alternative therapies for a drug
    pub fn alternatives_of(&self, drug: &str) -> &[String] {
        self.tables.alternatives.get(&drug.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(DEFAULT_ALTERNATIVES.as_slice())
    }

    /// Collects the guideline coverage of a drug, None if the drug is not supported
    pub fn drug_info(&self, drug: &str) -> Option<DrugInfo> {
        let gene = self.gene_for_drug(drug)?;
        let guideline = self.guideline(gene, drug)?;
        Some(DrugInfo {
            drug: drug.to_uppercase(),
            gene: gene.to_string(),
            guideline_source_drug: guideline.reference_drug.clone(),
            diplotypes: guideline.diplotypes.keys().cloned().collect(),
            phenotypes: guideline.phenotype_risks.keys().copied().collect(),
            common_variants: guideline.common_variants.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::risk_info::{CPIC_ROOT_URL, RiskLabel, Severity};

    #[test]
    fn test_builtin_tables() {
        let kb = cpic_knowledge_base();
        assert!(kb.validate().is_ok());
        assert_eq!(kb.supported_genes(), vec!["CYP2D6", "CYP2C19", "CYP2C9", "SLCO1B1", "TPMT", "DPYD"]);
        assert_eq!(kb.supported_drugs().len(), 18);
        assert_eq!(kb.supported_drugs()[0], "CODEINE");
        assert_eq!(kb.gene_chromosome("CYP2D6"), Some("22"));
        assert_eq!(kb.gene_chromosome("NOTAGENE"), None);
    }

    #[test]
    fn test_gene_for_drug() {
        let kb = cpic_knowledge_base();
        for drug in kb.supported_drugs() {
            let gene = kb.gene_for_drug(drug);
            assert!(gene.is_some());
            // stable across calls
            assert_eq!(gene, kb.gene_for_drug(drug));
        }
        assert_eq!(kb.gene_for_drug("clopidogrel"), Some("CYP2C19"));
        assert_eq!(kb.gene_for_drug("UNKNOWNDRUG123"), None);
    }

    #[test]
    fn test_resolve_reference_drug() {
        let kb = cpic_knowledge_base();
        assert_eq!(kb.resolve_reference_drug("CYP2D6", "CODEINE"), Some("CODEINE"));
        assert_eq!(kb.resolve_reference_drug("CYP2D6", "tramadol"), Some("CODEINE"));
        assert_eq!(kb.resolve_reference_drug("CYP2C19", "OMEPRAZOLE"), Some("CLOPIDOGREL"));
        assert_eq!(kb.resolve_reference_drug("NOTAGENE", "CODEINE"), None);
    }

    #[test]
    fn test_phenotype_of() {
        let kb = cpic_knowledge_base();
        assert_eq!(kb.phenotype_of("CYP2C9", "WARFARIN", "*1/*1"), Phenotype::NormalMetabolizer);
        assert_eq!(kb.phenotype_of("CYP2C19", "CLOPIDOGREL", "*2/*2"), Phenotype::PoorMetabolizer);
        assert_eq!(kb.phenotype_of("CYP2C19", "LANSOPRAZOLE", "*1/*17"), Phenotype::RapidMetabolizer);
        assert_eq!(kb.phenotype_of("CYP2C19", "CLOPIDOGREL", "*17/*2"), Phenotype::Unknown);
        assert_eq!(kb.phenotype_of("NOTAGENE", "CLOPIDOGREL", "*1/*1"), Phenotype::Unknown);
    }

    #[test]
    fn test_risk_of() {
        let kb = cpic_knowledge_base();
        let risk = kb.risk_of("CYP2D6", "CODEINE", Phenotype::PoorMetabolizer);
        assert_eq!(risk.risk_label(), RiskLabel::Toxic);
        assert_eq!(risk.severity(), Severity::Critical);
        assert_eq!(risk.guideline_url(), "https://cpicpgx.org/guidelines/cyp2d6-codeine-guideline/");

        // shares the codeine guideline
        let risk = kb.risk_of("CYP2D6", "METOPROLOL", Phenotype::UltrarapidMetabolizer);
        assert_eq!(risk.risk_label(), RiskLabel::Ineffective);

        // missing entries are the same shape, just unknown
        let risk = kb.risk_of("CYP2D6", "CODEINE", Phenotype::Unknown);
        assert_eq!(risk, &RiskInfo::unknown());
        assert_eq!(risk.guideline_url(), CPIC_ROOT_URL);
        let risk = kb.risk_of("NOTAGENE", "CODEINE", Phenotype::NormalMetabolizer);
        assert_eq!(risk.risk_label(), RiskLabel::Unknown);
    }

    #[test]
    fn test_alternatives_of() {
        let kb = cpic_knowledge_base();
        assert_eq!(kb.alternatives_of("CLOPIDOGREL")[0], "Prasugrel");
        assert_eq!(kb.alternatives_of("warfarin").len(), 3);
        assert_eq!(kb.alternatives_of("NOTADRUG"), &["Consult your physician".to_string()]);
    }

    #[test]
    fn test_drug_info() {
        let kb = cpic_knowledge_base();
        let info = kb.drug_info("tegafur").unwrap();
        assert_eq!(info.drug, "TEGAFUR");
        assert_eq!(info.gene, "DPYD");
        assert_eq!(info.guideline_source_drug, "FLUOROURACIL");
        assert_eq!(info.common_variants.len(), 5);
        assert_eq!(info.phenotypes.len(), 5);
        assert!(kb.drug_info("NOTADRUG").is_none());
    }

    #[test]
    fn test_json_roundtrip_rebuilds_indices() {
        let kb = cpic_knowledge_base();
        let json = serde_json::to_string(kb).unwrap();
        let reloaded: KnowledgeBase = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.gene_for_drug("SIMVASTATIN"), Some("SLCO1B1"));
        assert_eq!(reloaded.supported_drugs(), kb.supported_drugs());
    }

    #[test]
    fn test_export_and_reload() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let path = tmp_dir.path().join("kb.json.gz");
        let exported = cpic_knowledge_base().with_export_time();
        assert!(exported.metadata().export_time.is_some());
        crate::util::file_io::save_json(&exported, &path).unwrap();

        let reloaded = KnowledgeBase::from_json(&path).unwrap();
        assert!(reloaded.validate().is_ok());
        assert_eq!(reloaded.metadata(), exported.metadata());
        assert_eq!(reloaded.genes(), exported.genes());
        assert_eq!(reloaded.risk_of("TPMT", "MERCAPTOPURINE", Phenotype::PoorMetabolizer).risk_label(), RiskLabel::Toxic);
    }

    #[test]
    fn test_invalid_tables() {
        let mut tables = cpic_knowledge_base().tables.clone();
        tables.genes[0].guidelines.clear();
        assert!(KnowledgeBase::new(tables).is_err());

        let mut tables = cpic_knowledge_base().tables.clone();
        let dup_drug = tables.genes[0].drugs[0].clone();
        tables.genes[1].drugs.push(dup_drug);
        assert!(KnowledgeBase::new(tables).is_err());
    }
}
