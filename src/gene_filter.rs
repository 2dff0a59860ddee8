
use log::{debug, trace};

use crate::data_types::variant::Variant;
use crate::database::guideline_database::KnowledgeBase;

/// Narrows the parsed variants down to the ones relevant to a single gene.
/// Variants with a known functional rsID for the gene take priority; if none are present, every variant on the gene's chromosome is returned.
/// Input order is preserved.
/// # Arguments
/// * `knowledge_base` - provides the functional rsIDs and chromosome for the gene
/// * `gene` - the gene to filter for
/// * `variants` - all variants from the VCF
pub fn filter_gene_variants<'a>(knowledge_base: &KnowledgeBase, gene: &str, variants: &'a [Variant]) -> Vec<&'a Variant> {
    let rsid_hits: Vec<&Variant> = variants.iter()
        .filter(|v| knowledge_base.is_gene_functional_variant(gene, v.rsid()))
        .collect();
    if !rsid_hits.is_empty() {
        debug!("{gene}: {} variants matched by rsID", rsid_hits.len());
        return rsid_hits;
    }

    let chromosome: &str = match knowledge_base.gene_chromosome(gene) {
        Some(c) => c,
        None => {
            debug!("{gene}: no chromosome registered, no variants selected");
            return vec![];
        }
    };
    let target = normalize_chromosome(chromosome);

    let chrom_hits: Vec<&Variant> = variants.iter()
        .filter(|v| normalize_chromosome(v.chrom()) == target)
        .collect();
    debug!("{gene}: no rsID matches, {} variants matched on chromosome {chromosome}", chrom_hits.len());
    for v in chrom_hits.iter() {
        trace!("\t{}:{} {}", v.chrom(), v.pos(), v.rsid());
    }
    chrom_hits
}

/// Lower-cases a chromosome name and removes any "chr" prefix, so "Chr22", "chr22" and "22" all compare equal
fn normalize_chromosome(chrom: &str) -> String {
    let lower = chrom.trim().to_lowercase();
    match lower.strip_prefix("chr") {
        Some(stripped) => stripped.to_string(),
        None => lower
    }
}
