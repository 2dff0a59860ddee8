
use log::{debug, trace};
use std::collections::BTreeSet;

use crate::data_types::pgx_diplotype::Diplotype;
use crate::data_types::variant::Variant;
use crate::database::guideline_database::KnowledgeBase;

/// Infers a simplified diplotype from the star alleles tagged by the gene variants.
/// Every non-reference call on a star allele rsID contributes that allele; phase and zygosity are not considered.
/// With a single distinct allele the result is reported as homozygous for it (e.g. a heterozygous *2 call is "*2/*2").
/// With two or more, the two lexicographically smallest designations are used.
/// # Arguments
/// * `knowledge_base` - provides the rsID to star allele mapping
/// * `gene` - the gene being called, only used for logging
/// * `gene_variants` - variants that passed the gene filter
pub fn infer_diplotype(knowledge_base: &KnowledgeBase, gene: &str, gene_variants: &[&Variant]) -> Diplotype {
    let mut detected_alleles: BTreeSet<&str> = BTreeSet::new();
    for variant in gene_variants.iter() {
        let star_allele = match knowledge_base.star_allele(variant.rsid()) {
            Some(sa) => sa,
            None => continue
        };

        if variant.genotype_alleles().is_none() || variant.is_homozygous_reference() {
            trace!("\t{} ({}) has no alternate call: {}", variant.rsid(), star_allele.allele(), variant.genotype());
            continue;
        }
        trace!("\t{} => {} ({})", variant.rsid(), star_allele.allele(), star_allele.function());
        detected_alleles.insert(star_allele.allele());
    }

    let mut allele_iter = detected_alleles.iter();
    let diplotype = match (allele_iter.next(), allele_iter.next()) {
        (None, _) => Diplotype::wild_type(),
        (Some(&allele), None) => Diplotype::new(allele, allele),
        (Some(&hap1), Some(&hap2)) => Diplotype::new(hap1, hap2)
    };
    debug!("Diplotype for {gene} => {diplotype} (from {} star alleles)", detected_alleles.len());
    diplotype
}
