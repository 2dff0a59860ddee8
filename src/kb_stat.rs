
use strum::IntoEnumIterator;

use crate::data_types::risk_info::Phenotype;
use crate::database::guideline_database::KnowledgeBase;

/// Prints the statistics for a given knowledge base
/// # Arguments
/// * `knowledge_base` - the knowledge base to print the statistics for
pub fn print_stats(knowledge_base: &KnowledgeBase) {
    // display the metadata
    let kb_metadata = knowledge_base.metadata();
    println!("Knowledge base metadata:");
    println!("\tVersion: {}", kb_metadata.pgxrisk_version);
    println!("\tGuideline source: {}", kb_metadata.guideline_source);
    match kb_metadata.export_time.as_ref() {
        Some(t) => println!("\tExport time: {t}"),
        None => println!("\tExport time: N/A")
    };

    let genes = knowledge_base.genes();
    println!("Knowledge base statistics:");
    println!("\tTotal genes: {}", genes.len());
    println!("\tTotal drugs: {}", knowledge_base.supported_drugs().len());
    println!("\tTotal guideline tables: {}", genes.iter().map(|g| g.guidelines().len()).sum::<usize>());
    println!("\tTotal diplotypes: {}", genes.iter()
        .flat_map(|g| g.guidelines())
        .map(|gl| gl.diplotypes().len())
        .sum::<usize>()
    );
    println!("\tTotal functional variants: {}", genes.iter().map(|g| g.functional_variants().len()).sum::<usize>());

    // per-gene statistics are only shown with elevated verbosity
    if log::log_enabled!(log::Level::Debug) {
        println!();
        println!("Gene statistics:");
        println!("gene\tchromosome\tdrugs\tfunctional_variants\treference_drug\tdiplotypes\tphenotype_coverage");
        for gene_entry in genes.iter() {
            for guideline in gene_entry.guidelines().iter() {
                // phenotype codes that have a recommendation in this table
                let coverage: Vec<String> = Phenotype::iter()
                    .filter(|p| guideline.phenotype_risks().contains_key(p))
                    .map(|p| p.to_string())
                    .collect();
                println!("{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    gene_entry.gene(), gene_entry.chromosome(), gene_entry.drugs().join(","),
                    gene_entry.functional_variants().len(), guideline.reference_drug(),
                    guideline.diplotypes().len(), coverage.join(",")
                );
            }
        }
        println!();

        println!("Drug statistics:");
        println!("drug\tgene\tguideline_source_drug\talternatives");
        for drug in knowledge_base.supported_drugs() {
            if let Some(info) = knowledge_base.drug_info(drug) {
                println!("{}\t{}\t{}\t{}", info.drug, info.gene, info.guideline_source_drug, knowledge_base.alternatives_of(drug).join(";"));
            }
        }
        println!();
    }
}
