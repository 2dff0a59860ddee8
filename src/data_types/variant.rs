
use serde::Serialize;

/// Genotype placeholder for records that carry no sample columns
pub const UNKNOWN_GENOTYPE: &str = "Unknown";
/// Sample placeholder for files that do not declare a sample column
pub const UNKNOWN_SAMPLE: &str = "Unknown";

/// A single parsed VCF record, restricted to the fields we care about for PGx lookups
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Variant {
    /// Chromosome as written in the file, e.g. "chr22" or "22"
    chrom: String,
    /// 1-based position
    pos: u64,
    /// Variant identifier, "." when unknown
    rsid: String,
    /// Reference allele
    reference: String,
    /// First alternate allele only
    alternate: String,
    /// Resolved genotype, formatted as "allele1/allele2"
    genotype: String
}

impl Variant {
    pub fn new(chrom: &str, pos: u64, rsid: &str, reference: &str, alternate: &str, genotype: String) -> Variant {
        Variant {
            chrom: chrom.to_string(),
            pos,
            rsid: rsid.to_string(),
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            genotype
        }
    }

    /// Returns true if both halves of the genotype are the reference allele
    pub fn is_homozygous_reference(&self) -> bool {
        match self.genotype_alleles() {
            Some((left, right)) => left == self.reference && right == self.reference,
            None => false
        }
    }

    /// Splits a diploid genotype into its two alleles; None for "Unknown" or haploid tokens
    pub fn genotype_alleles(&self) -> Option<(&str, &str)> {
        self.genotype.split_once('/')
    }

    // getters
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn rsid(&self) -> &str {
        &self.rsid
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternate(&self) -> &str {
        &self.alternate
    }

    pub fn genotype(&self) -> &str {
        &self.genotype
    }
}

/// Details about a single parse call
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ParseMetadata {
    /// The first sample declared in the header, or "Unknown"
    sample_id: String,
    /// Label for the strategy that generated the records
    source_label: String
}

impl ParseMetadata {
    pub fn new(sample_id: String, source_label: &str) -> ParseMetadata {
        ParseMetadata {
            sample_id,
            source_label: source_label.to_string()
        }
    }

    /// Returns the sample ID only if the file actually declared one
    pub fn declared_sample(&self) -> Option<&str> {
        if self.sample_id == UNKNOWN_SAMPLE {
            None
        } else {
            Some(&self.sample_id)
        }
    }

    // getters
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }
}

/// Converts a raw GT token into an "allele1/allele2" string.
/// Phased separators are collapsed to '/', missing calls become homozygous reference, and any index outside of the allele list is reported as "?".
/// Tokens that are not a pair of numeric indices are returned with only the separator normalized.
/// # Arguments
/// * `gt_token` - the raw GT value, e.g. "0|1"
/// * `reference` - the REF allele
/// * `alternates` - all ALT alleles in file order
pub fn resolve_genotype(gt_token: &str, reference: &str, alternates: &[&str]) -> String {
    if gt_token.is_empty() || gt_token == "." {
        return format!("{reference}/{reference}");
    }

    let normalized = gt_token.replace('|', "/");
    let parts: Vec<&str> = normalized.split('/').collect();
    if parts.len() != 2 {
        return normalized;
    }

    let (idx1, idx2) = match (parts[0].parse::<usize>(), parts[1].parse::<usize>()) {
        (Ok(i1), Ok(i2)) => (i1, i2),
        _ => return normalized
    };

    let allele_at = |index: usize| {
        if index == 0 {
            reference
        } else {
            alternates.get(index - 1).copied().unwrap_or("?")
        }
    };
    format!("{}/{}", allele_at(idx1), allele_at(idx2))
}
