
use serde::Serialize;

/// The reference (wild-type) star allele
pub const WILD_TYPE_ALLELE: &str = "*1";

/// A simplified two-allele call for a single gene
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diplotype {
    /// short string for haplotype 1
    hap1: String,
    /// short string for haplotype 2
    hap2: String,
    /// combination diplotype call, this is the key into the guideline tables
    diplotype: String
}

impl Diplotype {
    pub fn new(hap1: &str, hap2: &str) -> Diplotype {
        Diplotype {
            hap1: hap1.to_string(),
            hap2: hap2.to_string(),
            diplotype: format!("{hap1}/{hap2}")
        }
    }

    /// The "*1/*1" call used when no star alleles are detected
    pub fn wild_type() -> Diplotype {
        Diplotype::new(WILD_TYPE_ALLELE, WILD_TYPE_ALLELE)
    }

    /// If homozygous, return the single haplotype
    pub fn homozygous_haplotype(&self) -> Option<&str> {
        if self.hap1 == self.hap2 {
            Some(&self.hap1)
        } else {
            None
        }
    }

    // getters
    pub fn hap1(&self) -> &str {
        &self.hap1
    }

    pub fn hap2(&self) -> &str {
        &self.hap2
    }

    pub fn diplotype(&self) -> &str {
        &self.diplotype
    }
}

impl std::fmt::Display for Diplotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.diplotype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diplotype() {
        let diplotype = Diplotype::new("*2", "*3");
        assert_eq!(diplotype.diplotype(), "*2/*3");
        assert_eq!(diplotype.to_string(), "*2/*3");
        assert_eq!(diplotype.homozygous_haplotype(), None);
    }

    #[test]
    fn test_wild_type() {
        let diplotype = Diplotype::wild_type();
        assert_eq!(diplotype.diplotype(), "*1/*1");
        assert_eq!(diplotype.homozygous_haplotype(), Some("*1"));
    }
}
