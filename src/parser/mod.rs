
/// The plain-text tokenizer that is always available
pub mod fallback;
/// The htslib-backed primary strategy
#[cfg(feature = "htslib")]
pub mod htslib_parser;

use log::debug;

use crate::data_types::variant::{ParseMetadata, Variant};
use crate::parser::fallback::FallbackParser;

/// Errors that can be produced by a primary parsing strategy; these always result in the fallback parser being used
#[derive(thiserror::Error, Debug)]
pub enum ParserError {
    #[error("I/O error during parser handoff: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "htslib")]
    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),
    #[error("invalid UTF-8 in {field}")]
    Utf8 { field: &'static str },
    #[error("data line {line_number} is not tab-delimited")]
    NotTabDelimited { line_number: usize },
    #[error("data line {line_number} does not have an integer position")]
    InvalidPosition { line_number: usize },
    #[error("record at position {pos} has no contig")]
    MissingContig { pos: i64 },
    #[error("record at {chrom}:{pos} has no reference allele")]
    MissingReference { chrom: String, pos: i64 }
}

/// A strategy that converts VCF text into variant records
pub trait ParseStrategy: Send + Sync {
    /// Short label describing the strategy, copied into the parse metadata
    fn source_label(&self) -> &'static str;

    /// Parses the full VCF text
    /// # Errors
    /// * if the strategy cannot handle the provided content
    fn parse(&self, text: &str) -> Result<(Vec<Variant>, ParseMetadata), ParserError>;
}

/// Parser front-end: an optional primary strategy with a mandatory fallback.
/// Primary failures are caught here and never reach the caller.
pub struct VariantParser {
    /// Selected by a capability probe, None if unavailable or disabled
    primary: Option<Box<dyn ParseStrategy>>,
    /// Always available
    fallback: FallbackParser
}

impl Default for VariantParser {
    fn default() -> Self {
        Self::new(true)
    }
}

impl VariantParser {
    /// Creates a parser, probing for the primary strategy
    /// # Arguments
    /// * `allow_primary` - if false, only the fallback tokenizer is used
    pub fn new(allow_primary: bool) -> VariantParser {
        let primary = if allow_primary {
            probe_primary_strategy()
        } else {
            None
        };
        match primary.as_ref() {
            Some(p) => debug!("Primary VCF parser: {}", p.source_label()),
            None => debug!("Primary VCF parser unavailable, using fallback only")
        };
        VariantParser {
            primary,
            fallback: FallbackParser
        }
    }

    /// Convenience constructor that never attempts the primary strategy
    pub fn fallback_only() -> VariantParser {
        Self::new(false)
    }

    /// Returns true if a primary strategy was selected
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Parses VCF text into records and metadata, this never fails.
    /// Malformed lines are skipped, and any primary failure redirects to the fallback.
    /// # Arguments
    /// * `text` - the full VCF content
    pub fn parse(&self, text: &str) -> (Vec<Variant>, ParseMetadata) {
        if let Some(primary) = self.primary.as_ref() {
            match primary.parse(text) {
                Ok(result) => return result,
                Err(e) => {
                    debug!("Primary parser ({}) failed, using fallback: {e}", primary.source_label());
                }
            }
        }
        self.fallback.parse_text(text)
    }
}

/// Capability probe for the primary strategy
#[cfg(feature = "htslib")]
fn probe_primary_strategy() -> Option<Box<dyn ParseStrategy>> {
    Some(Box::new(htslib_parser::HtslibParser::default()))
}

#[cfg(not(feature = "htslib"))]
fn probe_primary_strategy() -> Option<Box<dyn ParseStrategy>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always fails, used to exercise the redirect
    struct BrokenParser;

    impl ParseStrategy for BrokenParser {
        fn source_label(&self) -> &'static str {
            "broken"
        }

        fn parse(&self, _text: &str) -> Result<(Vec<Variant>, ParseMetadata), ParserError> {
            Err(ParserError::Utf8 { field: "everything" })
        }
    }

    const SIMPLE_VCF: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE_1
chr10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT\t0/1
";

    #[test]
    fn test_primary_failure_redirects() {
        let parser = VariantParser {
            primary: Some(Box::new(BrokenParser)),
            fallback: FallbackParser
        };
        assert!(parser.has_primary());
        let (variants, metadata) = parser.parse(SIMPLE_VCF);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].genotype(), "G/A");
        assert_eq!(metadata.sample_id(), "SAMPLE_1");
        assert_eq!(metadata.source_label(), fallback::FALLBACK_LABEL);
    }

    #[test]
    fn test_fallback_only() {
        let parser = VariantParser::fallback_only();
        assert!(!parser.has_primary());
        let (variants, _metadata) = parser.parse(SIMPLE_VCF);
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn test_default_parser_never_fails() {
        // whitespace separated and header-less, the primary will reject this
        let parser = VariantParser::default();
        let (variants, metadata) = parser.parse("#CHROM POS ID REF ALT QUAL FILTER INFO FORMAT S1\n22 42130692 rs3892097 G A . PASS . GT 1/1\n");
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].genotype(), "A/A");
        assert_eq!(metadata.sample_id(), "S1");
    }
}
