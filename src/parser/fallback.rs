
use log::trace;

use crate::data_types::variant::{ParseMetadata, UNKNOWN_GENOTYPE, UNKNOWN_SAMPLE, Variant, resolve_genotype};
use crate::parser::{ParseStrategy, ParserError};

/// Label recorded in the metadata for this strategy
pub const FALLBACK_LABEL: &str = "VCF v4.2 (fallback parser)";

/// Minimum columns for a data line: CHROM POS ID REF ALT QUAL FILTER INFO
const MIN_DATA_COLUMNS: usize = 8;
/// Columns required before a sample is present: ... FORMAT SAMPLE
const SAMPLE_COLUMNS: usize = 10;
/// Used when the sample does not have enough FORMAT subfields
const DEFAULT_GT: &str = "0/0";

/// Hand-rolled VCF tokenizer, handles tab or whitespace delimited text
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackParser;

impl FallbackParser {
    /// Parses VCF text line-by-line, skipping anything that cannot be parsed
    /// # Arguments
    /// * `text` - the full VCF content
    pub fn parse_text(&self, text: &str) -> (Vec<Variant>, ParseMetadata) {
        let mut variants: Vec<Variant> = vec![];
        let mut sample_id: String = UNKNOWN_SAMPLE.to_string();

        for (line_index, line) in text.trim().lines().enumerate() {
            if line.starts_with('#') {
                if line.starts_with("#CHROM") {
                    let columns = split_columns(line, SAMPLE_COLUMNS);
                    if let Some(&sample) = columns.get(SAMPLE_COLUMNS - 1) {
                        sample_id = sample.to_string();
                    }
                }
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            match parse_data_line(line) {
                Some(variant) => variants.push(variant),
                None => trace!("Skipping malformed VCF line {}: {line:?}", line_index + 1)
            };
        }

        (variants, ParseMetadata::new(sample_id, FALLBACK_LABEL))
    }
}

impl ParseStrategy for FallbackParser {
    fn source_label(&self) -> &'static str {
        FALLBACK_LABEL
    }

    fn parse(&self, text: &str) -> Result<(Vec<Variant>, ParseMetadata), ParserError> {
        Ok(self.parse_text(text))
    }
}

/// Splits on tabs, falling back to any whitespace if that produces too few columns
fn split_columns(line: &str, expected: usize) -> Vec<&str> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < expected {
        line.split_whitespace().collect()
    } else {
        columns
    }
}

/// Converts a single data line into a variant, None if the line is malformed
fn parse_data_line(line: &str) -> Option<Variant> {
    let columns = split_columns(line, MIN_DATA_COLUMNS);
    if columns.len() < MIN_DATA_COLUMNS {
        return None;
    }

    let pos: u64 = columns[1].trim().parse().ok()?;
    let chrom = columns[0];
    let rsid = columns[2];
    let reference = columns[3];
    let alternates: Vec<&str> = columns[4].split(',').collect();
    let alternate = alternates[0];

    let genotype: String = if columns.len() >= SAMPLE_COLUMNS {
        let format_fields: Vec<&str> = columns[8].split(':').collect();
        let sample_fields: Vec<&str> = columns[9].split(':').collect();
        let gt_index = format_fields.iter().position(|&f| f == "GT").unwrap_or(0);
        let gt_value = sample_fields.get(gt_index).copied().unwrap_or(DEFAULT_GT);
        resolve_genotype(gt_value, reference, &alternates)
    } else {
        UNKNOWN_GENOTYPE.to_string()
    };

    Some(Variant::new(chrom, pos, rsid, reference, alternate, genotype))
}
