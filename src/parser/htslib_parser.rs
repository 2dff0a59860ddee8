
use log::{debug, trace, warn};
use rust_htslib::bcf;
use rust_htslib::bcf::Read;
use rust_htslib::bcf::record::GenotypeAllele;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::data_types::variant::{ParseMetadata, UNKNOWN_GENOTYPE, UNKNOWN_SAMPLE, Variant, resolve_genotype};
use crate::parser::{ParseStrategy, ParserError};

/// Label recorded in the metadata for this strategy
pub const HTSLIB_LABEL: &str = "VCF v4.2 (htslib parser)";

/// Minimum tab-delimited columns for a data line
const MIN_DATA_COLUMNS: usize = 8;

/// Primary strategy: hands the text to htslib through a temporary file
#[derive(Clone, Debug, Default)]
pub struct HtslibParser {
    /// Folder for the handoff file, the system temp folder if None
    tmp_dir: Option<PathBuf>
}

impl HtslibParser {
    /// Creates a parser that writes its handoff files into `tmp_dir`
    pub fn with_temp_dir(tmp_dir: &Path) -> HtslibParser {
        HtslibParser {
            tmp_dir: Some(tmp_dir.to_path_buf())
        }
    }
}

impl ParseStrategy for HtslibParser {
    fn source_label(&self) -> &'static str {
        HTSLIB_LABEL
    }

    fn parse(&self, text: &str) -> Result<(Vec<Variant>, ParseMetadata), ParserError> {
        // htslib is strict about layout, anything it would misread goes to the fallback instead
        check_handoff_compatible(text)?;

        // htslib keeps a trailing '\r' in the last column, the fallback tokenizer does not
        let handoff_text: Cow<str> = if text.contains('\r') {
            Cow::Owned(text.lines().map(|line| format!("{line}\n")).collect())
        } else {
            Cow::Borrowed(text)
        };

        // the file is removed when `tmp_vcf` drops, so every early return below also cleans up
        let mut builder = tempfile::Builder::new();
        builder.prefix("pgxrisk").suffix(".vcf");
        let mut tmp_vcf = match self.tmp_dir.as_ref() {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?
        };
        trace!("Writing VCF handoff file: {:?}", tmp_vcf.path());
        tmp_vcf.write_all(handoff_text.as_bytes())?;
        tmp_vcf.flush()?;

        let result = read_vcf_records(tmp_vcf.path());

        if let Err(e) = tmp_vcf.close() {
            warn!("Failed to remove temporary VCF file: {e}");
        }
        result
    }
}

/// Makes sure every data line is tab-delimited with a numeric position
fn check_handoff_compatible(text: &str) -> Result<(), ParserError> {
    for (line_index, line) in text.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < MIN_DATA_COLUMNS {
            return Err(ParserError::NotTabDelimited { line_number: line_index + 1 });
        }
        if columns[1].trim().parse::<u64>().is_err() {
            return Err(ParserError::InvalidPosition { line_number: line_index + 1 });
        }
    }
    Ok(())
}

/// Reads all records from a VCF file with htslib
/// # Arguments
/// * `vcf_fn` - the VCF file to open
/// # Errors
/// * if htslib fails to open or parse the file
/// * if any field is not valid UTF-8
fn read_vcf_records(vcf_fn: &Path) -> Result<(Vec<Variant>, ParseMetadata), ParserError> {
    let mut vcf_reader: bcf::Reader = bcf::Reader::from_path(vcf_fn)?;
    let sample_id: String = match vcf_reader.header().samples().first() {
        Some(sv) => std::str::from_utf8(sv)
            .map_err(|_| ParserError::Utf8 { field: "sample name" })?
            .to_string(),
        None => UNKNOWN_SAMPLE.to_string()
    };

    let mut variants: Vec<Variant> = vec![];
    for record_result in vcf_reader.records() {
        let record: bcf::Record = record_result?;
        variants.push(convert_record(&record)?);
    }
    debug!("htslib parsed {} records for sample {sample_id}", variants.len());

    Ok((variants, ParseMetadata::new(sample_id, HTSLIB_LABEL)))
}

/// Converts an htslib record into our variant type, using the same genotype rules as the fallback tokenizer
fn convert_record(record: &bcf::Record) -> Result<Variant, ParserError> {
    // contigs that are missing from the header get added while reading, so use the record's view of it
    let pos = record.pos();
    let rid = record.rid().ok_or(ParserError::MissingContig { pos })?;
    let chrom = std::str::from_utf8(record.header().rid2name(rid)?)
        .map_err(|_| ParserError::Utf8 { field: "CHROM" })?
        .to_string();
    let rsid = String::from_utf8(record.id())
        .map_err(|_| ParserError::Utf8 { field: "ID" })?;

    let alleles: Vec<&str> = record.alleles().into_iter()
        .map(|a| std::str::from_utf8(a))
        .collect::<Result<Vec<&str>, _>>()
        .map_err(|_| ParserError::Utf8 { field: "REF/ALT" })?;
    let reference: &str = match alleles.first() {
        Some(r) => r,
        None => return Err(ParserError::MissingReference { chrom, pos })
    };
    // a "." ALT shows up as a record with no alternate alleles
    let alternates: Vec<&str> = if alleles.len() > 1 {
        alleles[1..].to_vec()
    } else {
        vec!["."]
    };

    let genotype: String = if record.sample_count() > 0 {
        let all_genotypes = record.genotypes()?;
        let genotype = all_genotypes.get(0);
        resolve_genotype(&genotype_token(&genotype), reference, &alternates)
    } else {
        UNKNOWN_GENOTYPE.to_string()
    };

    // htslib positions are 0-based
    Ok(Variant::new(&chrom, (pos + 1) as u64, &rsid, reference, alternates[0], genotype))
}

/// Rebuilds the textual GT token, e.g. "0|1" or "./.", from the decoded alleles
fn genotype_token(genotype: &[GenotypeAllele]) -> String {
    let mut token = String::new();
    for (i, allele) in genotype.iter().enumerate() {
        if i > 0 {
            let separator = match allele {
                GenotypeAllele::Phased(_) | GenotypeAllele::PhasedMissing => '|',
                GenotypeAllele::Unphased(_) | GenotypeAllele::UnphasedMissing => '/'
            };
            token.push(separator);
        }
        match allele.index() {
            Some(index) => token.push_str(&index.to_string()),
            None => token.push('.')
        };
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use crate::parser::fallback::FallbackParser;
    use crate::util::file_io::load_variant_text;

    #[test]
    fn test_genotype_token() {
        assert_eq!(genotype_token(&[GenotypeAllele::Unphased(0), GenotypeAllele::Unphased(1)]), "0/1");
        assert_eq!(genotype_token(&[GenotypeAllele::Unphased(1), GenotypeAllele::Phased(0)]), "1|0");
        assert_eq!(genotype_token(&[GenotypeAllele::UnphasedMissing, GenotypeAllele::UnphasedMissing]), "./.");
        assert_eq!(genotype_token(&[GenotypeAllele::UnphasedMissing]), ".");
    }

    #[test]
    fn test_handoff_compatibility() {
        assert!(check_handoff_compatible("#CHROM\tPOS\n22\t100\trs1\tA\tG\t.\tPASS\t.\n").is_ok());
        assert!(matches!(
            check_handoff_compatible("#CHROM POS\n22 100 rs1 A G . PASS .\n"),
            Err(ParserError::NotTabDelimited { line_number: 2 })
        ));
        assert!(matches!(
            check_handoff_compatible("22\tABC\trs1\tA\tG\t.\tPASS\t.\n"),
            Err(ParserError::InvalidPosition { line_number: 1 })
        ));
    }

    #[test]
    fn test_strategies_agree() {
        let text = load_variant_text(&PathBuf::from("test_data/multi_gene.vcf")).unwrap();
        let (hts_variants, hts_metadata) = HtslibParser::default().parse(&text).unwrap();
        let (fb_variants, fb_metadata) = FallbackParser.parse_text(&text);

        assert_eq!(hts_metadata.source_label(), HTSLIB_LABEL);
        assert_eq!(hts_metadata.sample_id(), fb_metadata.sample_id());
        assert!(!hts_variants.is_empty());
        assert_eq!(hts_variants, fb_variants);
    }

    #[test]
    fn test_strategies_agree_on_edge_records() {
        let sample_header = "##fileformat=VCFv4.2
##contig=<ID=chr22,length=50818468>
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tEDGE_SAMPLE
";
        let sites_header = "##fileformat=VCFv4.2
##contig=<ID=chr22,length=50818468>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
";
        let cases: Vec<(&str, String)> = vec![
            ("no ALT", format!("{sample_header}chr22\t42126611\trs1065852\tG\t.\t50\tPASS\t.\tGT\t0/1\n")),
            ("missing GT", format!("{sample_header}chr22\t42126611\trs1065852\tG\tA\t50\tPASS\t.\tGT\t.\n")),
            ("partial GT", format!("{sample_header}chr22\t42126611\trs1065852\tG\tA\t50\tPASS\t.\tGT\t0/.\n")),
            ("sites only", format!("{sites_header}chr22\t42126611\trs1065852\tG\tA\t50\tPASS\t.\n")),
            ("position zero", format!("{sample_header}chr22\t0\trs1065852\tG\tA\t50\tPASS\t.\tGT\t0/1\n")),
            ("CRLF", format!("{sample_header}chr22\t42126611\trs1065852\tG\tA\t50\tPASS\t.\tGT\t0/1\n").replace('\n', "\r\n")),
            ("truncated sample", format!("{sample_header}chr22\t42126611\trs1065852\tG\tA\t50\tPASS\t.\tDP:GT\t30\n"))
        ];

        for (label, text) in cases.iter() {
            let (fb_variants, fb_metadata) = FallbackParser.parse_text(text);
            // htslib may reject some of these, which just means the fallback is used
            if let Ok((hts_variants, hts_metadata)) = HtslibParser::default().parse(text) {
                assert_eq!(hts_variants, fb_variants, "{label}");
                assert_eq!(hts_metadata.sample_id(), fb_metadata.sample_id(), "{label}");
            }
        }
    }

    #[test]
    fn test_handoff_file_removed() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let parser = HtslibParser::with_temp_dir(tmp_dir.path());

        let text = load_variant_text(&PathBuf::from("test_data/clopidogrel_het.vcf")).unwrap();
        assert!(parser.parse(&text).is_ok());
        assert_eq!(std::fs::read_dir(tmp_dir.path()).unwrap().count(), 0);

        // passes the layout check, then fails inside htslib
        let headerless = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n22\t100\trs1\tA\tG\t.\tPASS\t.\n";
        assert!(parser.parse(headerless).is_err());
        assert_eq!(std::fs::read_dir(tmp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_malformed_content_is_an_error() {
        // no fileformat line, htslib cannot detect the format
        let text = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n22\t100\trs1\tA\tG\t.\tPASS\t.\n";
        assert!(HtslibParser::default().parse(text).is_err());
    }
}
