
use log::debug;
use simple_error::bail;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::fs::File;
use std::path::Path;

/// Leading bytes of any gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// UTF-8 byte-order mark
const UTF8_BOM: char = '\u{feff}';

/// Helper function that loads a file into some type, helpful generic
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let fp: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            flate2::read::MultiGzDecoder::new(
                File::open(filename)?
            )
        )
    } else {
        Box::new(File::open(filename)?)
    };
    let result: T = serde_json::from_reader(fp)?;
    Ok(result)
}

/// This will save a generic serializable struct to JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file: Box<dyn std::io::Write> = if out_filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            flate2::write::GzEncoder::new(
                File::create(out_filename)?,
                flate2::Compression::best()
            )
        )
    } else {
        Box::new(File::create(out_filename)?)
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

/// Helper function that will read a file line-by-line, dropping blank lines and preserving order.
/// # Arguments
/// * `filename` - The file to load
/// # Errors
/// * if a file is provided but cannot be opened or read
pub fn load_file_lines(filename: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let file = File::open(filename)?;
    let reader = BufReader::new(file);

    let mut lines: Vec<String> = vec![];
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

/// Loads a variant file into memory as text, handling plain and gzipped input.
/// The result is ready to hand to the parser: a leading byte-order mark is removed and the content is checked for a VCF signature.
/// # Arguments
/// * `filename` - the .vcf or .vcf.gz file to load
/// # Errors
/// * if the file cannot be read or decompressed
/// * if the file is empty, not UTF-8, or does not look like a VCF
pub fn load_variant_text(filename: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let mut raw_bytes: Vec<u8> = vec![];
    File::open(filename)?.read_to_end(&mut raw_bytes)?;
    let is_gz_name = filename.extension().unwrap_or_default() == "gz";
    decode_variant_bytes(&raw_bytes, is_gz_name)
}

/// Decodes raw upload bytes into VCF text, see `load_variant_text`
/// # Arguments
/// * `raw_bytes` - the raw file content
/// * `is_gz_name` - if true, the content is treated as gzip even without the magic bytes
/// # Errors
/// * if the content is empty, fails to decompress, is not UTF-8, or does not look like a VCF
pub fn decode_variant_bytes(raw_bytes: &[u8], is_gz_name: bool) -> Result<String, Box<dyn std::error::Error>> {
    if raw_bytes.is_empty() {
        bail!("Empty VCF file");
    }

    let is_gzip = is_gz_name || raw_bytes.starts_with(&GZIP_MAGIC);
    let decoded_bytes: Vec<u8> = if is_gzip {
        debug!("Decompressing gzipped variant file");
        let mut decoder = flate2::read::MultiGzDecoder::new(raw_bytes);
        let mut buffer: Vec<u8> = vec![];
        if let Err(e) = decoder.read_to_end(&mut buffer) {
            bail!("Invalid .vcf.gz file: {e}");
        }
        buffer
    } else {
        raw_bytes.to_vec()
    };

    let text = match String::from_utf8(decoded_bytes) {
        Ok(t) => t,
        Err(_) => bail!("VCF file must be UTF-8 encoded text")
    };
    let text = match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text
    };

    if !looks_like_vcf(&text) {
        bail!("File content does not look like a VCF (missing ##fileformat=VCF or #CHROM header)");
    }
    Ok(text)
}

/// Basic VCF signature check, either a fileformat line or a column header line must be present
pub fn looks_like_vcf(content: &str) -> bool {
    let normalized = content.trim_start_matches(UTF8_BOM).trim();
    normalized.contains("##fileformat=VCF") ||
        normalized.contains("\n#CHROM") ||
        normalized.starts_with("#CHROM")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    #[test]
    fn test_looks_like_vcf() {
        assert!(looks_like_vcf("##fileformat=VCFv4.2\n#CHROM\tPOS\n"));
        assert!(looks_like_vcf("#CHROM\tPOS\tID\n"));
        assert!(looks_like_vcf("\u{feff}#CHROM\tPOS\tID\n"));
        assert!(looks_like_vcf("##source=test\n#CHROM\tPOS\n"));
        assert!(!looks_like_vcf("gene,diplotype\nCYP2D6,*1/*1\n"));
    }

    #[test]
    fn test_decode_rejections() {
        assert!(decode_variant_bytes(b"", false).is_err());
        assert!(decode_variant_bytes(b"not a vcf", false).is_err());
        assert!(decode_variant_bytes(&[0xff, 0xfe, 0x00], false).is_err());
        // claims to be gzip, but is not
        assert!(decode_variant_bytes(b"#CHROM\tPOS", true).is_err());
    }

    #[test]
    fn test_decode_bom() {
        let text = decode_variant_bytes("\u{feff}#CHROM\tPOS\n".as_bytes(), false).unwrap();
        assert!(text.starts_with("#CHROM"));
    }

    #[test]
    fn test_load_variant_text() {
        let plain = load_variant_text(&PathBuf::from("test_data/clopidogrel_het.vcf")).unwrap();
        let gzipped = load_variant_text(&PathBuf::from("test_data/clopidogrel_het.vcf.gz")).unwrap();
        assert_eq!(plain, gzipped);
        assert!(plain.starts_with("##fileformat=VCFv4.2"));
    }

    #[test]
    fn test_save_load_json() {
        let tmp_dir = tempfile::tempdir().unwrap();
        for filename in ["values.json", "values.json.gz"] {
            let path = tmp_dir.path().join(filename);
            let data: Vec<String> = vec!["CODEINE".to_string(), "WARFARIN".to_string()];
            save_json(&data, &path).unwrap();
            let loaded: Vec<String> = load_json(&path).unwrap();
            assert_eq!(data, loaded);
        }
    }

    #[test]
    fn test_load_file_lines() {
        let lines = load_file_lines(&PathBuf::from("test_data/drug_list.txt")).unwrap();
        assert_eq!(lines, vec!["CLOPIDOGREL".to_string(), "warfarin".to_string(), "CODEINE".to_string()]);
    }
}
