use super::Result;
use flate2::read::MultiGzDecoder;
use rust_htslib::bam;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read as ioRead};
use std::path::Path;

pub fn open_text_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }
    let file = File::open(path).map_err(|e| format!("File {}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

pub fn open_bam_reader(path: &Path) -> Result<bam::IndexedReader> {
    bam::IndexedReader::from_path(path).map_err(|e| {
        format!(
            "Failed to create bam reader for {}: {}",
            path.display(),
            e
        )
    })
}

/// Loads a read-identifier allow-list, one identifier per line.
/// Blank lines and `#` comments are skipped.
pub fn read_id_allowlist(path: &Path) -> Result<HashSet<String>> {
    let reader = open_text_reader(path)?;
    let mut ids = HashSet::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        let id = line.trim();
        if id.is_empty() || id.starts_with('#') {
            continue;
        }
        ids.insert(id.to_string());
    }
    if ids.is_empty() {
        return Err(format!("No read identifiers found in {}", path.display()));
    }
    Ok(ids)
}
