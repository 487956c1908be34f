pub mod cluster;
pub mod stats;

use crate::cli::InputArgs;
use crate::signal::WindowParams;
use crate::store::{ConditionStore, DisplayStyle};
use crate::utils::{open_text_reader, read_id_allowlist, GenomicSite, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// One line of the condition manifest.
#[derive(Debug, PartialEq)]
pub struct ConditionLine {
    pub label: Option<String>,
    pub aln_path: PathBuf,
    pub signal_path: PathBuf,
    pub site: GenomicSite,
}

/// Parses a condition manifest: whitespace-separated
/// `label aln_bam signal_table contig:position` lines, `#` comments
/// allowed. A label of `.` requests the default `{contig}:{position}`.
pub fn read_condition_manifest(path: &Path) -> Result<Vec<ConditionLine>> {
    const EXPECTED_FIELD_COUNT: usize = 4;
    let reader = open_text_reader(path)?;
    let mut lines = Vec::new();

    for (line_number, result_line) in reader.lines().enumerate() {
        let line =
            result_line.map_err(|e| format!("Error at manifest line {}: {}", line_number + 1, e))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let split_line: Vec<&str> = line.split_whitespace().collect();
        if split_line.len() != EXPECTED_FIELD_COUNT {
            return Err(format!(
                "Error at manifest line {}: expected {} fields in the format 'label bam signal site', found {}",
                line_number + 1,
                EXPECTED_FIELD_COUNT,
                split_line.len()
            ));
        }

        let (label, aln, signal, site) = match &split_line[..] {
            [label, aln, signal, site] => (*label, *aln, *signal, *site),
            _ => unreachable!(),
        };

        let site = GenomicSite::from_string(site)
            .map_err(|e| format!("Error at manifest line {}: {}", line_number + 1, e))?;

        lines.push(ConditionLine {
            label: (label != ".").then(|| label.to_string()),
            aln_path: PathBuf::from(aln),
            signal_path: PathBuf::from(signal),
            site,
        });
    }

    if lines.is_empty() {
        return Err(format!("No conditions found in {}", path.display()));
    }

    Ok(lines)
}

/// Builds a store holding one condition per manifest line, all sharing
/// the engine parameters from the command line.
pub fn build_store(input: &InputArgs) -> Result<ConditionStore> {
    let allowlist = input
        .read_ids_path
        .as_deref()
        .map(read_id_allowlist)
        .transpose()?;

    let lines = read_condition_manifest(&input.conditions_path)?;
    let mut store = ConditionStore::new();

    for line in lines {
        let mut params = WindowParams::new(input.window, input.molecule);
        params.exclude_indels = input.exclude_indels;
        params.max_reads = input.max_reads;
        params.read_ids = allowlist.clone();
        params.matched_base = input.match_base.map(|base| base as u8);

        let condition = store.add_condition(
            line.label.as_deref(),
            &line.aln_path,
            &line.signal_path,
            line.site,
            params,
            DisplayStyle::default(),
        )?;
        log::info!(
            "Added condition '{}' with {} reads",
            condition.label(),
            condition.num_reads()
        );
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn manifest_parses_labels_and_sites() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# label bam signal site").unwrap();
        writeln!(file, "ctrl ctrl.bam ctrl.tsv chr1:12345").unwrap();
        writeln!(file, ". case.bam case.tsv chrX:99").unwrap();
        let lines = read_condition_manifest(file.path()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label.as_deref(), Some("ctrl"));
        assert_eq!(lines[0].site, GenomicSite::new("chr1", 12344).unwrap());
        assert_eq!(lines[1].label, None);
        assert_eq!(lines[1].signal_path, PathBuf::from("case.tsv"));
    }

    #[test]
    fn manifest_reports_line_numbers_on_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ctrl ctrl.bam ctrl.tsv chr1:12345").unwrap();
        writeln!(file, "case case.bam case.tsv").unwrap();
        let err = read_condition_manifest(file.path()).unwrap_err();
        assert!(err.starts_with("Error at manifest line 2"), "{}", err);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ctrl ctrl.bam ctrl.tsv chr1:-3").unwrap();
        let err = read_condition_manifest(file.path()).unwrap_err();
        assert!(err.contains("Invalid site encoding"), "{}", err);
    }

    #[test]
    fn empty_manifest_err() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# only comments").unwrap();
        assert!(read_condition_manifest(file.path()).is_err());
    }
}
