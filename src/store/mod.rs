//! Owns every condition extracted in a session. One store per session,
//! passed by reference to the statistics and mixture engines; no global
//! state.

use crate::signal::{
    extract_window, AlignedRead, ExtractionReport, ReadTrace, SignalSource, SignalTable,
    WindowParams,
};
use crate::utils::{open_bam_reader, GenomicSite, Result};
use rust_htslib::bam::{Read, Record};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl FromStr for LineStyle {
    type Err = &'static str;
    fn from_str(style: &str) -> std::result::Result<Self, Self::Err> {
        match style {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            "dashdot" => Ok(LineStyle::DashDot),
            _ => Err("Invalid line style"),
        }
    }
}

/// Display metadata consumed only by rendering layers; the engine never
/// reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayStyle {
    pub color: Option<String>,
    pub opacity: Option<f32>,
    pub line_width: Option<f32>,
    pub line_style: Option<LineStyle>,
}

/// One labeled unit of extracted data: the traces of every accepted read
/// at one (alignment file, signal file, site) combination.
#[derive(Debug, Clone)]
pub struct Condition {
    label: String,
    id: u64,
    pub site: GenomicSite,
    pub traces: Vec<ReadTrace>,
    pub report: ExtractionReport,
    pub params: WindowParams,
    pub aln_path: PathBuf,
    pub signal_path: PathBuf,
    pub style: DisplayStyle,
}

impl Condition {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Identity used to key derived-statistic caches; unique per add, so
    /// a re-added label never aliases a stale cache entry.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn num_reads(&self) -> usize {
        self.traces.len()
    }
}

#[derive(Debug, Default)]
pub struct ConditionStore {
    conditions: Vec<Condition>,
    signal_cache: HashMap<PathBuf, SignalTable>,
    next_id: u64,
}

impl ConditionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the extraction pipeline for one (alignment file, signal
    /// file, site) combination and stores the result. Fails without
    /// touching the store when the label is already present.
    pub fn add_condition(
        &mut self,
        label: Option<&str>,
        aln_path: &Path,
        signal_path: &Path,
        site: GenomicSite,
        params: WindowParams,
        style: DisplayStyle,
    ) -> Result<&Condition> {
        let label = label.map(str::to_string).unwrap_or_else(|| site.label());
        self.check_unique(&label)?;

        let reads = fetch_reads(aln_path, &site, &params)?;
        log::debug!(
            "{}: fetched {} reads from {}",
            label,
            reads.len(),
            aln_path.display()
        );

        if !self.signal_cache.contains_key(signal_path) {
            let table = SignalTable::from_path(signal_path)?;
            self.signal_cache.insert(signal_path.to_path_buf(), table);
        }
        let signals = self.signal_cache.get_mut(signal_path).unwrap();

        let (traces, report) = extract_window(reads, signals, site.position, &params)?;
        log::info!("{}: {}", label, report);

        Ok(self.push(label, site, traces, report, params, aln_path, signal_path, style))
    }

    /// File-free entry point: extracts from already-adapted reads and an
    /// arbitrary signal source. Used by callers that own their container
    /// handles (and by tests).
    pub fn add_extracted(
        &mut self,
        label: Option<&str>,
        site: GenomicSite,
        reads: Vec<AlignedRead>,
        signals: &mut dyn SignalSource,
        params: WindowParams,
        style: DisplayStyle,
    ) -> Result<&Condition> {
        let label = label.map(str::to_string).unwrap_or_else(|| site.label());
        self.check_unique(&label)?;

        let (traces, report) = extract_window(reads, signals, site.position, &params)?;
        log::info!("{}: {}", label, report);

        Ok(self.push(
            label,
            site,
            traces,
            report,
            params,
            Path::new(""),
            Path::new(""),
            style,
        ))
    }

    /// Replaces display metadata only; extraction parameters are fixed
    /// at add time and changing them requires remove + re-add.
    pub fn update_condition(&mut self, label: &str, style: DisplayStyle) -> Result<()> {
        let condition = self
            .conditions
            .iter_mut()
            .find(|c| c.label == label)
            .ok_or_else(|| format!("Unknown condition label: {}", label))?;
        condition.style = style;
        Ok(())
    }

    /// Removes one condition, returning its identity so callers can
    /// invalidate derived-statistic caches.
    pub fn remove_condition(&mut self, label: &str) -> Result<u64> {
        let index = self
            .conditions
            .iter()
            .position(|c| c.label == label)
            .ok_or_else(|| format!("Unknown condition label: {}", label))?;
        Ok(self.conditions.remove(index).id)
    }

    /// Removes every condition, returning the removed identities.
    pub fn clear(&mut self) -> Vec<u64> {
        self.conditions.drain(..).map(|c| c.id).collect()
    }

    pub fn get(&self, label: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.conditions.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn check_unique(&self, label: &str) -> Result<()> {
        if self.conditions.iter().any(|c| c.label == label) {
            return Err(format!("Duplicate condition label: {}", label));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        label: String,
        site: GenomicSite,
        traces: Vec<ReadTrace>,
        report: ExtractionReport,
        params: WindowParams,
        aln_path: &Path,
        signal_path: &Path,
        style: DisplayStyle,
    ) -> &Condition {
        let id = self.next_id;
        self.next_id += 1;
        self.conditions.push(Condition {
            label,
            id,
            site,
            traces,
            report,
            params,
            aln_path: aln_path.to_path_buf(),
            signal_path: signal_path.to_path_buf(),
            style,
        });
        self.conditions.last().unwrap()
    }
}

fn fetch_reads(
    aln_path: &Path,
    site: &GenomicSite,
    params: &WindowParams,
) -> Result<Vec<AlignedRead>> {
    let mut bam = open_bam_reader(aln_path)?;
    let half = params.half_window();
    let start = (site.position - half).max(0);
    let end = site.position + half + 1;

    let mut reads = Vec::new();
    if let Err(msg) = bam.fetch((site.contig.as_str(), start, end)) {
        log::warn!("Fetch error: {}", msg);
        return Ok(reads);
    }

    let mut record = Record::new();
    while let Some(result) = bam.read(&mut record) {
        match result {
            Ok(_) => {
                if record.is_supplementary() || record.is_secondary() || record.is_unmapped() {
                    continue;
                }
                match AlignedRead::from_hts_rec(&record) {
                    Ok(read) => reads.push(read),
                    Err(msg) => log::warn!("Skipping read: {}", msg),
                }
            }
            Err(err) => Err(err.to_string())?,
        }
    }

    Ok(reads)
}
