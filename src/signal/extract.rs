use crate::signal::cigar::{resolve_read_index, Resolution};
use crate::signal::moves::SampleRange;
use crate::signal::read::AlignedRead;
use crate::signal::source::SignalSource;
use crate::signal::Molecule;
use crate::utils::{make_odd, Result};
use std::collections::HashSet;

/// Per-condition extraction parameters. The window size is forced to the
/// nearest larger odd value so the target sits at the center offset.
#[derive(Debug, Clone)]
pub struct WindowParams {
    window: usize,
    pub molecule: Molecule,
    pub exclude_indels: bool,
    pub matched_base: Option<u8>,
    pub read_ids: Option<HashSet<String>>,
    pub max_reads: Option<usize>,
}

impl WindowParams {
    pub fn new(window: usize, molecule: Molecule) -> Self {
        Self {
            window: make_odd(window),
            molecule,
            exclude_indels: false,
            matched_base: None,
            read_ids: None,
            max_reads: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn half_window(&self) -> i64 {
        ((self.window - 1) / 2) as i64
    }
}

/// Raw-signal samples attributed to one base at one window offset.
/// Sample values are stored in genomic orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub range: SampleRange,
    pub samples: Vec<f32>,
}

/// One read's window: a segment slot per window offset, `None` where the
/// read does not cover the offset or its metadata is inconsistent there.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadTrace {
    pub read_id: String,
    pub segments: Vec<Option<Segment>>,
    pub has_indel: bool,
}

impl ReadTrace {
    /// Concatenated samples over the central `window` offsets (all
    /// offsets when `None`), skipping missing slots.
    pub fn window_signal(&self, window: Option<usize>) -> Vec<f32> {
        let full = self.segments.len();
        let take = window.map_or(full, |w| make_odd(w).min(full));
        let skip = (full - take) / 2;
        self.segments
            .iter()
            .skip(skip)
            .take(take)
            .flatten()
            .flat_map(|segment| segment.samples.iter().copied())
            .collect()
    }

    pub fn num_covered(&self) -> usize {
        self.segments.iter().flatten().count()
    }
}

/// Per-filter exclusion tally for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub considered: usize,
    pub not_in_allowlist: usize,
    pub base_mismatch: usize,
    pub with_indels: usize,
    pub no_signal: usize,
    pub not_covered: usize,
    pub accepted: usize,
}

impl std::fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "considered {} reads, accepted {} (excluded: allowlist {}, base mismatch {}, indels {}, no signal {}, not covered {})",
            self.considered,
            self.accepted,
            self.not_in_allowlist,
            self.base_mismatch,
            self.with_indels,
            self.no_signal,
            self.not_covered
        )
    }
}

/// Extracts one `ReadTrace` per accepted read for the window centered on
/// `target`. Reads are processed in ascending read-identifier order and
/// the `max_reads` cap counts accepted reads only, so a requested cap
/// yields exactly that many filtered reads when available.
pub fn extract_window(
    mut reads: Vec<AlignedRead>,
    signals: &mut dyn SignalSource,
    target: i64,
    params: &WindowParams,
) -> Result<(Vec<ReadTrace>, ExtractionReport)> {
    reads.sort_by(|a, b| a.id.cmp(&b.id));

    let half = params.half_window();
    let mut traces = Vec::new();
    let mut report = ExtractionReport::default();

    for read in &reads {
        if params.max_reads.is_some_and(|cap| traces.len() >= cap) {
            break;
        }
        report.considered += 1;

        if let Some(ids) = &params.read_ids {
            if !ids.contains(&read.id) {
                report.not_in_allowlist += 1;
                continue;
            }
        }

        if let Some(expected) = params.matched_base {
            let found = match resolve_read_index(&read.ops, read.ref_start, target) {
                Resolution::Base { index, .. } => read.seq.get(index).copied(),
                _ => None,
            };
            if found.map(|b| b.to_ascii_uppercase()) != Some(expected.to_ascii_uppercase()) {
                report.base_mismatch += 1;
                continue;
            }
        }

        if read.ref_start > target + half || read.ref_end() <= target - half {
            report.not_covered += 1;
            continue;
        }

        let resolutions: Vec<Resolution> = (-half..=half)
            .map(|offset| resolve_read_index(&read.ops, read.ref_start, target + offset))
            .collect();

        let has_indel = window_has_indel(&resolutions);
        if params.exclude_indels && has_indel {
            report.with_indels += 1;
            continue;
        }

        let samples = match signals.signal(&read.id)? {
            Some(samples) => samples,
            None => {
                report.no_signal += 1;
                continue;
            }
        };

        let segments = build_segments(read, &resolutions, &samples, params.molecule);
        if segments.iter().all(Option::is_none) {
            report.not_covered += 1;
            continue;
        }

        traces.push(ReadTrace {
            read_id: read.id.clone(),
            segments,
            has_indel,
        });
        report.accepted += 1;
    }

    Ok((traces, report))
}

/// A window contains an indel when an offset falls in a deletion, or
/// when the traversed-indel counts of the outermost resolvable offsets
/// differ (an insertion strictly inside the window).
fn window_has_indel(resolutions: &[Resolution]) -> bool {
    let mut min_indels = usize::MAX;
    let mut max_indels = 0;

    for resolution in resolutions {
        match resolution {
            Resolution::Deletion { .. } => return true,
            Resolution::Base { indels_before, .. } => {
                min_indels = min_indels.min(*indels_before);
                max_indels = max_indels.max(*indels_before);
            }
            Resolution::NotCovered => {}
        }
    }

    min_indels != usize::MAX && max_indels > min_indels
}

fn build_segments(
    read: &AlignedRead,
    resolutions: &[Resolution],
    samples: &[f32],
    molecule: Molecule,
) -> Vec<Option<Segment>> {
    resolutions
        .iter()
        .map(|resolution| {
            let index = match resolution {
                Resolution::Base { index, .. } => *index,
                _ => return None,
            };

            let range = match read.moves.sample_range(index, molecule) {
                Ok(range) => range,
                Err(msg) => {
                    log::warn!("Read {}: {}", read.id, msg);
                    return None;
                }
            };

            if range.is_empty() || range.end > samples.len() {
                log::warn!(
                    "Read {}: sample range {}..{} outside signal of {} samples",
                    read.id,
                    range.start,
                    range.end,
                    samples.len()
                );
                return None;
            }

            let mut segment = samples[range.start..range.end].to_vec();
            if molecule == Molecule::Rna {
                segment.reverse();
            }
            Some(Segment {
                range,
                samples: segment,
            })
        })
        .collect()
}
