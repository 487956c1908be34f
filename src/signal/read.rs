//! Adapter between alignment records and the extraction engine.

use crate::signal::cigar::{CigarOp, CigarOpExt};
use crate::signal::moves::MoveTable;
use crate::utils::Result;
use rust_htslib::bam::{self, ext::BamRecordExtensions, record::Aux};
use std::str;

/// A single basecalled read taken from an alignment record, together
/// with the move-table metadata needed to locate its raw-signal samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRead {
    /// Unique identifier for the read.
    pub id: String,
    /// Alignment start on the reference contig.
    pub ref_start: i64,
    /// Ordered alignment operations against the reference.
    pub ops: Vec<CigarOp>,
    /// Basecalled sequence, soft-clipped bases included.
    pub seq: Vec<u8>,
    /// Per-base raw-sample boundaries.
    pub moves: MoveTable,
}

impl AlignedRead {
    /// Creates an `AlignedRead` from an HTSlib record carrying the
    /// basecaller `mv`, `ts`, and `ns` tags.
    pub fn from_hts_rec(rec: &bam::Record) -> Result<AlignedRead> {
        let id = str::from_utf8(rec.qname()).unwrap().to_string();
        if rec.is_unmapped() {
            return Err(format!("Read {} is unmapped", id));
        }

        let seq = rec.seq().as_bytes();
        let ops = rec.cigar().take().to_vec();
        let query_len: i64 = ops.iter().map(CigarOpExt::query_len).sum();
        if query_len != seq.len() as i64 {
            return Err(format!(
                "Read {}: alignment covers {} bases but sequence has {}",
                id,
                query_len,
                seq.len()
            ));
        }

        let (stride, moves) =
            get_mv_tag(rec).ok_or_else(|| format!("Read {} has no usable mv tag", id))?;
        let trim_offset = get_int_tag(rec, b"ts")
            .ok_or_else(|| format!("Read {} has no valid ts tag", id))?;
        let num_samples = get_int_tag(rec, b"ns")
            .ok_or_else(|| format!("Read {} has no valid ns tag", id))?;

        let moves = MoveTable::new(stride, &moves, trim_offset as usize, num_samples as usize)
            .map_err(|e| format!("Read {}: {}", id, e))?;

        if moves.num_bases() != seq.len() {
            return Err(format!(
                "Read {}: move table covers {} bases but sequence has {}",
                id,
                moves.num_bases(),
                seq.len()
            ));
        }

        Ok(AlignedRead {
            id,
            ref_start: rec.reference_start(),
            ops,
            seq,
            moves,
        })
    }

    /// One past the last reference position covered by the alignment.
    pub fn ref_end(&self) -> i64 {
        self.ref_start + self.ops.iter().map(CigarOpExt::ref_len).sum::<i64>()
    }
}

/// Retrieves the basecaller move table from the `mv` tag: the first
/// array entry is the sample stride, the rest are per-block flags.
fn get_mv_tag(rec: &bam::Record) -> Option<(usize, Vec<u8>)> {
    let values: Vec<u8> = match rec.aux(b"mv") {
        Ok(Aux::ArrayU8(values)) => values.iter().collect(),
        Ok(Aux::ArrayI8(values)) => values.iter().map(|v| v as u8).collect(),
        _ => return None,
    };
    if values.len() < 2 {
        return None;
    }
    Some((values[0] as usize, values[1..].to_vec()))
}

/// Retrieves a non-negative integer tag of any integral width.
fn get_int_tag(rec: &bam::Record, tag: &[u8]) -> Option<i64> {
    let value = match rec.aux(tag) {
        Ok(Aux::I8(value)) => i64::from(value),
        Ok(Aux::U8(value)) => i64::from(value),
        Ok(Aux::I16(value)) => i64::from(value),
        Ok(Aux::U16(value)) => i64::from(value),
        Ok(Aux::I32(value)) => i64::from(value),
        Ok(Aux::U32(value)) => i64::from(value),
        _ => return None,
    };
    (value >= 0).then_some(value)
}
