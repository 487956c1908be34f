use crate::signal::Molecule;
use crate::utils::Result;

/// A raw-sample range `[start, end)` attributed to one basecalled base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Basecaller move metadata mapping raw-sample blocks to emitted bases.
///
/// `boundaries[b]` is the sample index where base `b`'s signal starts,
/// already scaled by the stride and shifted past the trimmed adapter
/// samples; a final entry holds the total sample count so the last base
/// is bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTable {
    boundaries: Vec<usize>,
}

impl MoveTable {
    /// Builds a table from the raw `mv` tag payload: a sample stride and
    /// one flag per sample block, non-zero where a block starts a new
    /// base. `trim_offset` (`ts` tag) is the count of adapter samples
    /// preceding the first block; `num_samples` (`ns` tag) is the total
    /// length of the trimmed signal.
    pub fn new(
        stride: usize,
        moves: &[u8],
        trim_offset: usize,
        num_samples: usize,
    ) -> Result<Self> {
        if stride == 0 {
            return Err("Move table stride must be positive".to_string());
        }

        let mut boundaries: Vec<usize> = moves
            .iter()
            .enumerate()
            .filter(|(_, &flag)| flag != 0)
            .map(|(block, _)| block * stride + trim_offset)
            .collect();

        if boundaries.is_empty() {
            return Err("Move table marks no base boundaries".to_string());
        }

        let last = *boundaries.last().unwrap();
        if last >= num_samples {
            return Err(format!(
                "Move table boundary {} exceeds signal of {} samples",
                last, num_samples
            ));
        }

        boundaries.push(num_samples);
        Ok(Self { boundaries })
    }

    pub fn num_bases(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// The sample range of one base. RNA is sequenced 3'→5', so its move
    /// table is walked from the far end to line up with the alignment
    /// coordinate system.
    pub fn sample_range(&self, base_index: usize, molecule: Molecule) -> Result<SampleRange> {
        let num_bases = self.num_bases();
        if base_index >= num_bases {
            return Err(format!(
                "Base index {} out of range for move table of {} bases",
                base_index, num_bases
            ));
        }

        let slot = match molecule {
            Molecule::Dna => base_index,
            Molecule::Rna => num_bases - 1 - base_index,
        };

        Ok(SampleRange {
            start: self.boundaries[slot],
            end: self.boundaries[slot + 1],
        })
    }
}
