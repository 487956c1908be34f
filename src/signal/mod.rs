mod cigar;
mod extract;
mod moves;
mod read;
mod source;

pub use cigar::{resolve_read_index, CigarOp, CigarOpExt, Resolution};
pub use extract::{extract_window, ExtractionReport, ReadTrace, Segment, WindowParams};
pub use moves::{MoveTable, SampleRange};
pub use read::AlignedRead;
pub use source::{SignalSource, SignalTable};

use std::str::FromStr;

/// Sequenced molecule type. RNA is sequenced 3'→5' relative to the
/// alignment coordinate system, which flips the move-table traversal
/// direction for the whole condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Molecule {
    Dna,
    Rna,
}

impl FromStr for Molecule {
    type Err = &'static str;
    fn from_str(molecule: &str) -> Result<Self, Self::Err> {
        match molecule {
            "dna" | "DNA" => Ok(Molecule::Dna),
            "rna" | "RNA" => Ok(Molecule::Rna),
            _ => Err("Invalid molecule type (expected dna or rna)"),
        }
    }
}
