pub type CigarOp = rust_htslib::bam::record::Cigar;

pub trait CigarOpExt {
    fn ref_len(&self) -> i64;
    fn query_len(&self) -> i64;
}

impl CigarOpExt for CigarOp {
    fn ref_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::RefSkip(len)
            | CigarOp::Del(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len) => *len as i64,
            CigarOp::Ins(_) | CigarOp::SoftClip(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }

    fn query_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len)
            | CigarOp::Ins(len)
            | CigarOp::SoftClip(len) => *len as i64,
            CigarOp::RefSkip(_) | CigarOp::Del(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }
}

/// Outcome of translating a reference coordinate into a read-base index.
///
/// `indels_before` counts the insertion/deletion operations traversed
/// between the alignment start and the target; differencing these counts
/// across a window detects indels strictly inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The target is covered by a base of the read; `index` points into
    /// the full basecalled sequence (soft-clipped bases included).
    Base { index: usize, indels_before: usize },
    /// The target falls inside a deletion or reference skip.
    Deletion { indels_before: usize },
    /// The target lies outside the read's aligned span.
    NotCovered,
}

impl Resolution {
    pub fn is_covered(&self) -> bool {
        matches!(self, Resolution::Base { .. })
    }
}

/// Translates a reference coordinate into a read-base index by walking
/// the alignment operations of a read starting at `ref_start`.
pub fn resolve_read_index(ops: &[CigarOp], ref_start: i64, target: i64) -> Resolution {
    if target < ref_start {
        return Resolution::NotCovered;
    }

    let mut ref_pos = ref_start;
    let mut read_pos: usize = 0;
    let mut indels: usize = 0;

    for op in ops {
        match *op {
            CigarOp::Match(len) | CigarOp::Equal(len) | CigarOp::Diff(len) => {
                if target < ref_pos + len as i64 {
                    return Resolution::Base {
                        index: read_pos + (target - ref_pos) as usize,
                        indels_before: indels,
                    };
                }
                ref_pos += len as i64;
                read_pos += len as usize;
            }
            CigarOp::Ins(len) => {
                read_pos += len as usize;
                indels += 1;
            }
            CigarOp::Del(len) | CigarOp::RefSkip(len) => {
                if target < ref_pos + len as i64 {
                    return Resolution::Deletion {
                        indels_before: indels,
                    };
                }
                ref_pos += len as i64;
                indels += 1;
            }
            CigarOp::SoftClip(len) => read_pos += len as usize,
            CigarOp::HardClip(_) | CigarOp::Pad(_) => {}
        }
    }

    Resolution::NotCovered
}

#[cfg(test)]
mod tests {
    use super::*;

    // Re-derives the reference coordinate of a read-base index.
    fn ref_coord_of_index(ops: &[CigarOp], ref_start: i64, index: usize) -> Option<i64> {
        let mut ref_pos = ref_start;
        let mut read_pos: usize = 0;
        for op in ops {
            match *op {
                CigarOp::Match(len) | CigarOp::Equal(len) | CigarOp::Diff(len) => {
                    if index < read_pos + len as usize {
                        return Some(ref_pos + (index - read_pos) as i64);
                    }
                    ref_pos += len as i64;
                    read_pos += len as usize;
                }
                CigarOp::Ins(len) | CigarOp::SoftClip(len) => read_pos += len as usize,
                CigarOp::Del(len) | CigarOp::RefSkip(len) => ref_pos += len as i64,
                CigarOp::HardClip(_) | CigarOp::Pad(_) => {}
            }
        }
        None
    }

    #[test]
    fn test_op_lengths() {
        assert_eq!(CigarOp::Match(10).ref_len(), 10);
        assert_eq!(CigarOp::Ins(5).ref_len(), 0);
        assert_eq!(CigarOp::Del(3).ref_len(), 3);
        assert_eq!(CigarOp::SoftClip(2).ref_len(), 0);
        assert_eq!(CigarOp::Match(10).query_len(), 10);
        assert_eq!(CigarOp::Ins(5).query_len(), 5);
        assert_eq!(CigarOp::Del(3).query_len(), 0);
        assert_eq!(CigarOp::SoftClip(2).query_len(), 2);
    }

    #[test]
    fn resolve_plain_match() {
        let ops = vec![CigarOp::Match(10)];
        assert_eq!(
            resolve_read_index(&ops, 100, 100),
            Resolution::Base {
                index: 0,
                indels_before: 0
            }
        );
        assert_eq!(
            resolve_read_index(&ops, 100, 109),
            Resolution::Base {
                index: 9,
                indels_before: 0
            }
        );
        assert_eq!(resolve_read_index(&ops, 100, 110), Resolution::NotCovered);
        assert_eq!(resolve_read_index(&ops, 100, 99), Resolution::NotCovered);
    }

    #[test]
    fn resolve_skips_soft_clip_in_reference_accounting() {
        let ops = vec![CigarOp::SoftClip(4), CigarOp::Match(6)];
        assert_eq!(
            resolve_read_index(&ops, 50, 52),
            Resolution::Base {
                index: 6,
                indels_before: 0
            }
        );
    }

    #[test]
    fn resolve_insertion_shifts_read_cursor() {
        let ops = vec![CigarOp::Match(3), CigarOp::Ins(2), CigarOp::Match(3)];
        assert_eq!(
            resolve_read_index(&ops, 0, 2),
            Resolution::Base {
                index: 2,
                indels_before: 0
            }
        );
        assert_eq!(
            resolve_read_index(&ops, 0, 3),
            Resolution::Base {
                index: 5,
                indels_before: 1
            }
        );
    }

    #[test]
    fn resolve_target_on_deletion_not_covered() {
        let ops = vec![CigarOp::Match(3), CigarOp::Del(2), CigarOp::Match(3)];
        assert_eq!(
            resolve_read_index(&ops, 10, 13),
            Resolution::Deletion { indels_before: 0 }
        );
        assert_eq!(
            resolve_read_index(&ops, 10, 15),
            Resolution::Base {
                index: 3,
                indels_before: 1
            }
        );
    }

    #[test]
    fn resolve_round_trips_for_covered_targets() {
        let ops = vec![
            CigarOp::SoftClip(5),
            CigarOp::Match(4),
            CigarOp::Ins(2),
            CigarOp::Match(3),
            CigarOp::Del(2),
            CigarOp::Match(6),
            CigarOp::SoftClip(3),
        ];
        let ref_start = 1000;
        for target in 1000..1015 {
            if let Resolution::Base { index, .. } = resolve_read_index(&ops, ref_start, target) {
                assert_eq!(ref_coord_of_index(&ops, ref_start, index), Some(target));
            }
        }
    }
}
