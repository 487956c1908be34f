use super::reducers::Statistic;
use crate::store::Condition;
use std::collections::HashMap;

/// Per-offset statistic values: one scalar per read with a usable
/// segment, plus the cross-read aggregate (the same reducer applied to
/// the per-read scalars; `None` when undefined).
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetStat {
    /// (trace index, per-read value) pairs, in trace order.
    pub values: Vec<(usize, f32)>,
    pub aggregate: Option<f32>,
}

/// One statistic evaluated across every window offset of a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub stat: String,
    pub offsets: Vec<OffsetStat>,
}

/// Caches statistic tables per (condition identity, statistic name).
/// Condition identities are unique per add, so replacing a condition
/// can never serve a stale table; removal should still be followed by
/// `invalidate` to release the entries.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    cache: HashMap<(u64, String), StatTable>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&mut self, condition: &Condition, stat: &Statistic) -> &StatTable {
        self.cache
            .entry((condition.id(), stat.name().to_string()))
            .or_insert_with(|| compute_table(condition, stat))
    }

    pub fn invalidate(&mut self, condition_id: u64) {
        self.cache.retain(|(id, _), _| *id != condition_id);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn num_cached(&self) -> usize {
        self.cache.len()
    }
}

fn compute_table(condition: &Condition, stat: &Statistic) -> StatTable {
    let window = condition.params.window();
    let mut offsets = Vec::with_capacity(window);

    for slot in 0..window {
        let mut values = Vec::new();
        for (index, trace) in condition.traces.iter().enumerate() {
            let Some(segment) = &trace.segments[slot] else {
                continue;
            };
            if let Some(value) = stat.apply(&segment.samples) {
                values.push((index, value));
            }
        }
        let pool: Vec<f32> = values.iter().map(|(_, value)| *value).collect();
        let aggregate = stat.apply(&pool);
        offsets.push(OffsetStat { values, aggregate });
    }

    StatTable {
        stat: stat.name().to_string(),
        offsets,
    }
}

/// One scalar per read, reduced over the read's whole (optionally
/// narrowed) window signal. This is the per-read granularity consumed by
/// the mixture engine; it is not cached.
pub fn window_stat_per_read(
    condition: &Condition,
    stat: &Statistic,
    window: Option<usize>,
) -> Vec<(usize, f32)> {
    condition
        .traces
        .iter()
        .enumerate()
        .filter_map(|(index, trace)| {
            let signal = trace.window_signal(window);
            if signal.is_empty() {
                return None;
            }
            stat.apply(&signal).map(|value| (index, value))
        })
        .collect()
}
