mod aggregate;
mod moments;
mod reducers;

pub use aggregate::{window_stat_per_read, OffsetStat, StatTable, StatsAggregator};
pub use reducers::{Statistic, BUILTIN_NAMES};
