use super::build_store;
use crate::cli::StatsArgs;
use crate::stats::StatsAggregator;
use crate::utils::Result;
use itertools::Itertools;
use std::io::{BufWriter, Write};

/// Writes one TSV row per (condition, statistic, window offset) to
/// stdout. Undefined aggregates are reported as `NA`, never as NaN.
pub fn stats(args: StatsArgs) -> Result<()> {
    let store = build_store(&args.input)?;
    let mut aggregator = StatsAggregator::new();

    log::info!(
        "Reporting {} over {} conditions",
        args.stats.iter().map(|s| s.name()).join(", "),
        store.len()
    );

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    writeln!(writer, "condition\tposition\toffset\tstat\treads\tvalue")
        .map_err(|e| e.to_string())?;

    for condition in store.iter() {
        let half = condition.params.half_window();
        for stat in &args.stats {
            let table = aggregator.table(condition, stat);
            for (slot, offset_stat) in table.offsets.iter().enumerate() {
                let offset = slot as i64 - half;
                let value = offset_stat
                    .aggregate
                    .map_or("NA".to_string(), |v| format!("{:.4}", v));
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    condition.label(),
                    condition.site.position + offset + 1,
                    offset,
                    table.stat,
                    offset_stat.values.len(),
                    value
                )
                .map_err(|e| e.to_string())?;
            }
        }
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
