use super::build_store;
use crate::cli::ClusterArgs;
use crate::gmm::{fit_conditions, GmmConfig, Preprocess};
use crate::utils::Result;
use itertools::Itertools;
use std::io::{BufWriter, Write};

/// Fits one Gaussian mixture over the per-read (stat1, stat2) points of
/// every manifest condition and writes components and assignments to
/// stdout.
pub fn cluster(args: ClusterArgs) -> Result<()> {
    let store = build_store(&args.input)?;

    let config = GmmConfig {
        components: args.components,
        covariance: args.covariance,
        max_iters: args.max_iters,
        tol: args.tol,
        seed: args.seed,
        ..GmmConfig::default()
    };
    let preprocess = Preprocess {
        standardize: args.standardize,
        feature_scale: None,
    };

    let labels = store.labels().iter().map(|s| s.to_string()).collect_vec();
    let fit = fit_conditions(
        &store,
        &labels,
        &args.stat1,
        &args.stat2,
        args.cluster_window,
        &config,
        &preprocess,
    )?;

    log::info!(
        "Fitted {} components over {} reads in {} iterations (log-likelihood {:.4})",
        fit.components.len(),
        fit.assignments.len(),
        fit.iterations,
        fit.log_likelihood
    );
    if let Some(standardization) = &fit.standardization {
        log::info!(
            "Standardized features: center ({:.4}, {:.4}), scale ({:.4}, {:.4})",
            standardization.center[0],
            standardization.center[1],
            standardization.scale[0],
            standardization.scale[1]
        );
    }

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    writeln!(
        writer,
        "#component\tweight\tmean_{}\tmean_{}\tcov00\tcov01\tcov11",
        args.stat1.name(),
        args.stat2.name()
    )
    .map_err(|e| e.to_string())?;
    for (index, component) in fit.components.iter().enumerate() {
        writeln!(
            writer,
            "#{}\t{:.4}\t{:.4}\t{:.4}\t{:.6}\t{:.6}\t{:.6}",
            index,
            component.weight,
            component.mean[0],
            component.mean[1],
            component.cov[0][0],
            component.cov[0][1],
            component.cov[1][1]
        )
        .map_err(|e| e.to_string())?;
    }

    writeln!(writer, "condition\tread_id\tcomponent").map_err(|e| e.to_string())?;
    for assignment in &fit.assignments {
        writeln!(
            writer,
            "{}\t{}\t{}",
            assignment.condition, assignment.read_id, assignment.component
        )
        .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
