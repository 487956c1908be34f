//! Gaussian-mixture clustering of per-read summary statistics.

mod em;

use crate::stats::{window_stat_per_read, Statistic};
use crate::store::ConditionStore;
use crate::utils::Result;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovarianceKind {
    Full,
    Diagonal,
}

impl FromStr for CovarianceKind {
    type Err = &'static str;
    fn from_str(kind: &str) -> std::result::Result<Self, Self::Err> {
        match kind {
            "full" => Ok(CovarianceKind::Full),
            "diag" | "diagonal" => Ok(CovarianceKind::Diagonal),
            _ => Err("Invalid covariance kind (expected full or diag)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GmmConfig {
    pub components: usize,
    pub covariance: CovarianceKind,
    pub max_iters: usize,
    pub tol: f64,
    pub reg_covar: f64,
    pub seed: u64,
}

impl Default for GmmConfig {
    fn default() -> Self {
        Self {
            components: 2,
            covariance: CovarianceKind::Full,
            max_iters: 200,
            tol: 1e-3,
            reg_covar: 1e-6,
            seed: 0,
        }
    }
}

/// Feature preprocessing applied to the gathered point cloud before the
/// fit: standardization over the pool, then optional per-feature scaling.
#[derive(Debug, Clone, Default)]
pub struct Preprocess {
    pub standardize: bool,
    pub feature_scale: Option<[f64; 2]>,
}

/// Standardization parameters actually applied, reported so consumers
/// can map component parameters back to signal units.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardization {
    pub center: [f64; 2],
    pub scale: [f64; 2],
}

#[derive(Debug, Clone)]
pub struct GmmComponent {
    pub weight: f64,
    pub mean: [f64; 2],
    pub cov: [[f64; 2]; 2],
}

/// Cluster assignment of one read's (stat1, stat2) point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub condition: String,
    pub read_id: String,
    pub component: usize,
}

#[derive(Debug, Clone)]
pub struct GmmFit {
    pub components: Vec<GmmComponent>,
    pub standardization: Option<Standardization>,
    pub assignments: Vec<Assignment>,
    pub converged: bool,
    pub iterations: usize,
    pub log_likelihood: f64,
}

/// Gathers one `(stat1, stat2)` point per valid read across the selected
/// conditions and fits a Gaussian mixture to the pool.
///
/// Fails when fewer points than components are available. Hitting the
/// iteration cap is degraded, not fatal: the best iterate is returned
/// with `converged = false` and a warning is logged.
pub fn fit_conditions(
    store: &ConditionStore,
    labels: &[String],
    stat1: &Statistic,
    stat2: &Statistic,
    window: Option<usize>,
    config: &GmmConfig,
    preprocess: &Preprocess,
) -> Result<GmmFit> {
    if config.components == 0 {
        return Err("Mixture must have at least one component".to_string());
    }

    let mut points: Vec<[f64; 2]> = Vec::new();
    let mut keys: Vec<(String, String)> = Vec::new();

    for label in labels {
        let condition = store
            .get(label)
            .ok_or_else(|| format!("Unknown condition label: {}", label))?;
        let first = window_stat_per_read(condition, stat1, window);
        let second: HashMap<usize, f32> = window_stat_per_read(condition, stat2, window)
            .into_iter()
            .collect();

        for (index, x) in first {
            if let Some(y) = second.get(&index) {
                points.push([x as f64, *y as f64]);
                keys.push((label.clone(), condition.traces[index].read_id.clone()));
            }
        }
    }

    if points.len() < config.components {
        return Err(format!(
            "Insufficient data: {} reads for {} mixture components",
            points.len(),
            config.components
        ));
    }

    let standardization = preprocess.standardize.then(|| standardize(&mut points));
    if let Some(scale) = preprocess.feature_scale {
        for point in &mut points {
            point[0] *= scale[0];
            point[1] *= scale[1];
        }
    }

    let fit = em::fit(&points, config);
    if !fit.converged {
        log::warn!(
            "Mixture fit did not converge within {} iterations",
            config.max_iters
        );
    }

    let assignments = keys
        .into_iter()
        .zip(&fit.labels)
        .map(|((condition, read_id), &component)| Assignment {
            condition,
            read_id,
            component,
        })
        .collect();

    Ok(GmmFit {
        components: fit.components,
        standardization,
        assignments,
        converged: fit.converged,
        iterations: fit.iterations,
        log_likelihood: fit.log_likelihood,
    })
}

/// Centers each feature on its pooled mean and divides by its pooled
/// population standard deviation (floored to stay finite on constant
/// features).
fn standardize(points: &mut [[f64; 2]]) -> Standardization {
    const EPS: f64 = 1e-9;
    let n = points.len() as f64;

    let mut center = [0.0; 2];
    for point in points.iter() {
        center[0] += point[0];
        center[1] += point[1];
    }
    center[0] /= n;
    center[1] /= n;

    let mut scale = [0.0; 2];
    for point in points.iter() {
        scale[0] += (point[0] - center[0]).powi(2);
        scale[1] += (point[1] - center[1]).powi(2);
    }
    scale[0] = (scale[0] / n).sqrt().max(EPS);
    scale[1] = (scale[1] / n).sqrt().max(EPS);

    for point in points.iter_mut() {
        point[0] = (point[0] - center[0]) / scale[0];
        point[1] = (point[1] - center[1]) / scale[1];
    }

    Standardization { center, scale }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{AlignedRead, CigarOp, Molecule, MoveTable, SignalTable, WindowParams};
    use crate::store::DisplayStyle;
    use crate::utils::GenomicSite;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const NUM_BASES: usize = 9;
    const SAMPLES_PER_BASE: usize = 4;

    fn cluster_read(index: usize, rng: &mut StdRng, level: f32, noise: f32) -> (AlignedRead, Vec<f32>) {
        let moves: Vec<u8> = std::iter::repeat([1, 0, 0, 0])
            .take(NUM_BASES)
            .flatten()
            .collect();
        let read = AlignedRead {
            id: format!("read-{:03}", index),
            ref_start: 100,
            ops: vec![CigarOp::Match(NUM_BASES as u32)],
            seq: vec![b'A'; NUM_BASES],
            moves: MoveTable::new(1, &moves, 0, NUM_BASES * SAMPLES_PER_BASE).unwrap(),
        };
        let samples = (0..NUM_BASES * SAMPLES_PER_BASE)
            .map(|s| {
                let jitter = (rng.random::<f32>() - 0.5) * 2.0 * noise;
                if s % 2 == 0 {
                    level + noise + jitter * 0.1
                } else {
                    level - noise + jitter * 0.1
                }
            })
            .collect();
        (read, samples)
    }

    fn two_cluster_store() -> ConditionStore {
        let mut rng = StdRng::seed_from_u64(7);
        let mut reads = Vec::new();
        let mut signals = SignalTable::new();
        // Cluster 0: mean ≈ 80, spread ≈ 2; cluster 1: mean ≈ 120, spread ≈ 8.
        for i in 0..30 {
            let (read, samples) = cluster_read(i, &mut rng, 80.0, 2.0);
            signals.insert(read.id.clone(), samples);
            reads.push(read);
        }
        for i in 30..60 {
            let (read, samples) = cluster_read(i, &mut rng, 120.0, 8.0);
            signals.insert(read.id.clone(), samples);
            reads.push(read);
        }

        let mut store = ConditionStore::new();
        store
            .add_extracted(
                Some("mixed"),
                GenomicSite::new("chr1", 104).unwrap(),
                reads,
                &mut signals,
                WindowParams::new(NUM_BASES, Molecule::Dna),
                DisplayStyle::default(),
            )
            .unwrap();
        store
    }

    #[test]
    fn two_component_fit_recovers_clusters() {
        let store = two_cluster_store();
        let fit = fit_conditions(
            &store,
            &["mixed".to_string()],
            &Statistic::Mean,
            &Statistic::Std,
            None,
            &GmmConfig::default(),
            &Preprocess::default(),
        )
        .unwrap();

        assert_eq!(fit.components.len(), 2);
        assert_eq!(fit.assignments.len(), 60);
        assert!(fit.converged);

        let mut means: Vec<f64> = fit.components.iter().map(|c| c.mean[0]).collect();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((means[0] - 80.0).abs() < 2.0);
        assert!((means[1] - 120.0).abs() < 2.0);

        // Reads 0..30 belong to one component, 30..60 to the other.
        let low_component = fit.assignments[0].component;
        let correct = fit
            .assignments
            .iter()
            .filter(|a| {
                let index: usize = a.read_id["read-".len()..].parse().unwrap();
                if index < 30 {
                    a.component == low_component
                } else {
                    a.component != low_component
                }
            })
            .count();
        assert!(correct * 100 >= 95 * 60, "only {}/60 assigned correctly", correct);
    }

    #[test]
    fn standardization_is_reported_and_applied() {
        let store = two_cluster_store();
        let preprocess = Preprocess {
            standardize: true,
            feature_scale: None,
        };
        let fit = fit_conditions(
            &store,
            &["mixed".to_string()],
            &Statistic::Mean,
            &Statistic::Std,
            None,
            &GmmConfig::default(),
            &preprocess,
        )
        .unwrap();

        let standardization = fit.standardization.unwrap();
        assert!((standardization.center[0] - 100.0).abs() < 2.0);
        // Component means live in standardized units.
        for component in &fit.components {
            assert!(component.mean[0].abs() < 3.0);
        }
    }

    #[test]
    fn feature_scale_stretches_the_point_cloud() {
        let store = two_cluster_store();
        let preprocess = Preprocess {
            standardize: false,
            feature_scale: Some([0.5, 1.0]),
        };
        let fit = fit_conditions(
            &store,
            &["mixed".to_string()],
            &Statistic::Mean,
            &Statistic::Std,
            None,
            &GmmConfig::default(),
            &preprocess,
        )
        .unwrap();

        let mut means: Vec<f64> = fit.components.iter().map(|c| c.mean[0]).collect();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((means[0] - 40.0).abs() < 1.0);
        assert!((means[1] - 60.0).abs() < 1.0);
        assert!(fit.standardization.is_none());
    }

    #[test]
    fn insufficient_data_is_fatal() {
        let store = two_cluster_store();
        let config = GmmConfig {
            components: 100,
            ..GmmConfig::default()
        };
        let err = fit_conditions(
            &store,
            &["mixed".to_string()],
            &Statistic::Mean,
            &Statistic::Std,
            None,
            &config,
            &Preprocess::default(),
        )
        .unwrap_err();
        assert_eq!(err, "Insufficient data: 60 reads for 100 mixture components");
    }

    #[test]
    fn unknown_condition_label_is_fatal() {
        let store = two_cluster_store();
        let err = fit_conditions(
            &store,
            &["missing".to_string()],
            &Statistic::Mean,
            &Statistic::Std,
            None,
            &GmmConfig::default(),
            &Preprocess::default(),
        )
        .unwrap_err();
        assert_eq!(err, "Unknown condition label: missing");
    }
}
