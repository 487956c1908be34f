//! Expectation-maximization over two-dimensional Gaussian mixtures.
//! Densities are evaluated in log space; 2×2 covariances are inverted in
//! closed form.

use super::{CovarianceKind, GmmComponent, GmmConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LN_2PI: f64 = 1.8378770664093453;

pub(super) struct EmFit {
    pub components: Vec<GmmComponent>,
    pub labels: Vec<usize>,
    pub converged: bool,
    pub iterations: usize,
    pub log_likelihood: f64,
}

pub(super) fn fit(points: &[[f64; 2]], config: &GmmConfig) -> EmFit {
    let n = points.len();
    let k = config.components;

    let mut means = init_means(points, k, config.seed);
    let mut covs = vec![pooled_covariance(points, config); k];
    let mut weights = vec![1.0 / k as f64; k];
    let mut resp = vec![vec![0.0_f64; k]; n];

    let mut log_likelihood = e_step(points, &weights, &means, &covs, &mut resp);
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 1..=config.max_iters {
        iterations = iteration;
        m_step(points, &resp, &mut weights, &mut means, &mut covs, config);

        let updated = e_step(points, &weights, &means, &covs, &mut resp);
        let improvement = (updated - log_likelihood) / n as f64;
        log_likelihood = updated;
        if improvement.abs() < config.tol {
            converged = true;
            break;
        }
    }

    let labels = resp
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .map(|(component, _)| component)
                .unwrap()
        })
        .collect();

    let components = (0..k)
        .map(|j| GmmComponent {
            weight: weights[j],
            mean: means[j],
            cov: covs[j],
        })
        .collect();

    EmFit {
        components,
        labels,
        converged,
        iterations,
        log_likelihood,
    }
}

/// Seeded farthest-point initialization: a random first mean, then each
/// next mean is the point farthest from all chosen means. Deterministic
/// for a given seed and robust on well-separated clusters.
fn init_means(points: &[[f64; 2]], k: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut means = vec![points[rng.random_range(0..points.len())]];

    while means.len() < k {
        let farthest = points
            .iter()
            .max_by(|a, b| {
                let da = min_sq_dist(a, &means);
                let db = min_sq_dist(b, &means);
                da.partial_cmp(&db).unwrap()
            })
            .unwrap();
        means.push(*farthest);
    }

    means
}

fn min_sq_dist(point: &[f64; 2], means: &[[f64; 2]]) -> f64 {
    means
        .iter()
        .map(|m| {
            let dx = point[0] - m[0];
            let dy = point[1] - m[1];
            dx * dx + dy * dy
        })
        .fold(f64::INFINITY, f64::min)
}

fn pooled_covariance(points: &[[f64; 2]], config: &GmmConfig) -> [[f64; 2]; 2] {
    let n = points.len() as f64;
    let mean = [
        points.iter().map(|p| p[0]).sum::<f64>() / n,
        points.iter().map(|p| p[1]).sum::<f64>() / n,
    ];

    let mut cov = [[0.0; 2]; 2];
    for point in points {
        let dx = point[0] - mean[0];
        let dy = point[1] - mean[1];
        cov[0][0] += dx * dx;
        cov[0][1] += dx * dy;
        cov[1][1] += dy * dy;
    }
    cov[0][0] = cov[0][0] / n + config.reg_covar;
    cov[1][1] = cov[1][1] / n + config.reg_covar;
    cov[0][1] /= n;
    cov[1][0] = cov[0][1];

    if config.covariance == CovarianceKind::Diagonal {
        cov[0][1] = 0.0;
        cov[1][0] = 0.0;
    }
    cov
}

fn e_step(
    points: &[[f64; 2]],
    weights: &[f64],
    means: &[[f64; 2]],
    covs: &[[[f64; 2]; 2]],
    resp: &mut [Vec<f64>],
) -> f64 {
    let k = weights.len();
    let mut total = 0.0;
    let mut log_probs = vec![0.0_f64; k];

    for (i, point) in points.iter().enumerate() {
        for j in 0..k {
            log_probs[j] = weights[j].max(f64::MIN_POSITIVE).ln()
                + log_gaussian(point, &means[j], &covs[j]);
        }
        let norm = log_sum_exp(&log_probs);
        total += norm;
        for j in 0..k {
            resp[i][j] = (log_probs[j] - norm).exp();
        }
    }

    total
}

fn m_step(
    points: &[[f64; 2]],
    resp: &[Vec<f64>],
    weights: &mut [f64],
    means: &mut [[f64; 2]],
    covs: &mut [[[f64; 2]; 2]],
    config: &GmmConfig,
) {
    let n = points.len();
    let k = weights.len();

    for j in 0..k {
        let nj: f64 = resp.iter().map(|row| row[j]).sum();
        weights[j] = nj / n as f64;
        if nj < 1e-10 {
            continue;
        }

        let mut mean = [0.0; 2];
        for (point, row) in points.iter().zip(resp) {
            mean[0] += row[j] * point[0];
            mean[1] += row[j] * point[1];
        }
        mean[0] /= nj;
        mean[1] /= nj;
        means[j] = mean;

        let mut cov = [[0.0; 2]; 2];
        for (point, row) in points.iter().zip(resp) {
            let dx = point[0] - mean[0];
            let dy = point[1] - mean[1];
            cov[0][0] += row[j] * dx * dx;
            cov[0][1] += row[j] * dx * dy;
            cov[1][1] += row[j] * dy * dy;
        }
        cov[0][0] = cov[0][0] / nj + config.reg_covar;
        cov[1][1] = cov[1][1] / nj + config.reg_covar;
        cov[0][1] /= nj;
        cov[1][0] = cov[0][1];

        if config.covariance == CovarianceKind::Diagonal {
            cov[0][1] = 0.0;
            cov[1][0] = 0.0;
        }
        covs[j] = cov;
    }
}

fn log_gaussian(point: &[f64; 2], mean: &[f64; 2], cov: &[[f64; 2]; 2]) -> f64 {
    let dx = point[0] - mean[0];
    let dy = point[1] - mean[1];
    let det = (cov[0][0] * cov[1][1] - cov[0][1] * cov[1][0]).max(f64::MIN_POSITIVE);

    let inv00 = cov[1][1] / det;
    let inv11 = cov[0][0] / det;
    let inv01 = -cov[0][1] / det;
    let quad = dx * dx * inv00 + 2.0 * dx * dy * inv01 + dy * dy * inv11;

    -LN_2PI - 0.5 * det.ln() - 0.5 * quad
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config(components: usize) -> GmmConfig {
        GmmConfig {
            components,
            ..GmmConfig::default()
        }
    }

    #[test]
    fn single_component_recovers_moments() {
        let points: Vec<[f64; 2]> = (0..50)
            .map(|i| [i as f64 / 10.0, 100.0 - i as f64])
            .collect();
        let fit = fit(&points, &default_config(1));
        assert!(fit.converged);
        assert!((fit.components[0].weight - 1.0).abs() < 1e-9);
        assert!((fit.components[0].mean[0] - 2.45).abs() < 1e-6);
        assert!((fit.components[0].mean[1] - 75.5).abs() < 1e-6);
    }

    #[test]
    fn log_sum_exp_is_stable() {
        let values = [-1000.0, -1000.0];
        let result = log_sum_exp(&values);
        assert!((result - (-1000.0 + std::f64::consts::LN_2)).abs() < 1e-9);
    }

    #[test]
    fn identical_points_stay_finite() {
        let points = vec![[1.0, 1.0]; 10];
        let fit = fit(&points, &default_config(2));
        for component in &fit.components {
            assert!(component.mean[0].is_finite());
            assert!(component.cov[0][0].is_finite());
        }
        assert!(fit.log_likelihood.is_finite());
    }
}
