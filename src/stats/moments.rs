//! Descriptive statistics over raw-signal samples. Accumulation happens
//! in f64; results come back in the signal's f32 domain. Moments are
//! population moments, which stay well-defined for small read counts.

pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    Some((sum / values.len() as f64) as f32)
}

pub fn median(values: &[f32]) -> Option<f32> {
    let size = values.len();
    if size == 0 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if size % 2 == 0 {
        Some((sorted[size / 2 - 1] + sorted[size / 2]) / 2.0)
    } else {
        Some(sorted[size / 2])
    }
}

pub fn variance(values: &[f32]) -> Option<f32> {
    central_moment(values, 2).map(|m2| m2 as f32)
}

pub fn std_dev(values: &[f32]) -> Option<f32> {
    central_moment(values, 2).map(|m2| m2.sqrt() as f32)
}

pub fn min(values: &[f32]) -> Option<f32> {
    values.iter().copied().reduce(f32::min)
}

pub fn max(values: &[f32]) -> Option<f32> {
    values.iter().copied().reduce(f32::max)
}

/// Third standardized moment. Undefined (`None`) below 2 values or at
/// zero variance, rather than surfacing NaN.
pub fn skewness(values: &[f32]) -> Option<f32> {
    if values.len() < 2 {
        return None;
    }
    let m2 = central_moment(values, 2)?;
    if m2 <= 0.0 {
        return None;
    }
    let m3 = central_moment(values, 3)?;
    Some((m3 / m2.powf(1.5)) as f32)
}

/// Fourth standardized moment minus 3 (excess kurtosis). Undefined under
/// the same conditions as `skewness`.
pub fn excess_kurtosis(values: &[f32]) -> Option<f32> {
    if values.len() < 2 {
        return None;
    }
    let m2 = central_moment(values, 2)?;
    if m2 <= 0.0 {
        return None;
    }
    let m4 = central_moment(values, 4)?;
    Some((m4 / (m2 * m2) - 3.0) as f32)
}

fn central_moment(values: &[f32], order: u32) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean: f64 = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let sum: f64 = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(order as i32))
        .sum();
    Some(sum / n)
}
