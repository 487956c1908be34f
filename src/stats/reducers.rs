use super::moments;
use std::str::FromStr;

/// A reducer turning a sequence of samples into one scalar. The built-in
/// set is closed; `Custom` wraps a caller-supplied pure function for
/// anything else.
#[derive(Debug, Clone)]
pub enum Statistic {
    Mean,
    Median,
    Std,
    Variance,
    Min,
    Max,
    Duration,
    Skewness,
    Kurtosis,
    Custom {
        name: String,
        func: fn(&[f32]) -> Option<f32>,
    },
}

pub const BUILTIN_NAMES: &str =
    "mean, median, std, variance, min, max, duration, skewness, kurtosis";

impl Statistic {
    pub fn name(&self) -> &str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Std => "std",
            Statistic::Variance => "variance",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Duration => "duration",
            Statistic::Skewness => "skewness",
            Statistic::Kurtosis => "kurtosis",
            Statistic::Custom { name, .. } => name,
        }
    }

    /// Reduces `values` to one scalar; `None` when the statistic is
    /// undefined for the input (empty, or degenerate for the moments).
    pub fn apply(&self, values: &[f32]) -> Option<f32> {
        match self {
            Statistic::Mean => moments::mean(values),
            Statistic::Median => moments::median(values),
            Statistic::Std => moments::std_dev(values),
            Statistic::Variance => moments::variance(values),
            Statistic::Min => moments::min(values),
            Statistic::Max => moments::max(values),
            Statistic::Duration => (!values.is_empty()).then(|| values.len() as f32),
            Statistic::Skewness => moments::skewness(values),
            Statistic::Kurtosis => moments::excess_kurtosis(values),
            Statistic::Custom { func, .. } => func(values),
        }
    }
}

impl FromStr for Statistic {
    type Err = String;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "mean" => Ok(Statistic::Mean),
            "median" => Ok(Statistic::Median),
            "std" | "stdev" => Ok(Statistic::Std),
            "variance" | "var" => Ok(Statistic::Variance),
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "duration" => Ok(Statistic::Duration),
            "skewness" | "skew" => Ok(Statistic::Skewness),
            "kurtosis" => Ok(Statistic::Kurtosis),
            _ => Err(format!(
                "Unknown statistic {:?}. Choose from: {}",
                name, BUILTIN_NAMES
            )),
        }
    }
}
