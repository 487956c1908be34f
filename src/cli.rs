use crate::gmm::CovarianceKind;
use crate::signal::Molecule;
use crate::stats::Statistic;
use crate::utils::Result;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| env!("CARGO_PKG_VERSION").to_string());

#[derive(Parser)]
#[command(name="squigview",
          version=&**FULL_VERSION,
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Per-position signal statistics across conditions")]
    Stats(StatsArgs),
    #[clap(about = "Gaussian-mixture clustering of per-read signal statistics")]
    Cluster(ClusterArgs),
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "conditions")]
    #[clap(help = "Condition manifest: one 'label bam signal site' line per condition ('.' = default label)")]
    #[clap(value_name = "CONDITIONS")]
    #[arg(value_parser = check_file_exists)]
    pub conditions_path: PathBuf,

    #[clap(short = 'k')]
    #[clap(long = "window")]
    #[clap(help = "Number of reference positions in the window (bumped to the next odd value)")]
    #[clap(value_name = "WINDOW")]
    #[clap(default_value = "9")]
    #[arg(value_parser = window_in_range)]
    pub window: usize,

    #[clap(long = "molecule")]
    #[clap(value_name = "MOLECULE")]
    #[clap(help = "Sequenced molecule type (dna or rna)")]
    #[clap(default_value = "rna")]
    pub molecule: Molecule,

    #[clap(long = "exclude-indels")]
    #[clap(help = "Exclude reads with an insertion or deletion inside the window")]
    pub exclude_indels: bool,

    #[clap(help_heading("Filtering"))]
    #[clap(long = "max-reads")]
    #[clap(value_name = "MAX_READS")]
    #[clap(help = "Keep at most this many reads per condition, after all filters")]
    #[arg(value_parser = positive_usize)]
    pub max_reads: Option<usize>,

    #[clap(help_heading("Filtering"))]
    #[clap(long = "read-ids")]
    #[clap(value_name = "READ_IDS")]
    #[clap(help = "File with allowed read identifiers, one per line")]
    #[arg(value_parser = check_file_exists)]
    pub read_ids_path: Option<PathBuf>,

    #[clap(help_heading("Filtering"))]
    #[clap(long = "match-base")]
    #[clap(value_name = "BASE")]
    #[clap(help = "Keep only reads calling this base at the target position")]
    #[arg(value_parser = base_from_string)]
    pub match_base: Option<char>,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct StatsArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(short = 's')]
    #[clap(long = "stats")]
    #[clap(value_name = "STATS")]
    #[clap(help = "Comma-separated statistics to report")]
    #[clap(default_value = "mean,median,std")]
    #[clap(value_delimiter = ',')]
    pub stats: Vec<Statistic>,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct ClusterArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(long = "stat1")]
    #[clap(value_name = "STAT")]
    #[clap(help = "First per-read statistic")]
    #[clap(default_value = "mean")]
    pub stat1: Statistic,

    #[clap(long = "stat2")]
    #[clap(value_name = "STAT")]
    #[clap(help = "Second per-read statistic")]
    #[clap(default_value = "std")]
    pub stat2: Statistic,

    #[clap(short = 'n')]
    #[clap(long = "components")]
    #[clap(value_name = "COMPONENTS")]
    #[clap(help = "Number of mixture components")]
    #[clap(default_value = "2")]
    #[arg(value_parser = positive_usize)]
    pub components: usize,

    #[clap(long = "cluster-window")]
    #[clap(value_name = "WINDOW")]
    #[clap(help = "Reduce per-read statistics to this many central positions")]
    #[arg(value_parser = window_in_range)]
    pub cluster_window: Option<usize>,

    #[clap(long = "standardize")]
    #[clap(help = "Standardize both statistics over the gathered reads before fitting")]
    pub standardize: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "covariance")]
    #[clap(value_name = "KIND")]
    #[clap(help = "Covariance kind (full or diag)")]
    #[clap(default_value = "full")]
    pub covariance: CovarianceKind,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-iters")]
    #[clap(value_name = "MAX_ITERS")]
    #[clap(help = "Iteration cap for expectation-maximization")]
    #[clap(default_value = "200")]
    #[arg(value_parser = positive_usize)]
    pub max_iters: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "tol")]
    #[clap(value_name = "TOL")]
    #[clap(help = "Convergence tolerance on the mean log-likelihood improvement")]
    #[clap(default_value = "1e-3")]
    #[arg(value_parser = positive_float)]
    pub tol: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Random seed for mixture initialization")]
    #[clap(default_value = "0")]
    pub seed: u64,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn window_in_range(s: &str) -> Result<usize> {
    let window: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid window size", s))?;
    if window >= 1 {
        Ok(window)
    } else {
        Err("Window size must be at least 1".into())
    }
}

fn positive_usize(s: &str) -> Result<usize> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid count", s))?;
    if value >= 1 {
        Ok(value)
    } else {
        Err("Value must be at least 1".into())
    }
}

fn positive_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("The value must be a positive float, got: {}", s))
    }
}

fn base_from_string(s: &str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(base), None) if "ACGTUacgtu".contains(base) => Ok(base.to_ascii_uppercase()),
        _ => Err(format!("`{}` is not a valid base (expected one of ACGTU)", s)),
    }
}
