//! Synthetic tick driver: pushes periods through a lattice, checks the copy,
//! and reports per-tick latency.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use indicatif::ProgressBar;
use serde::Serialize;

use super::common::{build_lattice, load_config, progress_bar};

#[derive(Args)]
pub struct StressArgs {
    /// Lattice configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lane count; sets both input and output channels
    #[arg(long)]
    lanes: Option<u32>,

    /// Number of ticks to drive
    #[arg(long, default_value = "1000")]
    ticks: usize,

    /// Frames per tick (overrides the configuration)
    #[arg(long)]
    period: Option<u32>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,
}

/// Summary of a stress run.
#[derive(Debug, Serialize)]
pub struct StressReport {
    /// Active channel lanes.
    pub lanes: u32,
    /// Worker threads the lattice ran.
    pub threads: usize,
    /// Frames moved per tick.
    pub period_frames: u32,
    /// Ticks driven.
    pub ticks: usize,
    /// Ticks whose output did not match the input.
    pub mismatched_ticks: usize,
    /// Process errors counted across all lanes.
    pub lane_errors: u64,
    /// Per-tick round-trip latency.
    pub latency_us: LatencyStats,
}

/// Tick latency percentiles in microseconds.
#[derive(Debug, Serialize, PartialEq)]
pub struct LatencyStats {
    /// Fastest tick.
    pub min: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median.
    pub p50: f64,
    /// 99th percentile.
    pub p99: f64,
    /// Slowest tick.
    pub max: f64,
}

impl LatencyStats {
    fn from_samples(samples: &mut [Duration]) -> Self {
        if samples.is_empty() {
            return Self {
                min: 0.0,
                mean: 0.0,
                p50: 0.0,
                p99: 0.0,
                max: 0.0,
            };
        }
        samples.sort_unstable();
        let micros = |d: Duration| d.as_secs_f64() * 1e6;
        let percentile = |p: f64| {
            let rank = ((samples.len() - 1) as f64 * p).round() as usize;
            micros(samples[rank])
        };
        let total: Duration = samples.iter().sum();
        Self {
            min: micros(samples[0]),
            mean: micros(total) / samples.len() as f64,
            p50: percentile(0.50),
            p99: percentile(0.99),
            max: micros(samples[samples.len() - 1]),
        }
    }
}

pub fn run(args: StressArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(lanes) = args.lanes {
        config.in_channels = lanes;
        config.out_channels = lanes;
    }
    if let Some(period) = args.period {
        config.period_frames = period;
    }

    let channels = config.in_channels as usize;
    let out_channels = config.out_channels as usize;
    let period = config.period_frames as usize;
    let lanes = config.lanes() as usize;

    let mut lattice = build_lattice(&config, None)?;
    lattice.start()?;
    let threads = lattice.lattice().live_threads();
    tracing::info!(lanes, threads, period, ticks = args.ticks, "stress run starting");

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        progress_bar(args.ticks as u64)?
    };

    let mut input = vec![0.0f32; period * channels];
    let mut output = vec![0.0f32; period * out_channels];
    let mut latencies = Vec::with_capacity(args.ticks);
    let mut mismatched = 0usize;

    for tick in 0..args.ticks {
        fill_tick(&mut input, tick);
        let start = Instant::now();
        lattice.transfer(&input, &mut output)?;
        latencies.push(start.elapsed());

        if !copy_matches(&input, channels, &output, out_channels, lanes) {
            mismatched += 1;
            tracing::warn!(tick, "lane output does not match input");
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    lattice.stop();

    let report = StressReport {
        lanes: config.lanes(),
        threads,
        period_frames: config.period_frames,
        ticks: args.ticks,
        mismatched_ticks: mismatched,
        lane_errors: lattice.lane_stats().iter().map(|s| s.errors).sum(),
        latency_us: LatencyStats::from_samples(&mut latencies),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if mismatched > 0 {
        anyhow::bail!("{mismatched} of {} ticks produced mismatched output", args.ticks);
    }
    Ok(())
}

/// Deterministic, tick-dependent test signal so stale periods are detectable.
fn fill_tick(input: &mut [f32], tick: usize) {
    for (i, sample) in input.iter_mut().enumerate() {
        *sample = ((tick * 7919 + i) % 2048) as f32 / 1024.0 - 1.0;
    }
}

fn copy_matches(input: &[f32], in_ch: usize, output: &[f32], out_ch: usize, lanes: usize) -> bool {
    input
        .chunks(in_ch)
        .zip(output.chunks(out_ch))
        .all(|(inf, outf)| outf[..lanes] == inf[..lanes] && outf[lanes..].iter().all(|&s| s == 0.0))
}

fn print_report(report: &StressReport) {
    println!("\nStress run");
    println!("  Lanes:   {} ({} threads)", report.lanes, report.threads);
    println!("  Period:  {} frames", report.period_frames);
    println!("  Ticks:   {} ({} mismatched)", report.ticks, report.mismatched_ticks);
    println!("  Errors:  {}", report.lane_errors);
    let l = &report.latency_us;
    println!(
        "  Latency: min {:.1} us, mean {:.1} us, p50 {:.1} us, p99 {:.1} us, max {:.1} us",
        l.min, l.mean, l.p50, l.p99, l.max
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_percentiles() {
        let mut samples: Vec<Duration> = (1..=100).rev().map(Duration::from_micros).collect();
        let stats = LatencyStats::from_samples(&mut samples);
        assert!((stats.min - 1.0).abs() < 1e-6);
        assert!((stats.max - 100.0).abs() < 1e-6);
        assert!((stats.mean - 50.5).abs() < 1e-6);
        assert!((stats.p99 - 99.0).abs() < 1e-6);
    }

    #[test]
    fn empty_latencies_are_zero() {
        let stats = LatencyStats::from_samples(&mut []);
        assert_eq!(stats.max, 0.0);
    }

    #[test]
    fn copy_check_requires_silent_extra_channels() {
        let input = [1.0, 2.0];
        assert!(copy_matches(&input, 1, &[1.0, 0.0, 2.0, 0.0], 2, 1));
        assert!(!copy_matches(&input, 1, &[1.0, 0.5, 2.0, 0.0], 2, 1));
        assert!(!copy_matches(&input, 1, &[1.0, 0.0, 3.0, 0.0], 2, 1));
    }

    #[test]
    fn ticks_differ() {
        let mut a = [0.0; 8];
        let mut b = [0.0; 8];
        fill_tick(&mut a, 0);
        fill_tick(&mut b, 1);
        assert_ne!(a, b);
    }
}
