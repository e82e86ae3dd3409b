//! File-based lattice processing command.

use std::path::PathBuf;

use clap::Args;
use nuclear_io::{WavSpec, read_wav_interleaved, write_wav_interleaved};

use super::common::{build_lattice, gain_lane, linear_to_db, load_config, peak, progress_bar};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Lattice configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output channel count (defaults to the input's)
    #[arg(long)]
    out_channels: Option<u32>,

    /// Frames per tick (overrides the configuration)
    #[arg(long)]
    period: Option<u32>,

    /// Gain applied by every input lane, in dB
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    gain_db: f32,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    println!("Reading {}...", args.input.display());
    let (samples, spec) = read_wav_interleaved(&args.input)?;
    let in_channels = usize::from(spec.channels);
    let frames = samples.len() / in_channels.max(1);

    println!(
        "  {frames} frames, {} channel(s), {} Hz, {:.2}s",
        spec.channels,
        spec.sample_rate,
        frames as f64 / f64::from(spec.sample_rate)
    );

    // The file decides the input side; the rest comes from config and flags.
    let mut config = load_config(args.config.as_deref())?;
    config.in_channels = u32::from(spec.channels);
    config.out_channels = args.out_channels.unwrap_or(config.in_channels);
    if let Some(period) = args.period {
        config.period_frames = period;
    }
    config.sample_rate = spec.sample_rate;

    let out_channels = config.out_channels as usize;
    let period = config.period_frames as usize;

    let mut lattice = build_lattice(&config, gain_lane(args.gain_db))?;
    lattice.start()?;
    println!(
        "Processing through {} lane(s), {} thread(s), period {period} frames ({:.2} ms)...",
        config.lanes(),
        lattice.lattice().live_threads(),
        config.period_ms()
    );

    let pb = progress_bar(frames as u64)?;
    let mut output = vec![0.0f32; frames * out_channels];
    let mut done = 0usize;
    for (in_chunk, out_chunk) in samples
        .chunks(period * in_channels)
        .zip(output.chunks_mut(period * out_channels))
    {
        done += lattice.transfer(in_chunk, out_chunk)?;
        pb.set_position(done as u64);
    }
    pb.finish_with_message("done");
    lattice.stop();

    let stats = lattice.lane_stats();
    let errors: u64 = stats.iter().map(|s| s.errors).sum();
    if errors > 0 {
        tracing::warn!(errors, "lane process errors during run");
    }

    println!("\nStats:");
    println!("  Periods: {}", lattice.transfers());
    println!("  Input peak:  {:.1} dB", linear_to_db(peak(&samples)));
    println!("  Output peak: {:.1} dB", linear_to_db(peak(&output)));

    let out_spec = WavSpec {
        channels: u16::try_from(out_channels)?,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };

    println!("\nWriting {}...", args.output.display());
    write_wav_interleaved(&args.output, &output, out_spec)?;
    println!("Done!");

    Ok(())
}
