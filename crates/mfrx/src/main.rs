mod input;
mod logging;
mod settings;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mfrx_dtmf::{ToneDetector, SAMPLE_RATE_HZ};
use tracing::info;

use settings::Settings;

/// One 20 ms packet at 8 kHz.
const DEFAULT_CHUNK: usize = 160;

#[derive(Parser, Debug)]
#[command(name = "mfrx", about = "Decode DTMF digits from recorded 8 kHz audio")]
struct Args {
    /// Mono 16-bit 8 kHz WAV file, or raw PCM with --raw.
    input: PathBuf,

    /// Read headerless signed 16-bit little-endian PCM.
    #[arg(long)]
    raw: bool,

    /// TOML settings with [logging] and [detector] tables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Samples per feed call.
    #[arg(long, default_value_t = DEFAULT_CHUNK)]
    chunk: usize,

    /// Print each digit as it is committed, with its position.
    #[arg(long)]
    realtime: bool,

    /// Overrides the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(level) = &args.log_level {
        settings.logging.level = level.clone();
    }
    logging::setup_logging(&settings.logging)?;

    let samples = if args.raw {
        input::read_raw(&args.input)?
    } else {
        input::read_wav(&args.input)?
    };
    info!(samples = samples.len(), chunk = args.chunk, "decoding");

    let chunk = args.chunk.max(1);
    let (digits, lost) = if args.realtime {
        let (stamped, lost) = decode_realtime(&settings, &samples, chunk)?;
        (stamped.into_iter().map(|(digit, _)| digit).collect::<String>(), lost)
    } else {
        let (digits, lost) = decode(&settings, &samples, chunk)?;
        println!("{digits}");
        (digits, lost)
    };
    info!(digits = digits.len(), lost, "done");
    Ok(())
}

fn decode(settings: &Settings, samples: &[i16], chunk: usize) -> anyhow::Result<(String, u32)> {
    let mut detector = ToneDetector::builder()
        .config(&settings.detector)
        .build()
        .context("building detector")?;
    let mut digits = String::new();
    for block in samples.chunks(chunk) {
        detector.feed(block);
        digits.push_str(&detector.take_digits());
    }
    Ok((digits, detector.lost_count()))
}

/// Callback-mode decode. Each digit is stamped with the sample offset of the
/// block boundary that committed it.
fn decode_realtime(
    settings: &Settings,
    samples: &[i16],
    chunk: usize,
) -> anyhow::Result<(Vec<(char, usize)>, u32)> {
    let fed = Arc::new(AtomicUsize::new(0));
    let position = Arc::clone(&fed);
    let (tx, rx) = std::sync::mpsc::channel();
    let mut detector = ToneDetector::builder()
        .config(&settings.detector)
        .callback(move |digit, hits| {
            let at = position.load(Ordering::Relaxed);
            println!("{:>9.3}s  {digit}  ({hits} blocks)", at as f32 / SAMPLE_RATE_HZ);
            let _ = tx.send((digit, at));
        })
        .build()
        .context("building detector")?;
    for packet in samples.chunks(chunk) {
        let mut rest = packet;
        while !rest.is_empty() {
            let (head, tail) = rest.split_at(detector.samples_to_block_end().min(rest.len()));
            fed.fetch_add(head.len(), Ordering::Relaxed);
            detector.feed(head);
            rest = tail;
        }
    }
    let lost = detector.lost_count();
    drop(detector);
    Ok((rx.iter().collect(), lost))
}
