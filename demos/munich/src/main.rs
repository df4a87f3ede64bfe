//! munich — replay a few hours of bike-sharing trips through rust_replay.
//!
//! Without `--data-dir` a synthetic dataset around central Munich is
//! generated in memory (`--write-data` dumps it to disk so it can be
//! replayed with `--data-dir` later).  Rendering goes to a
//! `RecordingRenderer`; the final scene is summarised on stdout.
//!
//! Log output is controlled by `RUST_LOG` (default `info`).

mod synth;

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rp_core::{MergePolicy, ReplayConfig};
use rp_data::{ChunkFetcher, DirFetcher};
use rp_entity::RecordingRenderer;
use rp_sim::{ReplayEvent, SchedulerBuilder, Topic};

/// Replay recorded bike trips.
#[derive(Debug, Parser)]
#[command(name = "munich", about = "Replay bike-sharing trips through the trace replayer")]
struct Args {
    /// Directory holding `data.json` and its chunk files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Replay config (JSON); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bikes in the synthetic dataset.
    #[arg(long, default_value_t = 24)]
    bikes: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the synthetic dataset to this directory before replaying it.
    #[arg(long)]
    write_data: Option<PathBuf>,

    /// Sleep between timer tasks instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    println!("=== munich — rust_replay ===");

    // 1. Config.  Bikes ride in every chunk, so later trips are merged in
    // start order unless a config file says otherwise.
    let config = match &args.config {
        Some(path) => ReplayConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => ReplayConfig { merge_policy: MergePolicy::TimeOrdered, ..ReplayConfig::default() },
    };
    println!(
        "Tick: {} ms = {} s  |  Sub-steps per move: {}  |  Merge: {:?}",
        config.speed_ms,
        config.step_size,
        config.smoothing_ticks(),
        config.merge_policy
    );

    // 2. Data source.
    let fetcher: Box<dyn ChunkFetcher> = match &args.data_dir {
        Some(dir) => {
            println!("Data: {}", dir.display());
            Box::new(DirFetcher::new(dir))
        }
        None => {
            let data = synth::generate(args.bikes, args.seed);
            println!(
                "Data: synthetic, {} bikes, {} chunks (seed {})",
                args.bikes,
                data.manifest.time_chunks.len(),
                args.seed
            );
            if let Some(dir) = &args.write_data {
                data.write_to(dir)?;
                println!("  written to {}", dir.display());
            }
            Box::new(data.into_fetcher(&config.manifest_resource)?)
        }
    };
    println!();

    // 3. Scheduler.
    let renderer = RecordingRenderer::new();
    let log = renderer.log();
    let ticks = Rc::new(Cell::new(0usize));
    let tick_count = Rc::clone(&ticks);

    let mut scheduler = SchedulerBuilder::new(fetcher, renderer)
        .config(config)
        .on(Topic::LoadedChunk, |event| {
            if let ReplayEvent::LoadedChunk { file_name, entities } = event {
                println!("loaded {file_name}: {entities} bikes");
            }
            Ok(())
        })
        .on(Topic::FetchFailed, |event| {
            if let ReplayEvent::FetchFailed { resource, reason } = event {
                eprintln!("failed {resource}: {reason}");
            }
            Ok(())
        })
        .on(Topic::Clock, move |_| {
            tick_count.set(tick_count.get() + 1);
            Ok(())
        })
        .build()?;

    // 4. Run.
    scheduler.load_data()?;
    scheduler.start();
    let t0 = Instant::now();
    let wall = if args.realtime {
        scheduler.run_realtime()?
    } else {
        scheduler.run_to_end()?
    };
    let elapsed = t0.elapsed();
    let failures = scheduler.take_errors().len();

    // 5. Summary.
    println!();
    println!("Replay complete in {:.3} s (simulated wall time {wall})", elapsed.as_secs_f64());
    println!("  clock ticks      : {}", ticks.get());
    println!("  final clock      : {}", scheduler.counter().to_datetime().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  bikes            : {}", scheduler.registry().len());
    println!("  render commands  : {}", log.commands().len());
    println!("  visible markers  : {}", log.visible_markers());
    println!("  failed chunks    : {failures}");
    println!();

    // 6. Per-bike table.
    println!("{:<8} {:<10} {:>6} {:>10} {:>10}", "Bike", "State", "Trips", "Ride (s)", "Dist (km)");
    println!("{}", "-".repeat(48));
    for entity in scheduler.registry().iter() {
        let summary = entity.summary();
        println!(
            "{:<8} {:<10} {:>6} {:>10} {:>10.2}",
            summary.id.0,
            format!("{:?}", summary.state),
            summary.trips.len(),
            summary.total_duration(),
            summary.total_distance_m() / 1_000.0,
        );
    }

    // 7. Detail for the first bike, as a selection panel would show it.
    let first = scheduler.registry().iter().next().map(|e| e.id());
    if let Some(id) = first {
        let summary = scheduler.select_entity(id)?;
        println!();
        println!("Bike {}:", id.0);
        for trip in &summary.trips {
            println!("  {trip}  ({} waypoints, {:.0} m)", trip.waypoints, trip.distance_m);
        }
    }

    Ok(())
}
