extern crate pretty_env_logger;
#[macro_use] extern crate log;

use catalog::{cycle_label, Manifest};
use clap::{Parser, Subcommand};
use player::config::DEFAULT_CONFIG_FILE;
use player::{
    FrameFetcher, IntervalTicker, ManualTicker, PlaybackState, Viewer, ViewerConfig, ViewerEvent,
};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Headless forecast frame viewer.
#[derive(Parser, Debug)]
#[command(name = "player")]
struct Args {
    /// Deployment settings file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the manifest source from the settings file
    #[arg(long)]
    manifest: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the frame for a selection (unset parts use the defaults)
    Resolve {
        #[arg(long)]
        cycle: Option<String>,
        #[arg(long)]
        variable: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        hour_index: i64,
    },
    /// List regions and whether a variable has data for them
    Regions { variable: String },
    /// Animate through the forecast hours, loading every frame
    Play {
        /// Stop after this many playback steps
        #[arg(long, default_value_t = 20)]
        ticks: usize,
    },
}

enum FetchOutcome {
    Loaded { locator: String, size: usize },
    Failed { locator: String, reason: String },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    let args = Args::parse();
    let mut config = ViewerConfig::load(&args.config)?;
    if let Some(manifest) = args.manifest {
        config.manifest = manifest;
    }

    match args.command {
        Command::Resolve {
            cycle,
            variable,
            region,
            hour_index,
        } => {
            let manifest = config.manifest_loader().load().await?;
            resolve(&config, manifest, cycle, variable, region, hour_index);
        }
        Command::Regions { variable } => {
            let manifest = config.manifest_loader().load().await?;
            let label = manifest.variable_label(&variable)?;
            println!("Regions for {} ({}):", variable, label);
            for option in manifest.region_options(&variable) {
                let marker = if option.enabled { "x" } else { " " };
                println!("  [{}] {:<20} {}", marker, option.key, option.label);
            }
        }
        Command::Play { ticks } => play(config, ticks).await?,
    }

    Ok(())
}

fn resolve(
    config: &ViewerConfig,
    manifest: Manifest,
    cycle: Option<String>,
    variable: Option<String>,
    region: Option<String>,
    hour_index: i64,
) {
    let mut viewer = Viewer::new(config, ManualTicker::new());
    viewer.load(manifest);

    // variable before region so the region is checked against it
    if let Some(cycle) = cycle {
        if let Err(e) = viewer.set_cycle(&cycle) {
            warn!("{}", e);
        }
    }
    if let Some(variable) = variable {
        if let Err(e) = viewer.set_variable(&variable) {
            warn!("{}", e);
        }
    }
    if let Some(region) = region {
        if let Err(e) = viewer.set_region(&region) {
            warn!("{}", e);
        }
    }
    if let Err(e) = viewer.set_hour_index(hour_index) {
        warn!("{}", e);
    }

    let selection = viewer.selection();
    if let Some(cycle) = &selection.cycle {
        println!("Cycle: {} ({})", cycle, cycle_label(cycle));
    }
    match viewer.current_frame() {
        Some(frame) => {
            println!("Locator: {}", frame.locator);
            println!("Caption: {}", frame.caption);
            if let Some(valid) = frame.valid_time {
                println!("Valid: {}", valid.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        None => println!("No frame: no region has data for {:?}", selection.variable),
    }
}

async fn play(config: ViewerConfig, ticks: usize) -> Result<(), anyhow::Error> {
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel();

    let ticker = IntervalTicker::new(tick_tx);
    let gate = ticker.gate();
    let mut viewer = Viewer::new(&config, ticker);

    let fetcher = FrameFetcher::new(config.frames_root.clone());
    viewer.subscribe(move |event| match event {
        ViewerEvent::FrameResolved(frame) => {
            println!("{:<60} {}", frame.caption, frame.locator);
            let fetcher = fetcher.clone();
            let tx = fetch_tx.clone();
            let locator = frame.locator.clone();
            tokio::spawn(async move {
                let outcome = match fetcher.fetch(&locator).await {
                    Ok(bytes) => FetchOutcome::Loaded {
                        locator,
                        size: bytes.len(),
                    },
                    Err(e) => FetchOutcome::Failed {
                        locator,
                        reason: e.to_string(),
                    },
                };
                // event loop may already be gone
                let _ = tx.send(outcome);
            });
        }
        ViewerEvent::FrameUnavailable(frame) => println!("{}", frame.unavailable_caption()),
        ViewerEvent::FrameCleared => println!("No region has data for the selected variable"),
        ViewerEvent::PlaybackChanged(state) => info!("Playback {:?}", state),
        ViewerEvent::Failed(message) => error!("Viewer unavailable: {}", message),
    });

    match config.manifest_loader().load().await {
        Ok(manifest) => viewer.load(manifest),
        Err(e) => {
            viewer.fail(e.to_string());
            return Err(e.into());
        }
    }

    viewer.play();
    let mut steps = 0;
    loop {
        tokio::select! {
            Some(tick) = tick_rx.recv() => {
                if !gate.is_current(tick) {
                    continue;
                }
                if viewer.tick() {
                    steps += 1;
                }
            }
            Some(outcome) = fetch_rx.recv() => match outcome {
                FetchOutcome::Loaded { locator, size } => {
                    debug!("loaded {} ({} bytes)", locator, size);
                    viewer.frame_loaded(&locator);
                }
                FetchOutcome::Failed { locator, reason } => {
                    debug!("{}", reason);
                    viewer.frame_failed(&locator);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            else => break,
        }

        if steps >= ticks || viewer.playback_state() == PlaybackState::Stopped {
            break;
        }
    }

    viewer.stop();
    info!("Played {} steps", steps);
    Ok(())
}
