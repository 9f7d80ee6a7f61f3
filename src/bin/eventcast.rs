//! eventcast command line.
//!
//! Steers a head around the playfield from stdin (or replays a file of event
//! codes) and logs each forecast as it lines up with the actual event.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use crossbeam_channel::Sender;
use tracing_subscriber::EnvFilter;

use eventcast::{
    steering_channel, AppConfig, Direction, EventSource, EventcastResult, MarkovModel,
    PredictionLoop, PredictiveModel, ScriptedSource, SteeringInput, SteeringSource, TracingSink,
};

/// Forecast a steering signal in real time.
#[derive(Debug, Parser)]
#[command(name = "eventcast", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay a JSON array of event codes instead of reading stdin
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Override the forecast horizon
    #[arg(long)]
    horizon: Option<u32>,

    /// Override the history window size
    #[arg(long)]
    window: Option<usize>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "eventcast failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> EventcastResult<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    if let Some(horizon) = cli.horizon {
        config.model.horizons = [horizon].into();
        config.pipeline.display_horizon = None;
    }
    if let Some(window) = cli.window {
        config.pipeline.window = window;
    }
    config.validate()?;

    let mut model = MarkovModel::new(config.markov.clone());
    model.configure(config.model.clone())?;
    let mut pipeline = PredictionLoop::new(model, config.pipeline.clone())?;
    let mut sink = TracingSink::new();

    let mut source: Box<dyn EventSource> = match &cli.replay {
        Some(path) => Box::new(ScriptedSource::from_path(path)?),
        None => {
            let (tx, rx) = steering_channel(config.steering.input_capacity);
            spawn_stdin_reader(tx)?;
            tracing::info!("steer with up/down/left/right (or w/a/s/d), quit with q");
            Box::new(SteeringSource::new(rx, &config.steering))
        }
    };

    let summary = pipeline.run(source.as_mut(), &mut sink)?;
    println!(
        "run {}: {} ticks, {} forecasts resolved",
        summary.run_id, summary.ticks, summary.resolved
    );
    Ok(())
}

/// Forwards stdin lines as steering inputs. EOF or `q` quits.
fn spawn_stdin_reader(tx: Sender<SteeringInput>) -> EventcastResult<()> {
    thread::Builder::new()
        .name("eventcast-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let key = line.trim();
                let input = match key {
                    "q" | "quit" | "exit" => SteeringInput::Quit,
                    _ => match Direction::from_key(key) {
                        Some(direction) => SteeringInput::Steer(direction),
                        None => {
                            tracing::warn!(key, "unknown key");
                            continue;
                        }
                    },
                };
                if tx.send(input).is_err() || input == SteeringInput::Quit {
                    return;
                }
            }
            let _ = tx.send(SteeringInput::Quit);
        })
        .map_err(|e| {
            eventcast::EventcastError::internal(format!("failed to spawn stdin reader: {e}"))
        })?;
    Ok(())
}
