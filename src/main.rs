use adhop::app::App;
use adhop::audio::source::AudioSource;
use adhop::audio::wav::WavAudioSource;
use adhop::bus::MemoryBus;
use adhop::classify::loudness::LoudnessClassifier;
use adhop::cli::{Cli, Commands};
use adhop::config::Config;
use adhop::control::tuner::LogTuner;
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => run(cli).await,
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "adhop", &mut std::io::stdout());
            Ok(())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    config.validate()?;

    let Some(wav_path) = cli.wav.as_deref() else {
        bail!(
            "no audio source: attach a receiver through the library API, \
             or replay a capture with --wav <PATH> (add --loop to keep it running)"
        );
    };

    let mut source = WavAudioSource::from_path(wav_path, config.audio.sample_rate)
        .with_context(|| format!("failed to open {}", wav_path.display()))?;
    if cli.loop_replay {
        source = source.looping();
    }
    let source: Box<dyn AudioSource> = Box::new(source);

    let app = if cli.quiet {
        App::new(config.clone()).quiet()
    } else {
        App::new(config.clone())
    };

    let handle = app
        .start(
            Arc::new(MemoryBus::with_capacity(config.bus.capacity)),
            source,
            Arc::new(LoudnessClassifier::new()),
            Arc::new(LogTuner),
        )
        .await?;

    if !cli.quiet {
        eprintln!(
            "{} monitoring {:.3} MHz (fallback {:.3} MHz), feeds on {}",
            "adhop".bold().green(),
            config.stations.primary / 1e6,
            config.stations.secondary / 1e6,
            handle.feed_addr()
        );
        eprintln!("press Ctrl-C to stop");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    if !cli.quiet {
        eprintln!("\nadhop: shutting down...");
    }
    handle.stop().await;

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    }
    .with_env_overrides();

    // CLI flags override file and environment.
    if let Some(primary) = cli.primary {
        config.stations.primary = primary;
    }
    if let Some(secondary) = cli.secondary {
        config.stations.secondary = secondary;
    }
    if let Some(listen) = &cli.listen {
        config.hub.listen = listen.clone();
    }
    if let Some(window) = cli.window {
        config.audio.window_secs = window;
    }
    if let Some(batch) = cli.batch {
        config.audio.batch_ms = batch;
    }

    Ok(config)
}
