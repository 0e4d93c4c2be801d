/// sfx-normalize - loudness normalization for game audio assets
use clap::Parser;
use sfx_loudness::{
    FfmpegEngine, LoudnessEngine, NormalizeConfig, NormalizeError, Normalizer, RunOptions,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod discovery;
mod report;

use cli::Cli;
use report::ConsoleReporter;

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Exiting with error: {:#}", e);
            let code = match e.downcast_ref::<NormalizeError>() {
                Some(NormalizeError::Config(_)) => EXIT_CONFIG,
                _ => EXIT_FAILURE,
            };
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "sfx_normalize=debug,sfx_loudness=debug"
    } else {
        "sfx_normalize=info,sfx_loudness=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => NormalizeConfig::load_from(Some(path.as_path())),
        None => NormalizeConfig::load(),
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e
    })?;

    cli.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return Err(e.into());
    }
    tracing::debug!("Loaded configuration: {:?}", config);

    let engine = FfmpegEngine::new(config.ffmpeg_path.clone());
    if let Err(e) = engine.check_available().await {
        eprintln!("Error: ffmpeg is not installed or not on PATH.");
        eprintln!("Install it from https://ffmpeg.org/download.html");
        return Err(e.into());
    }

    let paths = match discovery::discover(&cli.paths, &config.default_audio_dir) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Create it and add audio files, or pass paths explicitly.");
            return Err(e.into());
        }
    };

    let files = discovery::to_audio_files(paths);
    if files.is_empty() && !cli.json {
        println!("No audio files found.");
        return Ok(());
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
        backup: cli.backup,
    };

    let normalizer = Normalizer::new(engine, config);
    let summary = if cli.json {
        normalizer.run(&files, options).await
    } else {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut reporter = ConsoleReporter::new(std::io::stdout(), normalizer.config(), base);
        normalizer
            .run_with_events(&files, options, |event| reporter.handle(event))
            .await
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e
    })?;

    if cli.json {
        println!("{}", report::summary_json(&summary)?);
    }

    tracing::debug!(
        "{} of {} file(s) verified after normalization",
        summary.results.iter().filter(|r| r.is_verified()).count(),
        summary.total()
    );

    Ok(())
}
