use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use motor_screening::io::{
    drive, load_report, JsonFileSink, JsonLinesSource, SampleSource, SyntheticTremorSource,
    WavAudioSource,
};
use motor_screening::telemetry;
use motor_screening::{init_logging, Domain, DomainReport, ScreeningConfig, ScreeningEngine};

#[derive(Parser, Debug)]
#[command(
    name = "screening_cli",
    about = "Offline runner for Parkinson's motor-sign screening sessions"
)]
struct Cli {
    /// Screening configuration JSON (defaults to built-in thresholds)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Also store each finalized report as <domain>.json in this directory
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// Write the session telemetry snapshot as JSON to this file
    #[arg(long, global = true)]
    telemetry: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a sustained-vowel recording
    Voice {
        #[arg(long)]
        wav: PathBuf,
        /// Samples per analysis frame
        #[arg(long, default_value_t = 1024)]
        frame: usize,
    },
    /// Replay a JSON-lines sample recording into one domain session
    Replay {
        #[arg(long)]
        domain: Domain,
        #[arg(long)]
        input: PathBuf,
    },
    /// Score a generated hand-tremor stream
    SimulateTremor {
        #[arg(long, default_value_t = 5.0)]
        frequency: f64,
        /// Peak displacement in millimetres
        #[arg(long, default_value_t = 2.0)]
        amplitude: f64,
        #[arg(long, default_value_t = 5.0)]
        seconds: f64,
        #[arg(long, default_value_t = 60.0)]
        rate: f64,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Combine stored domain reports into the overall summary
    Aggregate {
        #[arg(required = true)]
        reports: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => ScreeningConfig::default(),
    };
    config.validate().context("validating screening configuration")?;
    let mut engine = ScreeningEngine::new(config);

    match cli.command {
        Commands::Voice { wav, frame } => {
            let mut source = WavAudioSource::open(&wav, frame)
                .with_context(|| format!("loading {}", wav.display()))?;
            run_session(&mut engine, Domain::Voice, &mut source)?;
        }
        Commands::Replay { domain, input } => {
            let mut source = JsonLinesSource::open(&input)
                .with_context(|| format!("opening {}", input.display()))?;
            run_session(&mut engine, domain, &mut source)?;
        }
        Commands::SimulateTremor {
            frequency,
            amplitude,
            seconds,
            rate,
            noise,
            seed,
        } => {
            let mut source =
                SyntheticTremorSource::new(frequency, amplitude, seconds, rate, seed).with_noise(noise);
            run_session(&mut engine, Domain::Tremor, &mut source)?;
        }
        Commands::Aggregate { reports } => {
            for path in &reports {
                let report =
                    load_report(path).with_context(|| format!("loading report {}", path.display()))?;
                engine.import_report(report);
            }
            println!("{}", serde_json::to_string_pretty(&engine.summary())?);
        }
    }

    if let Some(dir) = cli.out_dir.as_deref() {
        persist(&engine, dir)?;
    }
    if let Some(path) = cli.telemetry.as_deref() {
        write_telemetry(path)?;
    }
    Ok(ExitCode::from(0))
}

/// An explicitly requested config must load; no silent fallback to defaults
fn load_config(path: &Path) -> Result<ScreeningConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
}

fn write_telemetry(path: &Path) -> Result<()> {
    let snapshot = telemetry::hub().snapshot();
    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, json).with_context(|| format!("writing telemetry to {}", path.display()))?;
    Ok(())
}

fn run_session(
    engine: &mut ScreeningEngine,
    domain: Domain,
    source: &mut dyn SampleSource,
) -> Result<DomainReport> {
    let handle = engine.start_session(domain)?;
    let report = drive(engine, handle, source)
        .with_context(|| format!("running {} session", domain))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report)
}

fn persist(engine: &ScreeningEngine, dir: &Path) -> Result<()> {
    let mut sink =
        JsonFileSink::new(dir).with_context(|| format!("creating {}", dir.display()))?;
    let stored = engine
        .persist(&mut sink)
        .with_context(|| format!("writing reports to {}", dir.display()))?;
    eprintln!("Stored {} report(s) in {}", stored, dir.display());
    Ok(())
}
