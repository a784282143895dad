//! QKD - Quantum Key Distribution noise simulator
//! Command-line interface for running measurement passes over the mock qubit bank
//!
//! ## Environment Variables
//! - `QKD_DEPOLARIZATION_RATE`: default depolarization rate (0.08)
//! - `QKD_DAMPING_RATE`: default amplitude damping rate (0.04)
//! - `QKD_AUTO_AUDIT`: run the audit after each pass (true)
//! - `QKD_SEED`: seed for reproducible runs
//! - `RUST_LOG`: tracing filter (default: `qkd=info,qkd_core=info`)

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use qkd_core::{
    Basis, DerivedKey, HISTORY_CAPACITY, KEY_HEX_LENGTH, MAX_DAMPING_RATE,
    MAX_DEPOLARIZATION_RATE, MeasurementResult, NoiseEffect, QBER_SAFETY_THRESHOLD, QUBIT_COUNT,
    QkdSession, Qubit, SecurityStatus, SessionConfig, SimulationObserver, ThresholdAnalyst,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "qkd")]
#[command(author = "Silvano Neto <dev@silvanoneto.com>")]
#[command(version = "2026.1.17")]
#[command(about = "QKD - noisy qubit bank and QBER simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run measurement passes and print the results
    Run {
        /// Number of passes (the bank is reset between passes)
        #[arg(short = 'n', long, default_value_t = 1)]
        passes: usize,

        /// Seed for the random source
        #[arg(short, long, env = "QKD_SEED")]
        seed: Option<u64>,

        /// Depolarization rate, within [0, 0.5]
        #[arg(short, long)]
        depolarization: Option<f64>,

        /// Amplitude damping rate, within [0, 0.3]
        #[arg(short = 'a', long)]
        damping: Option<f64>,

        /// Flip the basis of a qubit before each pass (repeatable)
        #[arg(short, long, value_name = "INDEX")]
        toggle: Vec<usize>,

        /// Skip the audit report
        #[arg(long)]
        no_audit: bool,

        /// Print the history as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Show simulator constants and effective configuration
    Info,
}

/// Anuncia cada chave gerada nos logs
struct KeyAnnouncer;

impl SimulationObserver for KeyAnnouncer {
    fn on_key_generated(&mut self, key: &DerivedKey) {
        tracing::debug!(prefix = &key.as_str()[..8], "key exported");
    }

    fn on_simulation_complete(&mut self, result: &MeasurementResult) {
        tracing::info!(id = result.id, qber = result.qber, at = %result.timestamp_iso(), "pass complete");
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qkd=info,qkd_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            passes,
            seed,
            depolarization,
            damping,
            toggle,
            no_audit,
            json,
        } => run_command(RunOptions {
            passes,
            seed,
            depolarization,
            damping,
            toggles: toggle,
            audit: !no_audit,
            json,
        }),
        Commands::Info => info_command(),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

struct RunOptions {
    passes: usize,
    seed: Option<u64>,
    depolarization: Option<f64>,
    damping: Option<f64>,
    toggles: Vec<usize>,
    audit: bool,
    json: bool,
}

fn run_command(options: RunOptions) -> Result<()> {
    if options.passes == 0 {
        bail!("--passes must be at least 1");
    }

    let mut config = SessionConfig::from_env().context("failed to load configuration")?;
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    config.auto_audit = config.auto_audit && options.audit;

    let mut session = QkdSession::from_config(&config).with_analyst(ThresholdAnalyst);
    session.subscribe(KeyAnnouncer);
    session
        .set_noise(
            options.depolarization.unwrap_or(config.noise.depolarization_rate),
            options.damping.unwrap_or(config.noise.damping_rate),
        )
        .context("invalid noise parameters")?;

    for pass in 0..options.passes {
        if pass > 0 {
            session.reset();
        }
        for &index in &options.toggles {
            session
                .toggle_basis(index)
                .with_context(|| format!("cannot toggle qubit {index}"))?;
        }

        let result = session.measure()?;
        session.export_key();
        if !options.json {
            print_pass(&session, &result);
        }
    }

    if options.json {
        let history = session.history().to_vec();
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else {
        print_history(&session);
    }

    Ok(())
}

fn print_pass<R: qkd_core::RandomSource, C: qkd_core::Clock>(
    session: &QkdSession<R, C>,
    result: &MeasurementResult,
) {
    println!();
    println!("{} #{}", "Measurement pass".cyan().bold(), result.id);

    let cells: Vec<String> = session.bank().iter().map(qubit_cell).collect();
    println!("  {}", cells.join(" "));
    println!(
        "  {}",
        (0..QUBIT_COUNT)
            .map(|i| format!("{i:<3}"))
            .collect::<Vec<_>>()
            .join(" ")
            .dimmed()
    );

    let status = match result.status() {
        SecurityStatus::Safe => "SAFE".green().bold(),
        SecurityStatus::Risky => "RISKY".red().bold(),
        SecurityStatus::Idle => "IDLE".dimmed(),
    };
    println!(
        "  {} {:>6.2}%   {} {:>5.1}%   {} {}",
        "QBER".bold(),
        result.qber,
        "Fidelity".bold(),
        result.fidelity(),
        "Status".bold(),
        status
    );
    println!(
        "  {} {} (depol) / {} (damp)",
        "Noise".bold(),
        result.depolarization_rate,
        result.damping_rate
    );
    println!("  {} {}", "Key".bold(), result.derived_key.as_str().yellow());

    if let Some(report) = session.analysis() {
        println!("  {} {}", "Audit".magenta().bold(), report);
    }
}

fn qubit_cell(qubit: &Qubit) -> String {
    let label = match qubit.basis() {
        Basis::Computational => "Z",
        Basis::Hadamard => "X",
    };
    let bit = qubit.measured_value().unwrap_or(qubit.bit_value());
    let marker = match qubit.noise_effect() {
        NoiseEffect::None => " ",
        NoiseEffect::Depolarized => "d",
        NoiseEffect::Damped => "a",
    };
    let text = format!("{label}{bit}{marker}");

    if qubit.is_error() {
        text.red().bold().to_string()
    } else {
        match qubit.basis() {
            Basis::Computational => text.cyan().to_string(),
            Basis::Hadamard => text.purple().to_string(),
        }
    }
}

fn print_history<R: qkd_core::RandomSource, C: qkd_core::Clock>(session: &QkdSession<R, C>) {
    let history = session.history();
    println!();
    println!(
        "{} ({}/{})",
        "History".cyan().bold(),
        history.len(),
        HISTORY_CAPACITY
    );
    println!("  {:>4}  {:>7}  {:>7}  {:>7}  {}", "id", "qber%", "depol%", "damp%", "timestamp");
    for (result, point) in history.iter().zip(history.chart_points()) {
        println!(
            "  {:>4}  {:>7.2}  {:>7.2}  {:>7.2}  {}",
            point.id,
            point.qber,
            point.depolarization,
            point.damping,
            result.timestamp_iso()
        );
    }
    if let Some(mean) = history.mean_qber() {
        println!("  {} {:.2}%", "mean QBER".bold(), mean);
    }

    println!();
    println!("{}", "Events".cyan().bold());
    for event in session.events().iter() {
        println!("  {}", event.to_string().dimmed());
    }
}

fn info_command() -> Result<()> {
    let config = SessionConfig::from_env().context("failed to load configuration")?;

    println!("{}", "QKD noise simulator".cyan().bold());
    println!();
    println!("  Qubits per bank:        {}", QUBIT_COUNT);
    println!("  Key length:             {} hex digits", KEY_HEX_LENGTH);
    println!("  History capacity:       {}", HISTORY_CAPACITY);
    println!("  Safety threshold:       QBER < {}%", QBER_SAFETY_THRESHOLD);
    println!("  Depolarization range:   [0, {}]", MAX_DEPOLARIZATION_RATE);
    println!("  Damping range:          [0, {}]", MAX_DAMPING_RATE);
    println!();
    println!("{}", "Configuration".cyan().bold());
    println!("  Depolarization rate:    {}", config.noise.depolarization_rate);
    println!("  Damping rate:           {}", config.noise.damping_rate);
    println!("  Auto audit:             {}", config.auto_audit);
    println!(
        "  Seed:                   {}",
        config
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "entropy".to_string())
    );
    Ok(())
}
