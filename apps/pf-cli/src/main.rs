use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use pf_config::ConfigMap;
use pf_core::OutputVector;
use pf_model::{ModelFactory, PrognosticsModel, SystemModel};
use pf_prognoser::{DataStore, PrognoserFactory};
use pf_sim::{
    ConstLoadEstimator, LoadEstimator, MonteCarloPredictor, SimOptions, StateEstimate,
    load_estimator_from_config, simulate_to_threshold,
};
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] pf_config::ConfigError),

    #[error(transparent)]
    Model(#[from] pf_core::PfError),

    #[error(transparent)]
    Sim(#[from] pf_sim::SimError),

    #[error(transparent)]
    Prognoser(#[from] pf_prognoser::PrognoserError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}:{line}: {reason}")]
    Data {
        path: String,
        line: usize,
        reason: String,
    },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pf-cli")]
#[command(about = "ProgFlow CLI - model-based prognostics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a model from full health until its threshold
    Simulate {
        /// Path to the configuration file (key:value, YAML or JSON)
        config_path: PathBuf,
        /// Constant load, overriding the configured load estimator
        #[arg(long)]
        load: Option<f64>,
        /// Time step in seconds
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
        /// Simulated span in seconds
        #[arg(long, default_value_t = 5000.0)]
        horizon: f64,
        /// Print every N-th step
        #[arg(long, default_value_t = 100)]
        every: usize,
    },
    /// Predict the time of event from full health
    Predict {
        /// Path to the configuration file
        config_path: PathBuf,
        /// Constant load, overriding the configured load estimator
        #[arg(long)]
        load: Option<f64>,
    },
    /// Drive the configured prognoser over recorded sensor data
    Run {
        /// Path to the configuration file
        config_path: PathBuf,
        /// Sensor data as `time,tag,value` lines
        #[arg(long)]
        data: Option<PathBuf>,
        /// Number of prognoser loops
        #[arg(long, default_value_t = 1)]
        loops: usize,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config_path,
            load,
            dt,
            horizon,
            every,
        } => cmd_simulate(&config_path, load, dt, horizon, every),
        Commands::Predict { config_path, load } => cmd_predict(&config_path, load),
        Commands::Run {
            config_path,
            data,
            loops,
        } => cmd_run(&config_path, data.as_deref(), loops),
    }
}

fn build_model(config: &ConfigMap) -> CliResult<Box<dyn PrognosticsModel>> {
    let name = config.str_or("model", "Battery")?;
    Ok(ModelFactory::with_builtins().create(name, config)?)
}

fn build_load(config: &ConfigMap, load: Option<f64>) -> CliResult<Box<dyn LoadEstimator>> {
    match load {
        Some(value) => Ok(Box::new(ConstLoadEstimator::new(vec![value])?)),
        None => Ok(load_estimator_from_config(config)?),
    }
}

fn input_parameters(config: &ConfigMap) -> CliResult<Vec<f64>> {
    if config.includes("Predictor.inputParameters") {
        Ok(config.get_f64_list("Predictor.inputParameters")?)
    } else {
        Ok(Vec::new())
    }
}

/// Initial state from `Simulation.initialOutputs`; outputs left out are unknown (NaN).
fn initial_state(
    model: &dyn PrognosticsModel,
    config: &ConfigMap,
    load: &dyn LoadEstimator,
) -> CliResult<pf_core::StateVector> {
    let mut z = OutputVector::from_vec(vec![f64::NAN; model.output_names().len()]);
    if config.includes("Simulation.initialOutputs") {
        let values = config.get_f64_list("Simulation.initialOutputs")?;
        for (i, v) in values.into_iter().enumerate() {
            z.set(i, v)?;
        }
    }
    let u = model.input_eqn(0.0, &input_parameters(config)?, &load.estimate_load(0.0)?)?;
    Ok(model.initialize(&u, &z)?)
}

fn cmd_simulate(
    config_path: &Path,
    load: Option<f64>,
    dt: f64,
    horizon: f64,
    every: usize,
) -> CliResult<()> {
    let config = pf_config::load(config_path)?;
    let model = build_model(&config)?;
    let load = build_load(&config, load)?;
    let x0 = initial_state(model.as_ref(), &config, load.as_ref())?;
    let params = input_parameters(&config)?;

    println!("Simulating {} (dt = {dt} s, horizon = {horizon} s)", config_path.display());
    let start = Instant::now();
    let opts = SimOptions {
        dt,
        horizon,
        record_every: every,
        ..SimOptions::default()
    };
    let record = simulate_to_threshold(model.as_ref(), 0.0, &x0, load.as_ref(), &params, &opts)?;

    let events: Vec<&str> = model.event_names().iter().collect();
    let outputs: Vec<&str> = model.output_names().iter().collect();
    let predicted: Vec<&str> = model.predicted_outputs().iter().collect();
    println!(
        "{:>10}  {}  {}  {}",
        "t",
        events.join("  "),
        outputs.join("  "),
        predicted.join("  ")
    );
    for i in 0..record.len() {
        let row: Vec<String> = record.event_state[i]
            .iter()
            .chain(record.z[i].iter())
            .chain(record.predicted[i].iter())
            .map(|v| format!("{v:.4}"))
            .collect();
        println!("{:>10.1}  {}", record.t[i], row.join("  "));
    }

    match record.time_of_event {
        Some(toe) => println!("✓ Threshold reached at t = {toe:.1} s"),
        None => println!("Threshold not reached within {horizon} s"),
    }
    println!("  Wall time: {:.3}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn cmd_predict(config_path: &Path, load: Option<f64>) -> CliResult<()> {
    let config = pf_config::load(config_path)?;
    let model = build_model(&config)?;
    let load = build_load(&config, load)?;
    let x0 = initial_state(model.as_ref(), &config, load.as_ref())?;
    let predictor = MonteCarloPredictor::from_config(&config)?;

    println!(
        "Predicting with {} samples over {} s",
        predictor.num_samples(),
        predictor.horizon()
    );
    let start = Instant::now();
    let prediction = predictor.predict(
        model.as_ref(),
        0.0,
        &StateEstimate::certain(x0),
        load.as_ref(),
    )?;

    for (name, value) in &prediction.event_state {
        println!("  Event state {name}: {value:.4}");
    }
    let event = &prediction.event;
    println!("  P({}) within horizon: {:.3}", event.name, event.probability());
    if let (Some(mean), Some(median)) = (event.mean(), event.median()) {
        println!("  Time of {}: mean {mean:.1} s, median {median:.1} s", event.name);
    }
    println!("  Wall time: {:.3}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Rows of `time,tag,value`, grouped by time in ascending order.
fn read_sensor_data(path: &Path) -> CliResult<Vec<(f64, Vec<(String, f64)>)>> {
    let content = std::fs::read_to_string(path)?;
    let mut rows: Vec<(f64, String, f64)> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let bad = |reason: &str| CliError::Data {
            path: path.display().to_string(),
            line: i + 1,
            reason: reason.to_string(),
        };
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [time, tag, value] = fields.as_slice() else {
            return Err(bad("expected time,tag,value"));
        };
        let time: f64 = time.parse().map_err(|_| bad("invalid time"))?;
        let value: f64 = value.parse().map_err(|_| bad("invalid value"))?;
        rows.push((time, tag.to_string(), value));
    }
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut grouped: Vec<(f64, Vec<(String, f64)>)> = Vec::new();
    for (time, tag, value) in rows {
        match grouped.last_mut() {
            Some((t, values)) if *t == time => values.push((tag, value)),
            _ => grouped.push((time, vec![(tag, value)])),
        }
    }
    Ok(grouped)
}

fn cmd_run(config_path: &Path, data: Option<&Path>, loops: usize) -> CliResult<()> {
    let config = pf_config::load(config_path)?;
    let store = Arc::new(DataStore::new());
    let mut prognoser = PrognoserFactory::with_builtins().build(&config, store.clone())?;
    prognoser.load_history();

    let batches = match data {
        Some(path) => read_sensor_data(path)?,
        None => Vec::new(),
    };
    println!(
        "Running {} for {loops} loop(s)",
        prognoser.settings().module_name()
    );

    for i in 0..loops {
        if let Some((time, values)) = batches.get(i) {
            for (tag, value) in values {
                store.set(tag.clone(), *value, *time);
            }
        }
        if let Err(e) = prognoser.run_cycle() {
            tracing::error!(loop_counter = i, error = %e, "error in prognoser loop, skipping step");
        }
    }
    prognoser.save_state()?;

    println!("{}", serde_json::to_string_pretty(prognoser.results())?);
    println!("✓ History saved to {}", prognoser.history().path().display());
    Ok(())
}
