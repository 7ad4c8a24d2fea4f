//! svm command-line interface.

mod export;
mod report;
mod samples;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use svm_core::{Circuit, ComponentKind};
use svm_parser::{parse_initial_conditions, parse_named};
use svm_solver::{RunConfig, SingularPolicy, StimulusSelection, TransientParams, run_simulation};

#[derive(Parser)]
#[command(name = "svm")]
#[command(about = "State-variable transient simulator for linear circuits", long_about = None)]
#[command(version)]
struct Cli {
    /// Input netlist file
    #[arg(value_name = "FILE", required_unless_present = "write_samples")]
    input: Option<PathBuf>,

    /// Simulation end time in seconds (default depends on the circuit)
    #[arg(long, value_name = "SECONDS")]
    t_end: Option<f64>,

    /// Integration step in seconds (default depends on the circuit)
    #[arg(long, value_name = "SECONDS")]
    dt: Option<f64>,

    /// Initial node voltages, e.g. "1=5.0 2=0"
    #[arg(long, value_name = "LIST")]
    ic: Option<String>,

    /// Ramp this source instead of the `U...` naming rule (repeatable)
    #[arg(long = "stimulus", value_name = "NAME")]
    stimuli: Vec<String>,

    /// Start every capacitor at this voltage
    #[arg(long, value_name = "VOLTS")]
    seed_capacitors: Option<f64>,

    /// Fail instead of zero-filling when a perturbation system is singular
    #[arg(long)]
    strict: bool,

    /// Directory for waveform CSV files
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// Write a JSON trace of the whole run
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Write the bundled sample circuits into DIR and exit
    #[arg(long = "write-examples", value_name = "DIR")]
    write_samples: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(dir) = &cli.write_samples {
        let written = samples::write_samples(dir)?;
        println!(
            "Wrote {} sample circuit(s) to {}",
            written.len(),
            dir.display()
        );
        for path in written {
            println!("  {}", path.display());
        }
        return Ok(());
    }

    match &cli.input {
        Some(input) => simulate(input, &cli),
        None => bail!("no input netlist given"),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn simulate(input: &Path, cli: &Cli) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read netlist: {}", input.display()))?;

    let designation = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "circuit".to_string());

    let circuit = parse_named(&content, &designation)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let (default_end, default_dt) = default_timing(&circuit, &designation);
    let params = TransientParams::new(
        cli.t_end.unwrap_or(default_end),
        cli.dt.unwrap_or(default_dt),
    );

    let mut config = RunConfig::new(params);
    config.designation = Some(designation.clone());
    config.capacitor_seed = cli.seed_capacitors;
    if cli.strict {
        config.singular_policy = SingularPolicy::Error;
    }
    if !cli.stimuli.is_empty() {
        config.stimuli = StimulusSelection::Named(cli.stimuli.clone());
    }
    if let Some(ic) = &cli.ic {
        config.initial_voltages =
            Some(parse_initial_conditions(ic).context("Invalid --ic list")?);
    }

    let report = run_simulation(&circuit, &config).context("Simulation failed")?;

    report::print_report(&designation, &report);

    let written = export::export_waveforms(&cli.output, &designation, &report.transient)?;
    if !written.is_empty() {
        println!();
        println!(
            "Waveforms written to {}",
            cli.output.join(&designation).display()
        );
        for path in &written {
            println!("  -> {}", path.display());
        }
    }

    if let Some(trace_path) = &cli.trace {
        let json = serde_json::to_string_pretty(&report.trace())?;
        fs::write(trace_path, json)
            .with_context(|| format!("Failed to write trace: {}", trace_path.display()))?;
        println!("Trace written to {}", trace_path.display());
    }

    Ok(())
}

/// End time and step used when none are given on the command line.
fn default_timing(circuit: &Circuit, designation: &str) -> (f64, f64) {
    let fast = circuit.components().iter().any(|c| match c.kind {
        ComponentKind::Capacitor => c.value < 1e-9,
        ComponentKind::Inductor => c.value < 1e-6,
        _ => false,
    });

    if fast {
        (40e-9, 1e-12)
    } else if designation.contains("LC") {
        (20.0, 0.01)
    } else if designation.contains("step") {
        (0.01, 1e-6)
    } else {
        (0.01, 1e-5)
    }
}
