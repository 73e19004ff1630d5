// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::result::Result as StdResult;

use clap::{Parser, ValueEnum};
use env_logger::Env;
use serde::Serialize;

use fngraph_engine::{FunctionManager, MAX_FUNCTIONS, Rgb, Samples, Specs};

const EXIT_FAILURE: i32 = 1;

#[macro_export]
macro_rules! die(
    ($($arg:tt)*) => { {
        eprintln!($($arg)*);
        std::process::exit(EXIT_FAILURE)
    } }
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "fngraph",
    version = env!("CARGO_PKG_VERSION"),
    about = "Sample single-parameter functions over an x-range",
    after_help = "Definitions look like 'f(x) = sin(x) * 2' or 'y = 4x^2 - 1'.\n\
                  Set RUST_LOG to override the log filter."
)]
struct Cli {
    /// Function definitions, one per argument
    #[arg(value_name = "DEFINITION", required = true)]
    definitions: Vec<String>,

    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    x_min: f64,

    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    x_max: f64,

    #[arg(long, default_value_t = 0.02)]
    step: f64,

    /// Values larger than this in magnitude are reported as undefined
    #[arg(long, default_value_t = 1.0e6)]
    max_magnitude: f64,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Path to write output to instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print each function's tokens and RPN instead of sampling it
    #[arg(long)]
    inspect: bool,

    /// Log parsing and registry activity
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    function: &'a str,
    x: f32,
    y: Option<f32>,
}

#[derive(Serialize)]
struct Curve<'a> {
    name: &'a str,
    color: Rgb,
    #[serde(flatten)]
    samples: &'a Samples,
}

/// Defined points and undefined xs merged back into x order; undefined
/// points have no y.
fn rows<'a>(name: &'a str, samples: &'a Samples) -> Vec<CsvRow<'a>> {
    let mut rows = Vec::with_capacity(samples.len());
    let mut points = samples.points.iter().peekable();
    let mut undefined = samples.undefined_xs.iter().peekable();
    loop {
        let take_point = match (points.peek(), undefined.peek()) {
            (Some(&&(px, _)), Some(&&ux)) => px < ux,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_point {
            if let Some(&(x, y)) = points.next() {
                rows.push(CsvRow {
                    function: name,
                    x,
                    y: Some(y),
                });
            }
        } else if let Some(&x) = undefined.next() {
            rows.push(CsvRow {
                function: name,
                x,
                y: None,
            });
        }
    }
    rows
}

fn write_csv(
    out: &mut dyn Write,
    curves: &[(&str, Rgb, Samples)],
) -> StdResult<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(out);
    for (name, _, samples) in curves.iter() {
        for row in rows(name, samples) {
            writer.serialize(row)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_json(
    out: &mut dyn Write,
    curves: &[(&str, Rgb, Samples)],
) -> StdResult<(), Box<dyn std::error::Error>> {
    let curves: Vec<Curve> = curves
        .iter()
        .map(|(name, color, samples)| Curve {
            name: *name,
            color: *color,
            samples,
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &curves)?;
    writeln!(out)?;
    Ok(())
}

fn run(
    cli: &Cli,
    manager: &FunctionManager,
    out: &mut dyn Write,
) -> StdResult<(), Box<dyn std::error::Error>> {
    if cli.inspect {
        for function in manager.iter() {
            write!(out, "{}", function.describe())?;
        }
        return Ok(());
    }

    let specs = Specs::new(cli.x_min, cli.x_max, cli.step)?.with_max_magnitude(cli.max_magnitude)?;
    log::debug!("sampling {} points per function", specs.sample_count());

    let curves = manager.sample_visible(&specs)?;
    match cli.format {
        Format::Csv => write_csv(out, &curves),
        Format::Json => write_json(out, &curves),
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if cli.definitions.len() > MAX_FUNCTIONS {
        die!(
            "error: at most {} definitions are supported, got {}",
            MAX_FUNCTIONS,
            cli.definitions.len()
        );
    }

    let mut manager = FunctionManager::new();
    for definition in cli.definitions.iter() {
        if let Err(err) = manager.add(definition, None) {
            eprintln!("error: '{definition}': {err}");
        }
    }
    if manager.is_empty() {
        die!("error: no valid function definitions");
    }

    let mut out: Box<dyn Write> = match cli.output {
        Some(ref path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(err) => die!("error: creating '{}': {}", path.display(), err),
        },
        None => Box::new(BufWriter::new(io::stdout())),
    };

    if let Err(err) = run(&cli, &manager, &mut *out) {
        die!("error: {err}");
    }
    if let Err(err) = out.flush() {
        die!("error: writing output: {err}");
    }
}
