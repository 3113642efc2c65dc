//! Rain-type classification driver.
//!
//! Reads a reflectivity grid from JSON (`data`/`width`/`height`, missing
//! cells as `null` or as the sentinel value), classifies it, and writes the
//! integer rain-type codes with the sentinel re-applied at originally
//! missing cells.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use raintype_core::{classify_rain_types, RainType, RainTypeParams, ReflectivityGrid};

#[derive(Parser, Debug)]
#[command(name = "classify", about = "Rain-type classification of gridded radar reflectivity")]
struct Args {
    /// Input reflectivity grid JSON file.
    #[arg(short, long)]
    input: String,

    /// Output classification JSON file.
    #[arg(short, long, default_value = "raintype.json")]
    output: String,

    /// Optional parameters JSON file; S-band tropical-marine defaults
    /// otherwise.
    #[arg(short, long)]
    params: Option<String>,

    /// Missing-value sentinel used in the input and re-applied on output.
    #[arg(long, default_value_t = -9999.0)]
    missing_value: f32,

    /// Grid spacing in km (overrides the parameter file).
    #[arg(long)]
    grid_spacing: Option<f32>,

    /// Log level.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn null_as_nan_vec<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<f32>, D::Error> {
    let v: Vec<Option<f32>> = Vec::deserialize(d)?;
    Ok(v.into_iter().map(|x| x.unwrap_or(f32::NAN)).collect())
}

#[derive(Deserialize)]
struct GridFile {
    #[serde(deserialize_with = "null_as_nan_vec")]
    data: Vec<f32>,
    width: usize,
    height: usize,
}

#[derive(Serialize)]
struct OutputFile {
    /// Rain-type codes 0-6, or the missing sentinel where input was missing.
    types: Vec<i32>,
    width: usize,
    height: usize,
    counts: CategoryCounts,
}

#[derive(Serialize)]
struct CategoryCounts {
    no_echo: usize,
    stratiform: usize,
    convective: usize,
    uncertain: usize,
    iso_conv_core: usize,
    iso_conv_fringe: usize,
    weak_echo: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read input grid {}", args.input))?;
    let grid_file: GridFile =
        serde_json::from_str(&raw).context("input is not a valid grid JSON file")?;

    let mut params = match &args.params {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read parameter file {path}"))?;
            serde_json::from_str::<RainTypeParams>(&raw)
                .context("parameter file is not valid JSON")?
        }
        None => RainTypeParams::default(),
    };
    if let Some(dx) = args.grid_spacing {
        params.grid_spacing_km = dx;
    }

    let grid = ReflectivityGrid::from_sentinel(
        grid_file.data,
        grid_file.width,
        grid_file.height,
        args.missing_value,
    )?;
    info!(
        width = grid.width,
        height = grid.height,
        valid = grid.valid_count(),
        dx_km = params.grid_spacing_km,
        "classifying"
    );

    let map = classify_rain_types(&grid, params)?;

    // Re-apply the sentinel where the input had no data, as the reference
    // driver writes its files.
    let sentinel = args.missing_value as i32;
    let types: Vec<i32> = map
        .types
        .iter()
        .zip(&grid.data)
        .map(|(&t, &dbz)| {
            if dbz.is_nan() {
                sentinel
            } else {
                t.code() as i32
            }
        })
        .collect();

    let c = map.counts();
    let counts = CategoryCounts {
        no_echo: c[RainType::NoEcho.code() as usize],
        stratiform: c[RainType::Stratiform.code() as usize],
        convective: c[RainType::Convective.code() as usize],
        uncertain: c[RainType::Uncertain.code() as usize],
        iso_conv_core: c[RainType::IsoConvCore.code() as usize],
        iso_conv_fringe: c[RainType::IsoConvFringe.code() as usize],
        weak_echo: c[RainType::WeakEcho.code() as usize],
    };
    info!(
        stratiform = counts.stratiform,
        convective = counts.convective,
        uncertain = counts.uncertain,
        weak_echo = counts.weak_echo,
        "classification complete"
    );

    let out = OutputFile {
        types,
        width: map.width,
        height: map.height,
        counts,
    };
    fs::write(&args.output, serde_json::to_string(&out)?)
        .with_context(|| format!("failed to write {}", args.output))?;
    info!(output = %args.output, "wrote classification");

    Ok(())
}
