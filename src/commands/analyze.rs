use crate::gpxxml::extract_raw_samples;
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use time::Duration;
use tracing::info;
use trackpace::format::{
    format_distance, format_duration, format_elevation, format_optional, format_pace,
};
use trackpace::{AnalysisResult, AnalyzerConfig, analyze_with};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct AnalyzeOptions {
    pub input: Option<PathBuf>,
    pub format: OutputFormat,
    pub min_speed: f64,
    pub min_interval: f64,
    pub include_points: bool,
}

#[derive(Serialize)]
struct JsonReport {
    #[serde(flatten)]
    result: AnalysisResult,
    point_count: usize,
}

pub fn analyze_command(options: &AnalyzeOptions) -> Result<()> {
    let config = build_config(options.min_speed, options.min_interval)?;
    let input = read_input(options.input.as_deref())?;

    let samples = extract_raw_samples(&input)?;
    let result = analyze_with(&samples, &config)?;
    info!(
        samples = samples.len(),
        points = result.points.len(),
        distance_m = result.total_distance,
        "track analyzed"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match options.format {
        OutputFormat::Text => write_text_report(&result, &mut out)?,
        OutputFormat::Json => write_json_report(result, options.include_points, &mut out)?,
    }

    Ok(())
}

fn build_config(min_speed: f64, min_interval: f64) -> Result<AnalyzerConfig> {
    if !min_speed.is_finite() || min_speed < 0.0 {
        bail!("minimum speed must be a non-negative number of km/h, got {min_speed}");
    }
    if !min_interval.is_finite() || !(0.0..=86_400.0).contains(&min_interval) {
        bail!("minimum interval must be between 0 and 86400 seconds, got {min_interval}");
    }

    Ok(AnalyzerConfig {
        min_speed_kmh: min_speed,
        min_interval: Duration::seconds_f64(min_interval),
    })
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut input = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

fn write_text_report<W: Write>(result: &AnalysisResult, mut out: W) -> io::Result<()> {
    writeln!(out, "Distance:        {}", format_distance(result.total_distance))?;
    writeln!(
        out,
        "Duration:        {}",
        format_optional(result.duration, format_duration)
    )?;
    writeln!(
        out,
        "Average pace:    {}",
        format_optional(result.average_pace, format_pace)
    )?;
    writeln!(
        out,
        "Elevation gain:  {}",
        format_elevation(result.elevation_gain)
    )?;
    writeln!(out, "Points:          {}", result.points.len())
}

/// Serializes the result itself; an emptied `points` list is left out.
fn write_json_report<W: Write>(
    mut result: AnalysisResult,
    include_points: bool,
    mut out: W,
) -> Result<()> {
    let point_count = result.points.len();
    if !include_points {
        result.points.clear();
    }
    let report = JsonReport {
        result,
        point_count,
    };

    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}
