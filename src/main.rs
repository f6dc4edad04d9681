use std::fs;
use std::io::{self, Read, Write};
use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use flatpath::{FlattenError, FormatOptions, Matrix, Shape, flatten_batch, flatten_shape};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{Level, debug, error, info};

#[derive(Parser)]
#[command(name = "flatpath")]
#[command(about = "Bake transforms into SVG path data and minify it", long_about = None)]
struct Cli {
    /// Input file with one path per line (use - for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Matrix to apply: "matrix(a, b, c, d, e, f)" or six numbers
    #[arg(short, long)]
    matrix: Option<Matrix>,

    /// Precision for coordinates (decimal places, or "full")
    #[arg(short, long, value_parser = parse_precision)]
    precision: Option<Precision>,

    /// Options file (TOML); flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Separate every command and operand
    #[arg(long)]
    no_minify: bool,

    /// Keep all commands absolute
    #[arg(long)]
    absolute: bool,

    /// Do not use H, V, S and T commands
    #[arg(long)]
    no_shorthands: bool,

    /// Replace arcs with cubic curves
    #[arg(long)]
    arcs_to_cubic: bool,

    /// Cubic segments per quarter turn when replacing arcs
    #[arg(long)]
    arc_accuracy: Option<NonZeroU32>,

    /// Read shape descriptors ("circle 50 50 40") instead of path data
    #[arg(long)]
    shapes: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::D)]
    emit: Emit,

    /// Print size comparison
    #[arg(short, long)]
    stats: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// One path per line
    D,
    /// A JSON array with one record per input line
    Json,
}

#[derive(Clone, Copy)]
struct Precision(Option<u8>);

fn parse_precision(s: &str) -> Result<Precision, String> {
    if s == "full" {
        return Ok(Precision(None));
    }
    s.parse()
        .map(|n| Precision(Some(n)))
        .map_err(|e| format!("{e}; expected decimal places or \"full\""))
}

#[derive(Serialize)]
struct Record<'a> {
    line: usize,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let options = build_options(&cli)?;
    let matrix = cli.matrix.unwrap_or_default();
    debug!(?options, ?matrix, "starting");

    // Read input
    let input = if cli.input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&cli.input)?
    };

    // (line number, text) of every non-blank line
    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    let results: Vec<Result<String, FlattenError>> = if cli.shapes {
        lines
            .par_iter()
            .map(|(_, l)| flatten_shape(&l.parse::<Shape>()?, &matrix, &options))
            .collect()
    } else {
        let texts: Vec<&str> = lines.iter().map(|(_, l)| *l).collect();
        flatten_batch(&texts, &matrix, &options)
    };

    let mut failed = 0;
    let mut input_len = 0;
    let mut output_len = 0;
    let mut records = Vec::with_capacity(lines.len());

    for (&(line, text), result) in lines.iter().zip(results) {
        match result {
            Ok(d) => {
                input_len += text.len();
                output_len += d.len();
                records.push(Record {
                    line,
                    input: text,
                    d: Some(d),
                    error: None,
                });
            }
            Err(err) => {
                failed += 1;
                error!(line, %err, "skipping input");
                records.push(Record {
                    line,
                    input: text,
                    d: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    let mut output = match cli.emit {
        Emit::D => records
            .iter()
            .filter_map(|r| r.d.as_deref())
            .collect::<Vec<_>>()
            .join("\n"),
        Emit::Json => serde_json::to_string_pretty(&records)?,
    };
    if !output.is_empty() {
        output.push('\n');
    }

    // Write output
    if cli.output.as_os_str() == "-" {
        io::stdout().write_all(output.as_bytes())?;
    } else {
        fs::write(&cli.output, &output)?;
    }

    info!(total = lines.len(), failed, "done");

    // Print stats if requested
    if cli.stats {
        let saved = input_len.saturating_sub(output_len);
        let percent = if input_len > 0 {
            (saved as f64 / input_len as f64) * 100.0
        } else {
            0.0
        };
        eprintln!(
            "{} -> {} bytes ({:.1}% smaller)",
            input_len, output_len, percent
        );
    }

    if failed > 0 {
        return Err(format!("{failed} of {} inputs failed", lines.len()).into());
    }

    Ok(())
}

fn build_options(cli: &Cli) -> Result<FormatOptions, Box<dyn std::error::Error>> {
    let mut options = match &cli.config {
        Some(path) => FormatOptions::from_toml_str(&fs::read_to_string(path)?)?,
        None => FormatOptions::default(),
    };

    if let Some(Precision(decimals)) = cli.precision {
        options.decimal_places = decimals;
    }
    if cli.no_minify {
        options.minify = false;
    }
    if cli.absolute {
        options.prefer_relative = false;
    }
    if cli.no_shorthands {
        options.use_shorthands = false;
    }
    if cli.arcs_to_cubic {
        options.convert_arcs_to_beziers = true;
    }
    if let Some(accuracy) = cli.arc_accuracy {
        options.arc_accuracy = accuracy;
    }

    Ok(options)
}
