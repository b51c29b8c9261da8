//! Gridcalc - recalculate spreadsheet formulas from the command line

mod config;

use anyhow::{Context, bail};
use config::{OutputFormat, load_config};
use gridcalc_core::Document;
use gridcalc_core::storage::{write_markdown, write_values_csv};
use gridcalc_engine::engine::CellRef;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("Usage: gridcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    CSV sheet to recalculate");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate one formula and print the result");
    eprintln!("  -o, --output <FILE>       Write results to a file (.md for markdown)");
    eprintln!("  -f, --format <FORMAT>     Output format: csv or markdown");
    eprintln!("  --config <FILE>           Read settings from a TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Args {
    file_path: Option<PathBuf>,
    command: Option<String>,
    output_file: Option<PathBuf>,
    format: Option<OutputFormat>,
    config_file: Option<PathBuf>,
    no_config: bool,
    help: bool,
}

fn take_value(args: &[String], i: &mut usize, name: &str) -> anyhow::Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .with_context(|| format!("{} requires a value", name))
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => parsed.help = true,
            "-c" | "--command" => parsed.command = Some(take_value(args, &mut i, "--command")?),
            "-o" | "--output" => {
                parsed.output_file = Some(PathBuf::from(take_value(args, &mut i, "--output")?));
            }
            "-f" | "--format" => {
                let name = take_value(args, &mut i, "--format")?;
                let format = OutputFormat::parse(&name)
                    .with_context(|| format!("Unknown format: {}", name))?;
                parsed.format = Some(format);
            }
            "--config" => {
                parsed.config_file = Some(PathBuf::from(take_value(args, &mut i, "--config")?));
            }
            "--no-config" => parsed.no_config = true,
            arg if arg.starts_with('-') => bail!("Unknown option: {}", arg),
            arg => {
                if parsed.file_path.is_some() {
                    bail!("Unexpected argument: {}", arg);
                }
                parsed.file_path = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }
    Ok(parsed)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let (config, warnings) = load_config(args.config_file.as_ref(), !args.no_config);
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut doc = Document::with_options(config.engine.clone());

    if let Some(formula) = args.command {
        return Ok(run_command(&mut doc, &formula));
    }

    let Some(path) = args.file_path else {
        print_usage();
        bail!("No input file given");
    };
    doc.load_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    match args.output_file {
        Some(output_path) => {
            let format = args
                .format
                .unwrap_or_else(|| OutputFormat::from_path(&output_path));
            match format {
                OutputFormat::Csv => doc.export_csv(&output_path),
                OutputFormat::Markdown => doc.export_markdown(&output_path),
            }
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match args.format.unwrap_or(config.output_format) {
                OutputFormat::Csv => write_values_csv(&mut out, doc.computed())?,
                OutputFormat::Markdown => write_markdown(&mut out, doc.computed())?,
            }
            out.flush()?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Evaluate a single formula in an otherwise empty sheet.
fn run_command(doc: &mut Document, formula: &str) -> ExitCode {
    let formula = formula.trim();
    let input = if formula.starts_with('=') {
        formula.to_string()
    } else {
        format!("={}", formula)
    };

    let target = CellRef::new(0, 0);
    doc.set_cell_from_input(target, &input);
    println!("{}", doc.get_cell_display(&target));

    let failed = doc
        .computed()
        .first()
        .and_then(|row| row.first())
        .is_some_and(|cell| cell.is_error());
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
