use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midicsv_time::config::{self, Config};
use midicsv_time::midicsv::{self, MidiCsvError, MidiCsvProcessor};

/// Convert midicsv tick timing into seconds
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input file (.mid, .midi, .kar or midicsv .csv)
    #[arg(required = true)]
    input_file: PathBuf,

    /// Write output to this file instead of the console
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// List paired notes with start times and durations instead of timed rows
    #[arg(short, long)]
    notes: bool,

    /// Decode binary MIDI files without the external midicsv program
    #[arg(short, long)]
    builtin: bool,

    /// Decimal places for seconds
    #[arg(short, long)]
    precision: Option<usize>,

    /// Configuration file to use instead of ./config.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "midicsv_time=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(args: &Args) -> Result<Config, MidiCsvError> {
    let mut config = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    if args.builtin {
        config.converter.builtin = true;
    }
    if let Some(precision) = args.precision {
        config.output.precision = precision;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), MidiCsvError> {
    let config = load_config(args)?;
    let processor = MidiCsvProcessor::from_config(&config);
    let conversion = processor.process_file(&args.input_file)?;

    if !conversion.skipped.is_empty() {
        eprintln!("Skipped {} malformed rows", conversion.skipped.len());
    }

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let precision = config.output.precision;
    if args.notes {
        midicsv::write_notes(&conversion.notes(), precision, &mut writer)?;
    } else {
        midicsv::write_rows(&conversion.rows, precision, &mut writer)?;
    }

    Ok(())
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        eprintln!("\nERROR: {}\n", err);
        match err {
            MidiCsvError::Io(ref io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                eprintln!("Please check that:");
                eprintln!("1. The file path is correct");
                eprintln!("2. The file exists");
                eprintln!("3. You have permission to read the file");
            }
            MidiCsvError::ConverterUnavailable { .. } => {
                eprintln!("Is midicsv installed and on your PATH?");
                eprintln!("Use --builtin to decode MIDI files without it.");
            }
            _ => {}
        }
        process::exit(1);
    }
}
