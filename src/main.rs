// src/main.rs - command-line driver for the pin resolver
use clap::{Parser, Subcommand, ValueEnum};
use pin_resolver::pins::{extract_define_mappings, extract_prompt_mappings, parse_connections};
use pin_resolver::render::{connection_table, pins_header};
use pin_resolver::{
    report, resolve, BoardCatalog, Diagnostics, PeripheralKind, PinAllocator, PinAssignmentSet,
    RawConnection, Resolution,
};
use std::path::PathBuf;

/// Resolve and repair microcontroller pin assignments
#[derive(Parser, Debug)]
#[command(name = "pin-resolver", version, about = "Board-aware pin validation and conflict repair.")]
struct Cli {
    /// Board catalog TOML file (defaults to the built-in boards)
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the boards in the catalog
    Boards,
    /// Resolve a JSON list of pin connections
    Resolve {
        /// Board key or alias (unknown boards use the generic profile)
        #[arg(short, long)]
        board: String,
        /// JSON connection file
        mapping: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Pull pin mappings out of a request text and/or generated code, then resolve them
    Extract {
        #[arg(short, long)]
        board: String,
        /// Text containing `LABEL - 19` style lines
        #[arg(long)]
        prompt: Option<PathBuf>,
        /// Source file with `#define` / `const int` pin constants
        #[arg(long)]
        code: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Allocate pins for new peripherals (e.g. --peripheral OLED=i2c)
    Allocate {
        #[arg(short, long)]
        board: String,
        #[arg(short, long = "peripheral", value_parser = parse_peripheral, number_of_values = 1)]
        peripherals: Vec<(String, PeripheralKind)>,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Human-readable connection table
    Table,
    /// C header with `#define` pin constants
    Header,
    /// JSON diagnostics payload
    Json,
    /// Pin usage summary
    Report,
}

fn parse_peripheral(s: &str) -> Result<(String, PeripheralKind), String> {
    match s.split_once('=') {
        Some((name, kind)) => Ok((name.trim().to_string(), kind.parse()?)),
        None => Err(format!("Invalid NAME=KIND: no `=` found in '{}'.", s)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let catalog = match &cli.catalog {
        Some(path) => {
            tracing::info!("Loading board catalog from: {}", path.display());
            BoardCatalog::load(path).map_err(|e| {
                tracing::error!("Failed to load catalog from '{}': {}", path.display(), e);
                e
            })?
        }
        None => BoardCatalog::builtin()?,
    };

    match cli.command {
        Commands::Boards => {
            for key in catalog.keys() {
                let profile = catalog.lookup(key)?;
                println!(
                    "{:<14} {:<22} {} pins, {} PWM, {} ADC",
                    key,
                    profile.name(),
                    profile.available_pins().len(),
                    profile.pwm_pins().len(),
                    profile.adc_pins().len()
                );
            }
        }
        Commands::Resolve {
            board,
            mapping,
            format,
        } => {
            let connections = parse_connections(&std::fs::read_to_string(&mapping)?)?;
            run(&catalog, &board, &connections, format)?;
        }
        Commands::Extract {
            board,
            prompt,
            code,
            format,
        } => {
            let mut connections = Vec::new();
            if let Some(path) = prompt {
                connections.extend(extract_prompt_mappings(&std::fs::read_to_string(path)?));
            }
            if let Some(path) = code {
                connections.extend(extract_define_mappings(&std::fs::read_to_string(path)?));
            }
            if connections.is_empty() {
                tracing::warn!("No pin mappings found in the given inputs");
            }
            run(&catalog, &board, &connections, format)?;
        }
        Commands::Allocate {
            board,
            peripherals,
            format,
        } => {
            let mut allocator = PinAllocator::new(PinAssignmentSet::new(catalog.lookup_or_generic(&board)));
            for (name, kind) in &peripherals {
                if allocator.allocate(name, *kind).is_none() {
                    tracing::warn!("No free pins left for {} ({})", name, kind);
                }
            }
            emit(&resolve(allocator.into_set()), &[], format)?;
        }
    }

    Ok(())
}

fn run(
    catalog: &BoardCatalog,
    board: &str,
    connections: &[RawConnection],
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let (set, ingest_issues) = PinAssignmentSet::from_connections(catalog.lookup_or_generic(board), connections);
    let resolution = resolve(set);
    emit(&resolution, &ingest_issues, format)
}

fn emit(
    resolution: &Resolution,
    ingest_issues: &[pin_resolver::ValidationIssue],
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut issues = ingest_issues.to_vec();
    issues.extend(resolution.issues.iter().cloned());

    match format {
        Format::Table => println!("{}", connection_table(&resolution.set)),
        Format::Header => print!("{}", pins_header(&resolution.set)),
        Format::Json => println!("{}", Diagnostics::new(&resolution.set, &issues).to_json()?),
        Format::Report => println!("{}", report(&resolution.set)),
    }

    if !matches!(format, Format::Json) {
        for issue in &issues {
            if issue.is_critical() {
                tracing::error!("{}", issue);
            } else {
                tracing::warn!("{}", issue);
            }
        }
    }
    if !resolution.is_ready() {
        tracing::error!("Pin assignment has unresolved conflicts");
    }
    Ok(())
}
