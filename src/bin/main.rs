//! cubeport CLI - export cells and read values from an OLAP cube
//!
//! Usage:
//!   cubeport export <cube> [--select DIM=a,b] [--except DIM=a] [--output <file>]
//!   cubeport elements <dimension>
//!   cubeport value <cube> <cell>...
//!
//! Examples:
//!   cubeport export Sales --select Year=2020,2021 --output sales.csv
//!   cubeport -c local elements Region
//!   cubeport value Sales 2021,North 2021,South

use clap::{Parser, Subcommand, ValueEnum};
use cubeport::config::{ConnectionSettings, Settings, SettingsError};
use cubeport::dimension::list_elements;
use cubeport::export::{ExportOptions, ValueFilter};
use cubeport::transport::HttpTransport;
use cubeport::{AreaBuilder, CellValue, Coordinates, Cube, CubeError};
use log::{LevelFilter, Metadata, Record};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cubeport")]
#[command(about = "cubeport - Bulk export and point reads for CSV-over-HTTP OLAP cubes")]
#[command(version)]
struct Cli {
    /// Path to a config file (defaults to the usual search order)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Named connection from the config file
    #[arg(short, long, global = true)]
    connection: Option<String>,

    /// Database to use instead of the connection's
    #[arg(long, global = true)]
    database: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an area of a cube as CSV
    Export {
        /// Cube name
        cube: String,

        /// Restrict a dimension: DIM=elem1,elem2
        #[arg(short, long)]
        select: Vec<String>,

        /// Every element of a dimension but these: DIM=elem1,elem2
        #[arg(short = 'x', long)]
        except: Vec<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cells per page
        #[arg(long)]
        blocksize: Option<usize>,

        /// Include empty cells
        #[arg(long)]
        include_empty: bool,

        /// Base elements only
        #[arg(long)]
        base_only: bool,

        /// Value types to export
        #[arg(long = "type")]
        value_type: Option<TypeArg>,

        /// Replace tabs and line breaks in values
        #[arg(long)]
        sanitize: bool,
    },

    /// List the elements of a dimension
    Elements {
        /// Dimension name
        dimension: String,
    },

    /// Read cells; one cell is a comma separated element list in cube order
    Value {
        /// Cube name
        cube: String,

        /// Cells to read
        #[arg(required = true)]
        cells: Vec<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum TypeArg {
    Both,
    Numeric,
    String,
}

impl From<TypeArg> for ValueFilter {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Both => ValueFilter::Both,
            TypeArg::Numeric => ValueFilter::Numeric,
            TypeArg::String => ValueFilter::String,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Cube(#[from] CubeError),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Usage(String),
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_settings(&cli).and_then(|settings| match cli.command {
        Commands::Export {
            ref cube,
            ref select,
            ref except,
            ref output,
            blocksize,
            include_empty,
            base_only,
            ref value_type,
            sanitize,
        } => {
            let mut options = settings.export.clone();
            if let Some(blocksize) = blocksize {
                options = options.with_blocksize(blocksize);
            }
            if include_empty {
                options = options.with_skip_empty(false);
            }
            if let Some(value_type) = value_type {
                options = options.with_value_filter(value_type.clone().into());
            }
            if base_only {
                options = options.with_base_only(true);
            }
            if sanitize {
                options = options.with_sanitize_values(true);
            }
            cmd_export(&cli, &settings, cube, select, except, output.as_ref(), &options)
        }
        Commands::Elements { ref dimension } => cmd_elements(&cli, &settings, dimension),
        Commands::Value { ref cube, ref cells } => cmd_value(&cli, &settings, cube, cells),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    Ok(match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    })
}

fn connect(
    cli: &Cli,
    settings: &Settings,
) -> Result<(Arc<HttpTransport>, String), CliError> {
    let conn: &ConnectionSettings = settings.connection(cli.connection.as_deref())?;
    let transport = HttpTransport::from_settings(conn)?;
    let database = cli.database.clone().unwrap_or_else(|| conn.database.clone());
    Ok((Arc::new(transport), database))
}

/// Split `DIM=a,b` into the dimension and its element names.
fn parse_selection(arg: &str) -> Result<(&str, Vec<&str>), CliError> {
    let (dimension, elements) = arg
        .split_once('=')
        .ok_or_else(|| CliError::Usage(format!("expected DIM=elem,..., got '{}'", arg)))?;
    Ok((dimension.trim(), elements.split(',').map(str::trim).collect()))
}

fn cmd_export(
    cli: &Cli,
    settings: &Settings,
    cube_name: &str,
    select: &[String],
    except: &[String],
    output: Option<&PathBuf>,
    options: &ExportOptions,
) -> Result<(), CliError> {
    let (transport, database) = connect(cli, settings)?;
    let cube = Cube::open(transport, database, cube_name)?;

    let mut builder = AreaBuilder::new();
    for arg in select {
        let (dimension, elements) = parse_selection(arg)?;
        builder = builder.add_elements(dimension, &elements);
    }
    for arg in except {
        let (dimension, elements) = parse_selection(arg)?;
        builder = builder.all_except(dimension, &elements);
    }
    let area = cube.build_area(&builder)?;
    log::info!(
        "exporting {} cells of '{}' (area {})",
        area.cell_count(cube.resolver())?,
        cube.name(),
        area
    );

    match output {
        Some(path) => {
            let mut spooled = cube.export_to_spool(&area, options)?;
            let mut file = File::create(path)?;
            io::copy(&mut spooled, &mut file)?;
        }
        None => {
            let mut writer = csv::Writer::from_writer(io::stdout().lock());
            for row in cube.export(&area, options) {
                writer.write_record(&row?).map_err(CubeError::from)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn cmd_elements(cli: &Cli, settings: &Settings, dimension: &str) -> Result<(), CliError> {
    let (transport, database) = connect(cli, settings)?;
    for element in list_elements(&*transport, &database, dimension)? {
        println!(
            "{}\t{}\t{:?}\t{}",
            element.id, element.name, element.element_type, element.level
        );
    }
    Ok(())
}

fn cmd_value(cli: &Cli, settings: &Settings, cube_name: &str, cells: &[String]) -> Result<(), CliError> {
    let (transport, database) = connect(cli, settings)?;
    let cube = Cube::open(transport, database, cube_name)?;
    let coords: Vec<Vec<&str>> = cells
        .iter()
        .map(|cell| cell.split(',').map(str::trim).collect())
        .collect();

    if let [single] = coords.as_slice() {
        println!("{}", cube.value(&Coordinates::positional(single))?);
        return Ok(());
    }

    let mut cache = cube.batch();
    cache.start_collecting(settings.cache.reset_on_collect);
    for names in &coords {
        cache.request(&Coordinates::positional(names))?;
    }
    cache.flush()?;
    for (cell, names) in cells.iter().zip(&coords) {
        let value: CellValue = cache.request(&Coordinates::positional(names))?;
        println!("{}\t{}", cell, value);
    }
    Ok(())
}
