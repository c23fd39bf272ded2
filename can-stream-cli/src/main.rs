//! CAN Stream Decoder CLI Application
//!
//! Reads candump-style lines from stdin and prints one decoded record per
//! recognised frame, using the can-stream-decoder library:
//! - `--bus=<name>:<dbc>` binds a bus to a DBC catalog (repeatable)
//! - `--json` switches to structured output
//! - `--config` loads buses and output settings from a TOML file

use anyhow::Result;
use can_stream_decoder::{BusRegistry, BusSpec, Dispatcher};
use clap::error::ErrorKind;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

mod config;

use config::{ArgumentError, CliOverrides};

/// CAN Stream Decoder - Decode candump lines with DBC catalogs
#[derive(Parser, Debug)]
#[command(name = "can-stream-cli")]
#[command(about = "Decode candump lines from stdin using per-bus DBC files", long_about = None)]
#[command(version)]
struct Args {
    /// Bus binding <bus name>:<DBC filename> (can be repeated)
    #[arg(long, value_name = "NAME:FILE", value_parser = parse_bus_spec)]
    bus: Vec<BusSpec>,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only decode this message ID, in hex (can be repeated)
    #[arg(long = "id", value_name = "HEX", value_parser = parse_hex_id)]
    ids: Vec<u32>,

    /// Leave out multiplexed signals not selected by the multiplexor
    #[arg(long)]
    skip_inactive_mux: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_bus_spec(s: &str) -> std::result::Result<BusSpec, String> {
    s.parse::<BusSpec>().map_err(|e| e.to_string())
}

fn parse_hex_id(s: &str) -> std::result::Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("'{}' is not a hex message ID: {}", s, e))
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return report_clap_error(e),
    };

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Stream Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_stream_decoder::VERSION);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<ArgumentError>() {
                Some(arg_err) => format!("Argument error: {}", arg_err),
                None => format!("error: {:#}", e),
            };
            report_line(&mut io::stdout(), &message);
            ExitCode::FAILURE
        }
    }
}

/// Help and version go to stdout with success; anything else is a one-line
/// argument error.
fn report_clap_error(e: clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = e.print();
            ExitCode::SUCCESS
        }
        _ => {
            let rendered = e.to_string();
            let first_line = rendered.lines().next().unwrap_or_default();
            report_line(
                &mut io::stdout(),
                &format!("Argument error: {}", first_line.trim_start_matches("error: ")),
            );
            ExitCode::FAILURE
        }
    }
}

/// Write a one-line report, ignoring write errors
fn report_line<W: Write>(out: &mut W, message: &str) {
    let _ = writeln!(out, "{}", message);
    let _ = out.flush();
}

/// Load catalogs, then decode stdin until end of stream
fn run(args: &Args) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            Some(config::load_config(path)?)
        }
        None => None,
    };

    let settings = config::resolve_settings(
        file_config,
        CliOverrides {
            buses: args.bus.clone(),
            json: args.json,
            message_ids: args.ids.clone(),
            skip_inactive_multiplexed: args.skip_inactive_mux,
        },
    )?;
    log::debug!("Resolved settings: {:?}", settings);

    // Every catalog is loaded before the first line is read
    let registry = BusRegistry::load(&settings.buses)?;
    let dispatcher = Dispatcher::new(registry, settings.decoder);

    log::info!(
        "Decoding stdin ({} output)",
        dispatcher.config().output_format
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stats = dispatcher.run(stdin.lock(), &mut out)?;

    log::info!(
        "End of stream: {} lines, {} frames, {} decoded, {} decode failures",
        stats.lines,
        stats.frames,
        stats.emitted,
        stats.decode_failures
    );

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
