use std::io;
use std::process;
use std::time::Duration;

use clap::Parser;
use vexcept_core::prelude::*;
use vexcept_protocol::{OpenOcd, DEFAULT_PORT};
use vexcept_utils::{info, init_logging_with_level, parse_u32, LogLevel};

mod output;

use output::{OutputFormat, WordWriter};

/// Recover read-protected ARMv7-M memory through relocated exception vectors.
#[derive(Parser, Debug)]
#[command(name = "vexcept")]
#[command(version)]
#[command(
    about = "Recover read-protected ARMv7-M memory through relocated exception vectors",
    long_about = None
)]
struct Cli
{
    /// Start address (0x hex, 0o octal, 0b binary or decimal)
    #[arg(value_parser = parse_u32)]
    address: u32,

    /// Number of 32-bit words to extract
    #[arg(value_parser = parse_u32)]
    length: u32,

    /// Value written for words that cannot be recovered, or "skip" to leave them out
    #[arg(long, default_value = "0xffffffff", value_parser = parse_policy)]
    value: UnavailablePolicy,

    /// Write raw little-endian words instead of text
    #[arg(long, default_value_t = false)]
    binary: bool,

    /// OpenOCD Tcl server host
    #[arg(long, env = "VEXCEPT_HOST", default_value = "localhost")]
    host: String,

    /// OpenOCD Tcl server port
    #[arg(long, env = "VEXCEPT_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// SRAM address for the scratch instructions and the safe stack
    #[arg(long, default_value = "0x20000000", value_parser = parse_u32)]
    scratch_base: u32,

    /// Socket timeout in milliseconds (0 waits forever)
    #[arg(long, default_value_t = 10_000)]
    timeout: u64,

    /// Log level (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

fn parse_policy(text: &str) -> Result<UnavailablePolicy, String>
{
    if text.eq_ignore_ascii_case("skip") {
        Ok(UnavailablePolicy::Omit)
    } else {
        parse_u32(text).map(UnavailablePolicy::Substitute)
    }
}

fn main()
{
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the extracted words
    let logging = match init_logging_with_level(cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    let code = match run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // Flush the log file before exiting
    drop(logging);
    process::exit(code);
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>>
{
    let request = ExtractionRequest::new(Address::new(cli.address), cli.length, cli.value)?;
    let timeout = (cli.timeout > 0).then(|| Duration::from_millis(cli.timeout));
    let layout = ScratchLayout::at(Address::new(cli.scratch_base));
    let format = if cli.binary {
        OutputFormat::Binary
    } else {
        OutputFormat::Text
    };

    let openocd = OpenOcd::connect(&cli.host, cli.port, timeout)?;
    let mut session = SessionGuard::new(openocd);

    let mut extractor = Extractor::prepare(&mut *session, layout)?;
    info!(
        start = %request.start(),
        words = request.count(),
        exceptions = extractor.exception_count(),
        "starting extraction"
    );

    let stdout = io::stdout();
    let mut writer = WordWriter::new(stdout.lock(), format);
    for entry in extractor.extract(&request) {
        writer.write(&entry?)?;
    }
    info!(written = writer.written(), "extraction finished");

    drop(extractor);
    session.close()?;
    Ok(())
}
