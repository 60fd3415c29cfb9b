use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::LevelFilter;

use largest_rs::common::parse_size;
use largest_rs::largest::{
    DEFAULT_MAX_MERGES, DEFAULT_MAX_SCANNERS, DEFAULT_RESULT_SIZE, LargestConfig, LargestError,
    Record, find_largest_with,
};

const TOOL_NAME: &str = "flargest";

/// Output buffer for result lines.
const OUTPUT_BUF_SIZE: usize = 64 * 1024;

#[derive(Parser)]
#[command(
    name = "flargest",
    version,
    about = "Print the identifiers of the records with the largest size field",
    long_about = "Print the identifiers of the K records with the largest size field.\n\n\
                  Each line of FILE is '<identifier> <size>'. The file is scanned in \
                  byte-range chunks concurrently; results are printed largest first."
)]
struct Cli {
    /// Number of records to print
    #[arg(short = 'k', long = "count", value_name = "K", default_value_t = DEFAULT_RESULT_SIZE)]
    count: usize,

    /// Bytes per chunk; SIZE may have a suffix (K, M, G, kB, MB, GB, ...)
    #[arg(short = 'C', long = "chunk-size", value_name = "SIZE")]
    chunk_size: Option<String>,

    /// Maximum number of chunks scanned concurrently
    #[arg(short = 'j', long = "readers", value_name = "N", default_value_t = DEFAULT_MAX_SCANNERS)]
    readers: usize,

    /// Maximum number of merges run concurrently
    #[arg(long = "mergers", value_name = "N", default_value_t = DEFAULT_MAX_MERGES)]
    mergers: usize,

    /// Print each record's size after its identifier
    #[arg(short = 's', long = "show-size")]
    show_size: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// File to scan; prompted for on stdin if omitted
    file: Option<String>,
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

/// Ask for a path on stdout, read one line from stdin.
/// Returns None on EOF.
fn prompt_for_path() -> io::Result<Option<String>> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(b"Enter the absolute path of a file: ")?;
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn write_records(out: &mut impl Write, records: &[Record], show_size: bool) -> io::Result<()> {
    let mut itoa_buf = itoa::Buffer::new();
    for r in records {
        out.write_all(r.link().as_bytes())?;
        if show_size {
            out.write_all(b" ")?;
            out.write_all(itoa_buf.format(r.size()).as_bytes())?;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = LargestConfig {
        k: cli.count,
        max_scanners: cli.readers,
        max_merges: cli.mergers,
        ..LargestConfig::default()
    };
    if let Some(ref s) = cli.chunk_size {
        config.chunk_size = parse_size(s)
            .map_err(|e| LargestError::Config(format!("invalid chunk size: {}", e)))?;
    }

    let path = match cli.file {
        Some(p) => p,
        None => match prompt_for_path().context("reading file path")? {
            Some(p) => p,
            None => return Ok(()),
        },
    };

    let report = find_largest_with(Path::new(&path), &config)?;

    let stdout = io::stdout();
    let mut out = BufWriter::with_capacity(OUTPUT_BUF_SIZE, stdout.lock());
    write_records(&mut out, &report.records, cli.show_size).context("write error")?;
    out.flush().context("write error")?;
    Ok(())
}

fn main() {
    largest_rs::common::reset_sigpipe();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        // LargestError messages already include the underlying I/O error.
        match e.downcast_ref::<LargestError>() {
            Some(err) => {
                eprintln!("{}: {}", TOOL_NAME, err);
                process::exit(if err.is_fatal() { 2 } else { 1 });
            }
            None => {
                eprintln!("{}: {:#}", TOOL_NAME, e);
                process::exit(2);
            }
        }
    }
}
