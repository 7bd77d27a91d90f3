use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    punch::PunchClock,
    server::{start_server, DEFAULT_PORT},
    storage::record_store::{CsvRecordStore, RecordStore},
    utils::{
        clock::{Clock, SystemClock},
        logging::{enable_console_logging, enable_logging, SERVER_PREFIX},
        time::{date_to_record_name, format_hms},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Timepunch", version, long_about = None)]
#[command(about = "Personal punch clock with a local web interface", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long = "log-filter", help = "Override the log level")]
    log: Option<LevelFilter>,
    #[arg(long = "log-console", help = "Mirror server logs to stdout")]
    log_console: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Serve the punch clock API and web page on localhost")]
    Serve {
        #[arg(long, default_value_t = DEFAULT_PORT, help = "Port to bind on localhost")]
        port: u16,
        #[arg(
            long,
            help = "Directory holding the daily record files. Defaults to the current directory"
        )]
        dir: Option<PathBuf>,
        #[arg(long = "static-dir", default_value = "static", help = "Directory served at /")]
        static_dir: PathBuf,
    },
    #[command(about = "Print the state recovered from today's record file")]
    Status {
        #[arg(
            long,
            help = "Directory holding the daily record files. Defaults to the current directory"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Print total worked hours for every recorded day, newest first")]
    History {
        #[arg(
            long,
            help = "Directory holding the daily record files. Defaults to the current directory"
        )]
        dir: Option<PathBuf>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    match args.commands {
        Commands::Serve {
            port,
            dir,
            static_dir,
        } => {
            let dir = resolve_record_dir(dir);
            enable_logging(SERVER_PREFIX, &dir, args.log, args.log_console)?;
            println!("Starting punch clock server on http://localhost:{port}");
            println!("Using record directory: {}", dir.display());
            start_server(port, dir, static_dir).await
        }
        Commands::Status { dir } => {
            enable_console_logging(args.log)?;
            print_status(resolve_record_dir(dir)).await
        }
        Commands::History { dir } => {
            enable_console_logging(args.log)?;
            print_history(resolve_record_dir(dir)).await
        }
    }
}

fn resolve_record_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| PathBuf::from("."))
}

async fn print_status(dir: PathBuf) -> Result<()> {
    let store = CsvRecordStore::new(dir)?;
    let clock = SystemClock;
    let now = clock.now();
    let today = clock.today();

    let tail = store.load_last(today, now).await?;
    let status = PunchClock::recover(&tail).status(now);

    println!("{}", date_to_record_name(today));
    if status.is_running {
        println!("running for {}", format_hms(status.elapsed_seconds));
    } else {
        println!("paused");
    }
    println!("worked today: {}", format_hms(status.total_seconds));
    Ok(())
}

async fn print_history(dir: PathBuf) -> Result<()> {
    let store = CsvRecordStore::new(dir)?;
    let totals = store.day_totals().await?;

    if totals.is_empty() {
        println!("No recorded days yet");
        return Ok(());
    }
    for day in totals {
        println!("{}  {:>5.1} h", day.date, day.hours);
    }
    Ok(())
}
