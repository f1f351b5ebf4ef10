use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use bib_photo_mirror::app::{App, HighPassRequest, LowPassRequest, RunResult};
use bib_photo_mirror::config::ConfigLoader;
use bib_photo_mirror::download::{DEFAULT_WORKERS, HttpDownloader};
use bib_photo_mirror::error::PhotoError;
use bib_photo_mirror::listing::ListingHttpClient;
use bib_photo_mirror::output::{ConsoleOutput, JsonOutput, OutputMode};
use bib_photo_mirror::range::{RunRange, Stop};

#[derive(Parser)]
#[command(name = "bibphotos")]
#[command(about = "Mirror race-event photos by runner bib, resuming from a CSV cache")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    /// JSON event catalog replacing the built-in one
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Parallel downloads per batch
    #[arg(long, global = true, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Discover photos per bib and download the low-res images")]
    Images(ImagesArgs),
    #[command(about = "Download full-resolution images for a low-res cache")]
    ImagesHigh(ImagesHighArgs),
}

#[derive(Args)]
struct ImagesArgs {
    /// Roster CSV with a `bib` column; its path names the event
    filepath: PathBuf,

    #[arg(default_value = ".")]
    targetpath: PathBuf,

    /// Low-res cache from a previous run
    cachepath: Option<PathBuf>,

    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Args)]
struct ImagesHighArgs {
    /// Low-res cache written by `images`
    filepath: PathBuf,

    #[arg(default_value = ".")]
    targetpath: PathBuf,

    /// High-res cache from a previous run
    cachepath: Option<PathBuf>,

    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Args)]
struct RangeArgs {
    /// First roster position to process
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// First roster position not to process, or ALL
    #[arg(long, default_value = "ALL")]
    stop: Stop,
}

impl RangeArgs {
    fn to_range(&self) -> RunRange {
        RunRange::new(self.start, self.stop)
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PhotoError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PhotoError) -> u8 {
    match error {
        PhotoError::CacheFormat { .. }
        | PhotoError::RosterFormat { .. }
        | PhotoError::MissingColumn { .. } => 2,
        PhotoError::ListingHttp(_)
        | PhotoError::ListingStatus { .. }
        | PhotoError::ListingParse(_)
        | PhotoError::DownloadHttp(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let catalog = ConfigLoader::resolve(cli.catalog.as_deref())?;
    let listing = ListingHttpClient::new()?;
    let downloader = HttpDownloader::new(cli.workers)?;
    let app = App::new(catalog, listing, downloader);

    let result = match (cli.command, output_mode) {
        (Commands::Images(args), OutputMode::NonInteractive) => {
            app.run_low(&low_request(args), &JsonOutput)?
        }
        (Commands::Images(args), OutputMode::Interactive) => {
            app.run_low(&low_request(args), &ConsoleOutput)?
        }
        (Commands::ImagesHigh(args), OutputMode::NonInteractive) => {
            app.run_high(&high_request(args), &JsonOutput)?
        }
        (Commands::ImagesHigh(args), OutputMode::Interactive) => {
            app.run_high(&high_request(args), &ConsoleOutput)?
        }
    };

    print_result(&result, output_mode)
}

fn low_request(args: ImagesArgs) -> LowPassRequest {
    LowPassRequest {
        range: args.range.to_range(),
        roster: args.filepath,
        target: args.targetpath,
        cache: args.cachepath,
    }
}

fn high_request(args: ImagesHighArgs) -> HighPassRequest {
    HighPassRequest {
        range: args.range.to_range(),
        low_cache: args.filepath,
        target: args.targetpath,
        cache: args.cachepath,
    }
}

fn print_result(result: &RunResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_run(result).into_diagnostic(),
        OutputMode::Interactive => {
            ConsoleOutput::print_summary(result);
            Ok(())
        }
    }
}
