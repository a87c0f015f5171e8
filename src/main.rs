use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use strawberry_detect::api::{ApiClient, DetectionApi, ImageFile};
use strawberry_detect::core::config::{self, CliOverrides};
use strawberry_detect::core::pages::Page;
use strawberry_detect::core::router::Router;

#[derive(Parser)]
#[command(name = "strawberry-detect", about = "Front-end for the strawberry detection service")]
struct Args {
    /// Backend base URL (overrides DETECT_API_BASE_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds (at least 1)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Where to write the log
    #[arg(long, global = true, default_value = "strawberry-detect.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a page by path (e.g. `/record/abc-123`, `/history/batch?page=2`) and print its data
    Open { path: String },
    /// List the routes this front-end knows
    Routes,
    /// Upload one or more images for detection
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Start a batch job over an S3 folder
    S3Trigger { bucket: String, prefix: String },
}

/// Output of `open`: the page that was resolved and what it loaded.
#[derive(Serialize)]
struct OpenedPage<T: Serialize> {
    title: &'static str,
    page: Page,
    content: T,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    info!("strawberry-detect starting up");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let router = Router::new();
    let cli = CliOverrides {
        base_url: args.base_url,
        timeout_secs: args.timeout,
    };

    match args.command {
        Command::Routes => {
            for route in router.routes() {
                println!("{:<20} {}", route.path, route.name);
            }
        }
        Command::Open { path } => {
            let api = connect(&cli)?;
            let page = Page::open(&router, &path);
            let content = page.load(&api).await?;
            print_json(&OpenedPage {
                title: page.title(),
                page,
                content,
            })?;
        }
        Command::Upload { files } => {
            let api = connect(&cli)?;
            let reads = files.iter().map(|file| ImageFile::read(file));
            let images = futures::future::try_join_all(reads).await?;
            let result = api.upload_images(&images).await?;
            print_json(&result)?;
        }
        Command::S3Trigger { bucket, prefix } => {
            let api = connect(&cli)?;
            let ack = api.trigger_s3_batch(&bucket, &prefix).await?;
            print_json(&ack)?;
        }
    }
    Ok(())
}

/// Resolves configuration and builds the API client.
fn connect(cli: &CliOverrides) -> Result<ApiClient, Box<dyn Error>> {
    let file_config = config::load_config()?;
    let resolved = config::resolve(&file_config, cli);
    info!(
        "Using backend {} (timeout {:?})",
        resolved.base_url, resolved.timeout
    );
    Ok(ApiClient::new(resolved.client_config())?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
