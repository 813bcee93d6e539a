//! # Upload Compressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Validazione degli input e conferma interattiva tramite [`prepare_run`] (exit code 1 prima di qualsiasi prompt)
//! - Creazione della configurazione e avvio del walker
//!
//! ## Esempio di utilizzo:
//! ```bash
//! upload-compressor /var/www/wp-content/uploads --quality 75 --max-width 1200
//! upload-compressor /var/www/wp-content/uploads --dry-run
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use upload_compressor::config::RunRequest;
use upload_compressor::confirm::{prepare_run, Launch};
use upload_compressor::MediaOptimizer;

#[derive(Parser)]
#[command(name = "upload-compressor", version)]
#[command(about = "Compress images in an upload directory in place")]
#[command(after_help = "Examples:
  upload-compressor /var/www/wp-content/uploads
  upload-compressor /var/www/wp-content/uploads --quality 75 --max-width 1200
  upload-compressor /var/www/wp-content/uploads --dry-run")]
struct Args {
    /// Path to the uploads directory
    upload_path: PathBuf,

    /// JPEG/WebP quality (1-100)
    #[arg(short, long, default_value_t = 85, allow_negative_numbers = true)]
    quality: i64,

    /// Maximum width in pixels
    #[arg(short = 'w', long, default_value_t = 1920, allow_negative_numbers = true)]
    max_width: i64,

    /// Maximum height in pixels
    #[arg(long, default_value_t = 1080, allow_negative_numbers = true)]
    max_height: i64,

    /// Show what would be processed without making changes
    #[arg(short, long)]
    dry_run: bool,

    /// Do not ask for confirmation before modifying files
    #[arg(short = 'y', long)]
    yes: bool,

    /// Output progress and summary as JSON lines
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let message = e.to_string();
            print!("Error: {}", message.trim_start_matches("error: "));
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("upload_compressor={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let request = RunRequest {
        upload_path: args.upload_path,
        quality: args.quality,
        max_width: args.max_width,
        max_height: args.max_height,
        dry_run: args.dry_run,
        assume_yes: args.yes,
        json_output: args.json,
    };

    let stdin = std::io::stdin();
    let launch = prepare_run(
        &request,
        &mut stdin.lock(),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )?;

    let config = match launch {
        Launch::Run(config) => config,
        Launch::Aborted => return Ok(ExitCode::SUCCESS),
        Launch::Invalid => return Ok(ExitCode::FAILURE),
    };
    debug!("Configuration: {:?}", config);

    let optimizer = MediaOptimizer::new(config)?;
    optimizer.run(&request.upload_path).await?;

    Ok(ExitCode::SUCCESS)
}
