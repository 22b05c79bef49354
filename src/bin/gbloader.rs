use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use genome_loader::config::ConfigLoader;
use genome_loader::error::LoaderError;
use genome_loader::output::{GenomeListing, JsonOutput, OutputMode};
use genome_loader::pipeline::{Loader, ProgressEvent, ProgressSink};
use genome_loader::store::GenomeStore;

#[derive(Parser)]
#[command(name = "gbloader")]
#[command(about = "Load GenBank genomes, features and sequences into a genome store")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    store: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Load one or more GenBank files (.gb, .gbff, optionally .gz)")]
    Load(LoadArgs),
    #[command(about = "List genome ids already in the store")]
    Genomes,
}

#[derive(Args)]
struct LoadArgs {
    files: Vec<PathBuf>,
}

struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => {
                let elapsed_ms = elapsed.as_millis() as u64;
                tracing::debug!(elapsed_ms, "{}", event.message);
            }
            None => tracing::debug!("{}", event.message),
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(err) = report.downcast_ref::<LoaderError>() {
                return ExitCode::from(map_exit_code(err));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &LoaderError) -> u8 {
    match error {
        LoaderError::MissingConfig
        | LoaderError::ConfigRead(_)
        | LoaderError::ConfigParse(_) => 2,
        LoaderError::Store(_) | LoaderError::DuplicateGenome(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Log
    };

    let files = match &cli.command {
        Commands::Load(args) => args.files.clone(),
        Commands::Genomes => Vec::new(),
    };
    let resolved = ConfigLoader::resolve_or_default(cli.config.as_deref())?
        .with_overrides(cli.store, files);
    let store = resolved.store.open()?;

    match cli.command {
        Commands::Load(_) => {
            if resolved.files.is_empty() {
                return Err(miette::Report::msg(
                    "no input files (pass them to `gbloader load` or list them in gbloader.json)",
                ));
            }
            store.ensure_root()?;
            let loader = Loader::new(store);
            let result = match output_mode {
                OutputMode::Json => {
                    let result = loader.load_files(&resolved.files, &JsonOutput);
                    JsonOutput::print_load(&result).into_diagnostic()?;
                    result
                }
                OutputMode::Log => loader.load_files(&resolved.files, &LogSink),
            };
            if result.failed() > 0 {
                tracing::warn!(
                    failed = result.failed(),
                    total = result.files.len(),
                    "some files were not loaded"
                );
                return Ok(ExitCode::from(1));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Genomes => {
            let mut genomes: Vec<i64> = store.existing_genome_ids()?.into_iter().collect();
            genomes.sort_unstable();
            match output_mode {
                OutputMode::Json => {
                    let listing = GenomeListing {
                        store: store.root().to_string(),
                        genomes,
                    };
                    JsonOutput::print_genomes(&listing).into_diagnostic()?;
                }
                OutputMode::Log => {
                    if genomes.is_empty() {
                        println!("no genomes in {}", store.root());
                    }
                    for gi in genomes {
                        println!("{gi}");
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
