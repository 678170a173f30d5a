use clap::{Parser, Subcommand};
use photo_manifest::config::{self, ProjectConfig, ProjectPaths};
use photo_manifest::imaging::RustBackend;
use photo_manifest::manifest::UrlMode;
use photo_manifest::pipeline::{self, SyncOutcome};
use photo_manifest::process::{ProcessEvent, ProcessResult};
use photo_manifest::{init_tracing, output};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

#[derive(Parser)]
#[command(name = "photo-manifest")]
#[command(about = "Publish gallery photos and build their placeholder manifest")]
#[command(long_about = "\
Publish gallery photos and build their placeholder manifest

Project layout (paths configurable in config.toml):

  .
  ├── config.toml              # Optional, sparse; see 'gen-config'
  ├── photos/                  # Originals. Add and remove photos here
  ├── public/photos/           # Compressed copies, mirrored from photos/
  ├── blurhash_cache.json      # Placeholder cache, keyed by file name
  └── src/photos.json          # Manifest read by the gallery front end

JPEG is re-encoded at quality 80, PNG losslessly. Other formats are skipped.
Photos are listed newest first. Set GALLERY_ENV=DEV to use local URLs.

Run 'photo-manifest gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root containing config.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Environment selector; exactly DEV switches photo URLs to the local prefix
    #[arg(long, env = "GALLERY_ENV", default_value = "", global = true)]
    mode: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mirror the source directory into the published directory
    Sync,
    /// Compute placeholders for published photos and write the manifest
    Process,
    /// Run the full pipeline: sync → process
    Build,
    /// Show what sync would delete and compress, without changing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).inspect_err(|e| tracing::error!(error = %e, "run failed"))
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let mode = UrlMode::from_env_value(&cli.mode);

    match cli.command {
        Command::Sync => {
            let (project, paths) = load_project(&cli.root)?;
            println!("==> Syncing {}", paths.source_dir.display());
            let synced = pipeline::sync(&backend, &project, &paths)?;
            print_sync(&synced, &paths);
        }
        Command::Process => {
            let (project, paths) = load_project(&cli.root)?;
            println!("==> Processing {}", paths.published_dir.display());
            let result = process_with_printer(|tx| {
                pipeline::publish_manifest(&backend, &project, &paths, mode, Some(tx))
            })?;
            print_summary(&result, &paths);
        }
        Command::Build => {
            let (project, paths) = load_project(&cli.root)?;
            println!("==> Stage 1: Syncing {}", paths.source_dir.display());
            let synced = pipeline::sync(&backend, &project, &paths)?;
            print_sync(&synced, &paths);

            println!("==> Stage 2: Processing {}", paths.published_dir.display());
            let result = process_with_printer(|tx| {
                pipeline::publish_manifest(&backend, &project, &paths, mode, Some(tx))
            })?;
            print_summary(&result, &paths);

            println!("==> Build complete: {}", paths.manifest_file.display());
        }
        Command::Check => {
            let (project, paths) = load_project(&cli.root)?;
            println!("==> Checking {}", paths.source_dir.display());
            let plan = pipeline::plan(&project, &paths)?;
            output::print_check_output(&plan);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_project(root: &Path) -> Result<(ProjectConfig, ProjectPaths), config::ConfigError> {
    let project = config::load_config(root)?;
    let paths = project.resolve(root);
    Ok((project, paths))
}

/// Run `work` with a progress channel drained by a printer thread.
///
/// The sender is moved into `work`; once it is dropped the printer finishes.
fn process_with_printer<T, E>(
    work: impl FnOnce(Sender<ProcessEvent>) -> Result<T, E>,
) -> Result<T, E> {
    let (tx, rx) = mpsc::channel();
    let printer: JoinHandle<()> = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = work(tx);
    if printer.join().is_err() {
        tracing::warn!("progress printer stopped early");
    }
    result
}

fn print_sync(synced: &SyncOutcome, paths: &ProjectPaths) {
    let created = synced
        .created_published_dir
        .then_some(paths.published_dir.as_path());
    output::print_sync_output(created, &synced.deleted, &synced.compress);
}

fn print_summary(result: &ProcessResult, paths: &ProjectPaths) {
    output::print_process_summary(&result.stats, &paths.manifest_file, result.photos.len());
}
