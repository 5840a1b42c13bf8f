//! instance-migrate - Migrate a launcher instance to a new modpack release.
//!
//! Clones the source instance, swaps in the new release's content and
//! renames the clone. The source instance is left as it was.

mod prompt;
mod summary;

use anyhow::{Context, Result};
use clap::Parser;
use instance_migrate::{identity, MigrateError, Migrator, RunConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "instance-migrate", version)]
#[command(about = "Migrate a launcher instance to a new modpack release")]
struct Args {
    /// Source instance directory
    #[arg(long)]
    source: PathBuf,

    /// Name of the new instance
    #[arg(long)]
    name: String,

    /// Download the release archive from this URL
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// Use a local release archive
    #[arg(long)]
    file: Option<PathBuf>,

    /// Instance store directory (detected from the launcher when omitted)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Also replace libraries, patches and the package descriptor
    #[arg(long)]
    extended_runtime: bool,

    /// Announce every step without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(args.debug);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = e
                .downcast_ref::<MigrateError>()
                .map(MigrateError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn build_config(args: Args) -> Result<RunConfig, MigrateError> {
    RunConfig::builder(args.source, args.name)
        .store_dir(args.store_dir)
        .url(args.url)
        .archive_file(args.file)
        .extended_runtime(args.extended_runtime)
        .dry_run(args.dry_run)
        .assume_yes(args.yes)
        .build()
}

fn run(args: Args) -> Result<ExitCode> {
    let json = args.json;
    let config = build_config(args)?;
    debug!("Run configuration: {:?}", config);

    let migrator = Migrator::new(config);
    let instance = migrator.validate()?;

    let config = migrator.config();
    if !json {
        let identity_text = std::fs::read_to_string(instance.identity_file()).ok();
        let current_name = identity_text.as_deref().and_then(identity::read_name);
        summary::write_plan(&mut std::io::stdout(), config, current_name)?;
    }

    if !config.dry_run() && !config.assume_yes() {
        let proceed = prompt::confirm("Proceed with migration?")
            .context("Failed to read confirmation")?;
        if !proceed {
            info!("Migration cancelled");
            println!("Aborted; nothing was changed.");
            return Ok(ExitCode::from(1));
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let report = runtime.block_on(migrator.run())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        summary::write_completion(&mut std::io::stdout(), &report)?;
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("instance-migrate").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_file_run() {
        let args = parse(&[
            "--source",
            "/instances/Old",
            "--name",
            "New",
            "--file",
            "pack.zip",
            "--dry-run",
            "-y",
        ])
        .unwrap();
        assert_eq!(args.source, PathBuf::from("/instances/Old"));
        assert_eq!(args.file, Some(PathBuf::from("pack.zip")));
        assert!(args.dry_run && args.yes);
        assert!(!args.extended_runtime);
    }

    #[test]
    fn test_url_and_file_conflict() {
        let err = parse(&[
            "--source",
            "a",
            "--name",
            "b",
            "--url",
            "https://example.com/p.zip",
            "--file",
            "p.zip",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        assert!(err.use_stderr());
    }

    #[test]
    fn test_help_is_not_an_error() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_missing_archive_source_fails_in_builder() {
        let args = parse(&["--source", "/instances/Old", "--name", "New"]).unwrap();
        assert!(matches!(
            build_config(args),
            Err(MigrateError::MissingArchiveSource)
        ));
    }

    #[test]
    fn test_plan_mentions_destination() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let args = parse(&[
            "--source",
            "/instances/Old",
            "--name",
            "New",
            "--file",
            "pack.zip",
            "--store-dir",
            temp_dir.path().to_str().unwrap(),
            "--extended-runtime",
        ])
        .unwrap();
        let config = build_config(args).unwrap();

        let mut out = Vec::new();
        summary::write_plan(&mut out, &config, Some("GTNH 2.6.1")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("/instances/Old (GTNH 2.6.1)"));
        assert!(text.contains(&temp_dir.path().join("New").display().to_string()));
        assert!(text.contains("mmc-pack.json"));
    }
}
