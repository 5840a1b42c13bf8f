//! Human-readable plan and completion output.

use instance_migrate::{MigrationReport, MigrationStage, RunConfig};
use std::io::{self, Write};

/// Describe what a run is about to do.
pub fn write_plan<W: Write>(
    out: &mut W,
    config: &RunConfig,
    current_name: Option<&str>,
) -> io::Result<()> {
    writeln!(out, "Migration plan")?;
    match current_name {
        Some(name) => writeln!(out, "  Source:       {} ({})", config.source().display(), name)?,
        None => writeln!(out, "  Source:       {}", config.source().display())?,
    }
    writeln!(out, "  Destination:  {}", config.destination().display())?;
    writeln!(out, "  Archive:      {}", config.archive())?;
    writeln!(
        out,
        "  Release root: {}",
        if config.extended_runtime() {
            "replaced (extended runtime)"
        } else {
            "kept from source"
        }
    )?;
    if config.dry_run() {
        writeln!(out, "  Mode:         dry run, nothing will be changed")?;
    }

    let paths = config.paths();
    writeln!(
        out,
        "  Replaces:     {}/{{{}}}",
        paths.asset_root,
        paths
            .all_assets()
            .collect::<Vec<_>>()
            .join(",")
    )?;
    if config.extended_runtime() {
        writeln!(out, "                {}", paths.release_root_items().join(", "))?;
    }
    Ok(())
}

/// Summarize a finished run.
pub fn write_completion<W: Write>(out: &mut W, report: &MigrationReport) -> io::Result<()> {
    writeln!(out)?;
    for stage in MigrationStage::PIPELINE {
        let mark = if report.has_completed(stage) {
            "done"
        } else if report.skipped.contains(&stage) {
            "skipped"
        } else {
            "-"
        };
        writeln!(out, "  {:<40} {}", stage.to_string(), mark)?;
    }

    if !report.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings:")?;
        for warning in &report.warnings {
            writeln!(out, "  - {}", warning)?;
        }
    }

    writeln!(out)?;
    if report.dry_run {
        writeln!(
            out,
            "Dry run complete: {} commands would run for {}",
            report.journal.len(),
            report.destination.display()
        )?;
    } else {
        writeln!(
            out,
            "Migrated {} -> {}",
            report.source.display(),
            report.destination.display()
        )?;
    }
    Ok(())
}
