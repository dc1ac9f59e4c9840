use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tokio::sync::watch;

use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::parking::poller::{ParsedSnapshot, PollEvent, Poller, SnapshotSource};
use crate::parking::{ParkingMap, SnapshotUpdate};

/// Run the watch command: poll headless and print what changes.
pub fn run(globals: &GlobalArgs, snapshot: Option<PathBuf>, once: bool) -> Result<()> {
    let config = Config::load_or_default();
    let mut map = super::load_map(globals, &config)?;
    let source = super::snapshot_source(globals, &config, snapshot);

    if !globals.quiet {
        println!(
            "Watching {} ({} spots)",
            source.describe().bold(),
            map.layout().spot_count()
        );
    }

    if once {
        let snapshot = source.fetch()?;
        apply(&mut map, snapshot, globals.quiet);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let poller = Poller::new(source, config.poll_interval());
    // Held for the life of the loop; the process exits on Ctrl+C.
    let (_shutdown, shutdown_rx) = watch::channel(false);
    let quiet = globals.quiet;
    runtime.block_on(poller.run(shutdown_rx, |event| match event {
        PollEvent::Snapshot(snapshot) => apply(&mut map, snapshot, quiet),
        PollEvent::Failed(error) => {
            if !quiet {
                println!("{} {error}", "poll failed:".red());
            }
            map.record_poll_failure(error);
        }
    }));
    Ok(())
}

fn apply(map: &mut ParkingMap, snapshot: ParsedSnapshot, quiet: bool) {
    let update = map.apply_snapshot(&snapshot.records);
    super::print_skipped(&update.report, snapshot.malformed, quiet);
    if !quiet || update.report.has_transitions() {
        print_update(map, &update);
    }
}

fn print_update(map: &ParkingMap, update: &SnapshotUpdate) {
    for spot in &update.report.released {
        println!("  {} {spot}", "free    ".cyan());
    }
    for spot in &update.report.newly_occupied {
        println!("  {} {spot}", "occupied".red());
    }
    for reroute in &update.reroutes {
        println!(
            "  {} {} {} {}",
            "reroute ".yellow(),
            reroute.occupied,
            "->".dimmed(),
            reroute.free.to_string().green()
        );
    }
    for spot in &update.unrouted {
        println!("  {} {spot} (no free spot in section)", "reroute ".yellow());
    }

    let counts = map.registry().counts();
    println!(
        "{} available, {} occupied, {} unknown",
        counts.available.to_string().cyan().bold(),
        counts.occupied.to_string().red().bold(),
        counts.unknown.to_string().dimmed()
    );
}
