use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::parking::SpotId;
use crate::parking::search::find_nearest;

/// Fetch one snapshot and report the free spot nearest to `spot`.
pub fn run(globals: &GlobalArgs, spot: SpotId, snapshot: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_default();
    let mut map = super::load_map(globals, &config)?;
    if map.layout().spot_position(spot).is_none() {
        anyhow::bail!("No spot {spot} on the map");
    }

    let source = super::snapshot_source(globals, &config, snapshot);
    let snapshot = source.fetch()?;
    let update = map.apply_snapshot(&snapshot.records);
    super::print_skipped(&update.report, snapshot.malformed, globals.quiet);

    let status = map.registry().status(spot).unwrap_or_default();
    match find_nearest(map.registry(), spot.section, spot.number) {
        Some(free) => println!(
            "{spot} is {status}; nearest free spot is {}",
            free.id.to_string().green().bold()
        ),
        None => println!(
            "{spot} is {status}; {}",
            format!("no free spot in section {}", spot.section).yellow()
        ),
    }
    Ok(())
}
