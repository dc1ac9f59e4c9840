use anyhow::Result;
use colored::Colorize;

use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::parking::SpotId;
use crate::parking::router::route_points;

/// Print the click route from the entry/exit to `spot`.
///
/// Statuses are not consulted; this is the path the map would draw if the spot
/// were free.
pub fn run(globals: &GlobalArgs, spot: SpotId) -> Result<()> {
    let config = Config::load_or_default();
    let map = super::load_map(globals, &config)?;

    let position = map
        .layout()
        .spot_position(spot)
        .ok_or_else(|| anyhow::anyhow!("No spot {spot} on the map"))?;
    let points = route_points(map.graph(), map.layout(), spot.section, position)
        .ok_or_else(|| anyhow::anyhow!("Section {} has no route", spot.section))?;

    if !globals.quiet {
        println!(
            "Route to {} ({} segments)",
            spot.to_string().bold(),
            points.len().saturating_sub(1)
        );
    }
    println!("  {} {}", "entry".dimmed(), map.layout().entry);
    for point in &points {
        println!("  {} {point}", "->".dimmed());
    }
    Ok(())
}
