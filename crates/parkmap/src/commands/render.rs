use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::{GlobalArgs, ThemeName};
use crate::config::Config;
use crate::parking::{ClickOutcome, SpotId};
use crate::parking::poller::{FileSource, SnapshotSource};
use crate::svg::render_svg;
use crate::theme::Theme;

/// Run the render command.
pub fn run(
    globals: &GlobalArgs,
    snapshot: Option<PathBuf>,
    route: Option<SpotId>,
    output: PathBuf,
    theme: Option<ThemeName>,
) -> Result<()> {
    let config = Config::load_or_default();
    let mut map = super::load_map(globals, &config)?;

    if let Some(path) = snapshot {
        let snapshot = FileSource::new(path).fetch()?;
        let update = map.apply_snapshot(&snapshot.records);
        super::print_skipped(&update.report, snapshot.malformed, globals.quiet);
    }

    if let Some(spot) = route {
        match map.click(spot) {
            ClickOutcome::Drawn { .. } => {}
            ClickOutcome::Rejected { spot } => {
                anyhow::bail!("Spot {spot} is occupied and cannot be routed.")
            }
            ClickOutcome::NoRoute { section } => anyhow::bail!("Section {section} has no route"),
            ClickOutcome::UnknownSpot => anyhow::bail!("No spot {spot} on the map"),
            ClickOutcome::Cleared => {}
        }
    }

    let theme = Theme::from_name(theme.map(ThemeName::as_str).unwrap_or(config.theme_name()));
    let svg = render_svg(&map, &theme);
    std::fs::write(&output, svg)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !globals.quiet {
        println!("{}", format!("Wrote {}", output.display()).green());
    }
    Ok(())
}
