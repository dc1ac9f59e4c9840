pub mod analysis;
pub mod completion;
pub mod config;
pub mod nearest;
pub mod render;
pub mod route;
pub mod version;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::parking::ParkingMap;
use crate::parking::poller::{FileSource, HttpSource, SnapshotSource};
use crate::parking::registry::SnapshotReport;

/// The facility named by `--layout`, the config, or the built-in one.
pub fn load_map(globals: &GlobalArgs, config: &Config) -> Result<ParkingMap> {
    let path = config.layout_path(globals.layout.as_deref());
    ParkingMap::from_optional_path(path.as_deref())
}

/// A replay file when one is given, otherwise the configured server.
pub fn snapshot_source(
    globals: &GlobalArgs,
    config: &Config,
    snapshot: Option<PathBuf>,
) -> Box<dyn SnapshotSource> {
    match snapshot {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(HttpSource::new(
            &config.server_url(globals.url.as_deref()),
            config.timeout(),
        )),
    }
}

/// Print records the registry refused, unless quiet.
pub fn print_skipped(report: &SnapshotReport, malformed: usize, quiet: bool) {
    if quiet {
        return;
    }
    for (record, reason) in &report.skipped {
        println!(
            "  {} {} #{}: {reason}",
            "skipped".yellow(),
            record.section,
            record.spot_number
        );
    }
    if malformed > 0 {
        println!("  {} {malformed} malformed record(s)", "skipped".yellow());
    }
}
