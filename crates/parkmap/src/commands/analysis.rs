use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::analysis::{AnalysisResponse, fetch_analysis, save_charts};
use crate::cli::GlobalArgs;
use crate::config::Config;

/// Run the analysis command.
pub fn run(globals: &GlobalArgs, save_to: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_default();
    let url = config.server_url(globals.url.as_deref());

    let report = match fetch_analysis(&url, config.timeout())? {
        AnalysisResponse::Pending { message } => {
            println!("{}", message.yellow());
            return Ok(());
        }
        AnalysisResponse::Report(report) => report,
    };

    println!("{}", "Occupancy".bold());
    println!("  Total spots:    {}", report.total_spots);
    println!("  Occupied spots: {}", report.occupied_spots.to_string().red());
    println!("  Free spots:     {}", report.free_spots.to_string().cyan());
    println!(
        "  Rate:           {:.1}% available, {:.1}% occupied",
        report.occupancy_rate.available, report.occupancy_rate.occupied
    );

    let chart_names: Vec<&str> = report.charts.iter().map(|(name, _)| name).collect();
    if !globals.quiet && !chart_names.is_empty() {
        println!("  Charts:         {}", chart_names.join(", ").dimmed());
    }

    if let Some(dir) = save_to {
        let written = save_charts(&report, &dir)?;
        println!(
            "{}",
            format!("Saved {} chart(s) to {}", written.len(), dir.display()).green()
        );
    }
    Ok(())
}
