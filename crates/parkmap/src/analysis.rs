use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

/// Body of `GET /analysis`.
///
/// The server answers with a bare `{ "message": ... }` until it has history to
/// report, and with the full statistics object afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Report(AnalysisReport),
    Pending { message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisReport {
    pub total_spots: u64,
    pub occupied_spots: u64,
    pub free_spots: u64,
    pub occupancy_rate: OccupancyRate,
    #[serde(flatten)]
    pub charts: Charts,
}

/// Percentages, 0 to 100.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OccupancyRate {
    #[serde(default)]
    pub available: f64,
    #[serde(default)]
    pub occupied: f64,
}

/// Base64-encoded PNG charts, keyed as the server names them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Charts {
    pub occupancy_over_time_chart: Option<String>,
    pub section_occupancy_chart: Option<String>,
    pub duration_histogram_chart: Option<String>,
    pub day_of_week_chart: Option<String>,
    pub occupancy_rate_chart: Option<String>,
}

impl Charts {
    /// `(name, base64)` for every chart present.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("occupancy_over_time", &self.occupancy_over_time_chart),
            ("section_occupancy", &self.section_occupancy_chart),
            ("duration_histogram", &self.duration_histogram_chart),
            ("day_of_week", &self.day_of_week_chart),
            ("occupancy_rate", &self.occupancy_rate_chart),
        ]
        .into_iter()
        .filter_map(|(name, data)| data.as_deref().map(|d| (name, d)))
    }
}

/// A decoded chart image.
#[derive(Debug, Clone)]
pub struct Chart {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode one base64 chart and check that it really is an image.
pub fn decode_chart(data: &str) -> Result<Chart> {
    let png = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .context("Failed to decode base64 chart data")?;
    let image = image::load_from_memory(&png).context("Chart is not a readable image")?;
    Ok(Chart {
        width: image.width(),
        height: image.height(),
        png,
    })
}

pub fn parse_analysis(body: &str) -> Result<AnalysisResponse> {
    serde_json::from_str(body).context("Failed to parse analysis response")
}

/// Fetch `GET {base}/analysis`.
pub fn fetch_analysis(base_url: &str, timeout: Duration) -> Result<AnalysisResponse> {
    let url = format!("{}/analysis", base_url.trim_end_matches('/'));
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into();
    let response: AnalysisResponse = agent
        .get(&url)
        .call()
        .with_context(|| format!("Failed to fetch {url}"))?
        .body_mut()
        .read_json()
        .with_context(|| format!("Failed to parse response from {url}"))?;
    debug!(%url, "analysis fetched");
    Ok(response)
}

/// Write every chart in `report` to `dir` as `<name>.png`.
pub fn save_charts(report: &AnalysisReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::new();
    for (name, data) in report.charts.iter() {
        let chart = decode_chart(data).with_context(|| format!("Invalid {name} chart"))?;
        let path = dir.join(format!("{name}.png"));
        std::fs::write(&path, &chart.png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), width = chart.width, height = chart.height, "chart saved");
        written.push(path);
    }
    Ok(written)
}
