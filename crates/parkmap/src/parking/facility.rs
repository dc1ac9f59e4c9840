use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::layout::Layout;
use super::registry::{SnapshotReport, SpotRegistry};
use super::render::{Diagram, reroute_path};
use super::router::{ClickOutcome, ClickRouter};
use super::search::find_nearest;
use super::types::{SpotId, SpotStatus, StatusRecord};
use super::waypoints::WaypointGraph;

/// On-disk form of a facility: the layout table plus an optional waypoint graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityFile {
    #[serde(flatten)]
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<WaypointGraph>,
}

/// A suggested alternative for an occupied spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reroute {
    pub occupied: SpotId,
    pub free: SpotId,
}

/// Everything that changed as a result of one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotUpdate {
    pub report: SnapshotReport,
    /// Reroutes drawn or redrawn by this snapshot.
    pub reroutes: Vec<Reroute>,
    /// Newly occupied spots whose section had no free spot.
    pub unrouted: Vec<SpotId>,
}

/// The whole engine: layout, spot states, waypoint table, drawing surface and
/// the click controller, mutated from a single thread.
#[derive(Debug, Clone)]
pub struct ParkingMap {
    layout: Layout,
    graph: WaypointGraph,
    registry: SpotRegistry,
    diagram: Diagram,
    router: ClickRouter,
    suggestions: Vec<Reroute>,
    last_success: Option<SystemTime>,
    last_error: Option<String>,
}

impl ParkingMap {
    /// Build the engine, validating the static configuration first.
    pub fn new(layout: Layout, graph: WaypointGraph) -> Result<Self> {
        layout.validate().context("Invalid facility layout")?;
        graph.validate().context("Invalid waypoint graph")?;
        let registry = SpotRegistry::initialize(&layout);
        info!(
            spots = layout.spot_count(),
            sections = layout.sections.len(),
            "facility initialized"
        );
        Ok(Self {
            layout,
            graph,
            registry,
            diagram: Diagram::new(),
            router: ClickRouter::new(),
            suggestions: Vec::new(),
            last_success: None,
            last_error: None,
        })
    }

    /// The built-in facility.
    pub fn facility() -> Result<Self> {
        Self::new(Layout::facility(), WaypointGraph::facility())
    }

    /// Load a facility file; a file without `waypoints` uses the built-in graph.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read facility {}", path.display()))?;
        let file: FacilityFile = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse facility {}", path.display()))?;
        Self::new(file.layout, file.waypoints.unwrap_or_default())
    }

    /// Built-in facility, or the one at `path` when given.
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::facility(),
        }
    }

    /// Apply a snapshot and bring the reroute overlay in line with it.
    ///
    /// Newly occupied spots get a path to their nearest free spot, released
    /// spots lose theirs, and a surviving reroute whose target is no longer
    /// free is recomputed.
    pub fn apply_snapshot(&mut self, records: &[StatusRecord]) -> SnapshotUpdate {
        let report = self.registry.apply_snapshot(records);
        self.last_success = Some(SystemTime::now());
        self.last_error = None;

        for &spot in &report.released {
            self.diagram.clear_reroute(spot);
            self.suggestions.retain(|r| r.occupied != spot);
        }

        let stale: Vec<SpotId> = self
            .suggestions
            .iter()
            .filter(|r| self.registry.status(r.free) != Some(SpotStatus::Available))
            .map(|r| r.occupied)
            .filter(|id| !report.newly_occupied.contains(id))
            .collect();

        let mut update = SnapshotUpdate::default();
        for spot in report.newly_occupied.iter().chain(stale.iter()).copied() {
            match self.suggest(spot) {
                Some(reroute) => update.reroutes.push(reroute),
                None => update.unrouted.push(spot),
            }
        }
        update.report = report;
        update
    }

    /// Recompute the reroute for one occupied spot.
    fn suggest(&mut self, spot: SpotId) -> Option<Reroute> {
        self.diagram.clear_reroute(spot);
        self.suggestions.retain(|r| r.occupied != spot);

        let occupied = self.registry.spot(spot)?;
        let Some(free) = find_nearest(&self.registry, spot.section, spot.number) else {
            debug!(%spot, "no free spot left in section");
            return None;
        };
        let segments = reroute_path(self.layout.entry, occupied.position, free.position);
        let reroute = Reroute {
            occupied: spot,
            free: free.id,
        };
        self.diagram.set_reroute(spot, segments);
        self.suggestions.push(reroute);
        Some(reroute)
    }

    /// Record a poll that produced no snapshot. The map keeps its last state.
    pub fn record_poll_failure(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    /// Feed a spot click to the router.
    pub fn click(&mut self, spot: SpotId) -> ClickOutcome {
        self.router.click(
            spot,
            &self.registry,
            &self.graph,
            &self.layout,
            &mut self.diagram,
        )
    }

    /// Remove the user route, leaving reroutes in place.
    pub fn clear_route(&mut self) {
        self.router.reset(&mut self.diagram);
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    pub fn registry(&self) -> &SpotRegistry {
        &self.registry
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn router(&self) -> &ClickRouter {
        &self.router
    }

    /// Current reroute suggestions, oldest first.
    pub fn suggestions(&self) -> &[Reroute] {
        &self.suggestions
    }

    pub fn last_success(&self) -> Option<SystemTime> {
        self.last_success
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
