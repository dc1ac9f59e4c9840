use tracing::debug;

use super::layout::Layout;
use super::registry::SpotRegistry;
use super::render::Diagram;
use super::types::{Point, Section, SpotId, SpotStatus};
use super::waypoints::WaypointGraph;

/// Whether a user-requested route is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouterState {
    #[default]
    Idle,
    RouteShown(SpotId),
}

/// What a click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The spot is occupied; nothing changed.
    Rejected { spot: SpotId },
    /// The shown route was clicked again and removed.
    Cleared,
    /// A new route was drawn through `points`.
    Drawn { spot: SpotId, points: Vec<Point> },
    /// The spot's section has no authored route; nothing changed.
    NoRoute { section: Section },
    /// The click did not land on a known spot.
    UnknownSpot,
}

/// Turns spot clicks into entry-to-spot routes on the diagram.
#[derive(Debug, Clone, Default)]
pub struct ClickRouter {
    state: RouterState,
}

impl ClickRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    /// Handle a click on `spot`.
    ///
    /// Occupied spots are rejected whatever the state. Clicking the spot whose
    /// route is shown clears it. Any other spot gets a fresh route, replacing
    /// the previous one, unless its section has no route.
    pub fn click(
        &mut self,
        spot: SpotId,
        registry: &SpotRegistry,
        graph: &WaypointGraph,
        layout: &Layout,
        diagram: &mut Diagram,
    ) -> ClickOutcome {
        let Some(target) = registry.spot(spot) else {
            return ClickOutcome::UnknownSpot;
        };

        if target.status == SpotStatus::Occupied {
            debug!(%spot, "click rejected: spot is occupied");
            return ClickOutcome::Rejected { spot };
        }

        if self.state == RouterState::RouteShown(spot) {
            diagram.clear_paths();
            self.state = RouterState::Idle;
            return ClickOutcome::Cleared;
        }

        let Some(points) = route_points(graph, layout, spot.section, target.position) else {
            debug!(section = %spot.section, "click ignored: no route for section");
            return ClickOutcome::NoRoute {
                section: spot.section,
            };
        };

        diagram.render_route(&points);
        self.state = RouterState::RouteShown(spot);
        ClickOutcome::Drawn { spot, points }
    }

    /// Forget the shown route and clear it from the diagram.
    pub fn reset(&mut self, diagram: &mut Diagram) {
        diagram.clear_paths();
        self.state = RouterState::Idle;
    }
}

/// Waypoint prefix for `section` followed by the section's two approach points
/// into the spot at `position`.
pub fn route_points(
    graph: &WaypointGraph,
    layout: &Layout,
    section: Section,
    position: Point,
) -> Option<Vec<Point>> {
    let mut points = graph.points_for(section)?;
    let approach = layout.approach(section)?;
    let last = *points.last()?;
    points.extend(approach.points(last, position));
    Some(points)
}
