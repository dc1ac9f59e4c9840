use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::types::{Point, Section};

/// Waypoint identifier. Ids are small positive integers.
pub type WaypointId = u32;

/// Fixed routing landmarks plus, per section, the waypoint sequence leading
/// from the entry/exit to that section's aisle.
///
/// This is a lookup table rather than a searchable graph: each section has one
/// canonical path prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointGraph {
    pub waypoints: BTreeMap<WaypointId, Point>,
    pub routes: BTreeMap<Section, Vec<WaypointId>>,
}

impl WaypointGraph {
    /// The hand-authored graph for the built-in facility.
    pub fn facility() -> Self {
        let waypoints = BTreeMap::from([
            (1, Point::new(430.0, 132.0)),
            (2, Point::new(430.0, 110.0)),
            (3, Point::new(380.0, 110.0)),
            (4, Point::new(102.0, 110.0)),
            (5, Point::new(380.0, 202.0)),
            (6, Point::new(380.0, 297.0)),
        ]);
        let routes = BTreeMap::from([
            (Section::A, vec![1, 2, 3]),
            (Section::B1, vec![1, 2, 3]),
            (Section::E, vec![1, 2, 3, 4]),
            (Section::B2, vec![1, 2, 3, 5]),
            (Section::C2, vec![1, 2, 3, 5]),
            (Section::C1, vec![1, 2, 3, 5, 6]),
            (Section::D, vec![1, 2, 3, 5, 6]),
        ]);
        Self { waypoints, routes }
    }

    /// Check that every route is non-empty and only names defined waypoints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (&section, ids) in &self.routes {
            if ids.is_empty() {
                return Err(ConfigError::EmptyRoute { section });
            }
            if let Some(&waypoint) = ids.iter().find(|&&id| !self.waypoints.contains_key(&id)) {
                return Err(ConfigError::MissingWaypoint { section, waypoint });
            }
        }
        Ok(())
    }

    /// The waypoint ids leading to `section`, or `None` when no route is authored.
    pub fn route_for(&self, section: Section) -> Option<&[WaypointId]> {
        self.routes.get(&section).map(Vec::as_slice)
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<Point> {
        self.waypoints.get(&id).copied()
    }

    /// The route for `section` resolved to points.
    ///
    /// Returns `None` when the section has no route or the route names an
    /// undefined waypoint (which `validate` rules out at startup).
    pub fn points_for(&self, section: Section) -> Option<Vec<Point>> {
        self.route_for(section)?
            .iter()
            .map(|&id| self.waypoint(id))
            .collect()
    }
}

impl Default for WaypointGraph {
    fn default() -> Self {
        Self::facility()
    }
}
