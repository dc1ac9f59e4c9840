use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::types::{Point, Section, SpotId};

/// Where the entry/exit marker sits; reroute paths start here.
pub const ENTRY_EXIT: Point = Point::new(421.0, 134.0);

/// Which way a route travels on its last leg into a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApproachAxis {
    /// Run along the aisle to the spot's column, then drop into the spot.
    Vertical,
    /// Run down the aisle to the spot's row, then cross into the spot.
    Horizontal,
}

/// Last-leg rule: the axis plus the offset from the spot's stored position to
/// the point where the route line ends (the spot edge, not its origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    pub axis: ApproachAxis,
    pub dx: f32,
    pub dy: f32,
}

impl Approach {
    /// The two points a route visits after its last waypoint `last`.
    pub fn points(&self, last: Point, spot: Point) -> [Point; 2] {
        let terminal = spot.offset(self.dx, self.dy);
        match self.axis {
            ApproachAxis::Vertical => [Point::new(terminal.x, last.y), terminal],
            ApproachAxis::Horizontal => [Point::new(last.x, terminal.y), terminal],
        }
    }
}

/// A spot's drawn rectangle relative to its stored position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    const UPRIGHT: Footprint = Footprint {
        dx: 0.0,
        dy: 0.0,
        width: 10.0,
        height: 19.0,
    };

    /// Rotated -90 degrees about the stored position.
    const SIDEWAYS: Footprint = Footprint {
        dx: 0.0,
        dy: -10.0,
        width: 19.0,
        height: 10.0,
    };
}

/// Geometry of one section: where its spots go and how routes enter them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGeometry {
    pub anchor: Point,
    /// Offset between consecutive spots.
    pub step: Point,
    pub spots: u32,
    pub footprint: Footprint,
    pub approach: Approach,
}

impl SectionGeometry {
    /// Position of the 1-based spot `number`, or `None` when out of range.
    pub fn position(&self, number: u32) -> Option<Point> {
        if number == 0 || number > self.spots {
            return None;
        }
        let index = (number - 1) as f32;
        Some(self.anchor.offset(self.step.x * index, self.step.y * index))
    }

    /// Top-left and bottom-right corners of a spot drawn at `position`.
    pub fn rect(&self, position: Point) -> (Point, Point) {
        let min = position.offset(self.footprint.dx, self.footprint.dy);
        let max = min.offset(self.footprint.width, self.footprint.height);
        (min, max)
    }

    fn is_finite(&self) -> bool {
        [
            self.anchor.x,
            self.anchor.y,
            self.step.x,
            self.step.y,
            self.footprint.dx,
            self.footprint.dy,
            self.footprint.width,
            self.footprint.height,
            self.approach.dx,
            self.approach.dy,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// The section-keyed geometry table shared by spot placement and route drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default = "default_entry")]
    pub entry: Point,
    pub sections: BTreeMap<Section, SectionGeometry>,
}

fn default_entry() -> Point {
    ENTRY_EXIT
}

fn row(anchor: (f32, f32), step_x: f32, spots: u32, terminal_dy: f32) -> SectionGeometry {
    SectionGeometry {
        anchor: Point::new(anchor.0, anchor.1),
        step: Point::new(step_x, 0.0),
        spots,
        footprint: Footprint::UPRIGHT,
        approach: Approach {
            axis: ApproachAxis::Vertical,
            dx: 5.0,
            dy: terminal_dy,
        },
    }
}

impl Layout {
    /// The built-in facility map.
    pub fn facility() -> Self {
        let mut sections = BTreeMap::new();
        sections.insert(Section::A, row((197.5, 50.0), 11.0, 20, 19.0));
        sections.insert(Section::B1, row((137.0, 139.0), 11.1, 22, 0.0));
        sections.insert(Section::B2, row((137.0, 163.0), 11.1, 22, 19.0));
        sections.insert(Section::C1, row((137.0, 253.0), 11.1, 22, 19.0));
        sections.insert(Section::C2, row((137.0, 228.0), 11.1, 22, 0.0));
        sections.insert(Section::D, row((292.0, 323.0), 11.1, 8, 0.0));
        sections.insert(
            Section::E,
            SectionGeometry {
                anchor: Point::new(63.0, 86.5),
                step: Point::new(0.0, 11.4),
                spots: 20,
                footprint: Footprint::SIDEWAYS,
                approach: Approach {
                    axis: ApproachAxis::Horizontal,
                    dx: 19.0,
                    dy: -5.0,
                },
            },
        );
        Self {
            entry: ENTRY_EXIT,
            sections,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.entry.x.is_finite() || !self.entry.y.is_finite() {
            return Err(ConfigError::NonFiniteEntry);
        }
        for (&section, geometry) in &self.sections {
            if geometry.spots == 0 {
                return Err(ConfigError::EmptySection { section });
            }
            if !geometry.is_finite() {
                return Err(ConfigError::NonFiniteGeometry { section });
            }
        }
        Ok(())
    }

    pub fn geometry(&self, section: Section) -> Option<&SectionGeometry> {
        self.sections.get(&section)
    }

    pub fn approach(&self, section: Section) -> Option<Approach> {
        self.geometry(section).map(|g| g.approach)
    }

    pub fn spot_position(&self, id: SpotId) -> Option<Point> {
        self.geometry(id.section)?.position(id.number)
    }

    /// Total number of spots across all sections.
    pub fn spot_count(&self) -> usize {
        self.sections.values().map(|g| g.spots as usize).sum()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::facility()
    }
}
