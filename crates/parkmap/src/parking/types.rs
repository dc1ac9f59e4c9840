use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named row of parking spots on the facility map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    A,
    B1,
    B2,
    C1,
    C2,
    D,
    E,
}

impl Section {
    /// All sections, in map order.
    pub const ALL: [Section; 7] = [
        Section::A,
        Section::B1,
        Section::B2,
        Section::C1,
        Section::C2,
        Section::D,
        Section::E,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::A => "A",
            Section::B1 => "B1",
            Section::B2 => "B2",
            Section::C1 => "C1",
            Section::C2 => "C2",
            Section::D => "D",
            Section::E => "E",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a section name that is not on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSection(pub String);

impl fmt::Display for UnknownSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section '{}'", self.0)
    }
}

impl std::error::Error for UnknownSection {}

impl FromStr for Section {
    type Err = UnknownSection;

    /// Accepts `B2` as well as the element ids `section-B2` and `section_B2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let id = trimmed
            .strip_prefix("section-")
            .or_else(|| trimmed.strip_prefix("section_"))
            .unwrap_or(trimmed);
        Section::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(id))
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// Occupancy state of a single spot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Available,
    Occupied,
    #[default]
    Unknown,
}

impl SpotStatus {
    /// Map a wire status string. Anything other than the two known values is `Unknown`.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "occupied" => SpotStatus::Occupied,
            "available" => SpotStatus::Available,
            _ => SpotStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpotStatus::Available => "available",
            SpotStatus::Occupied => "occupied",
            SpotStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a spot: its section plus a 1-based number within that section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpotId {
    pub section: Section,
    pub number: u32,
}

impl SpotId {
    pub fn new(section: Section, number: u32) -> Self {
        Self { section, number }
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.number)
    }
}

impl FromStr for SpotId {
    type Err = String;

    /// Parses `SECTION:NUMBER`, e.g. `B2:3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, number) = s
            .split_once(':')
            .ok_or_else(|| format!("expected SECTION:NUMBER, got '{s}'"))?;
        let section: Section = section.parse().map_err(|e: UnknownSection| e.to_string())?;
        let number: u32 = number
            .trim()
            .parse()
            .map_err(|_| format!("invalid spot number in '{s}'"))?;
        if number == 0 {
            return Err(format!("spot numbers start at 1, got '{s}'"));
        }
        Ok(Self { section, number })
    }
}

/// A point in diagram coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A straight line between two diagram points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    pub fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }
}

/// A parking spot as held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    pub id: SpotId,
    pub position: Point,
    pub status: SpotStatus,
}

/// One validated entry of a status snapshot.
///
/// The section is kept as the raw string from the source so the registry can
/// report names it does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub section: String,
    pub spot_number: i64,
    pub status: SpotStatus,
}

impl StatusRecord {
    pub fn new(section: impl Into<String>, spot_number: i64, status: SpotStatus) -> Self {
        Self {
            section: section.into(),
            spot_number,
            status,
        }
    }
}
