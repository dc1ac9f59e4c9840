use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use super::layout::Layout;
use super::types::{Point, Section, Spot, SpotId, SpotStatus, StatusRecord};

/// Why a snapshot record was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnknownSection(String),
    /// Spot numbers start at 1.
    InvalidNumber { section: Section, number: i64 },
    /// The section exists but has no spot with this number.
    UnknownSpot(SpotId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownSection(name) => write!(f, "unknown section '{name}'"),
            SkipReason::InvalidNumber { section, number } => {
                write!(f, "invalid spot number {number} in section {section}")
            }
            SkipReason::UnknownSpot(id) => write!(f, "no spot {id} on the map"),
        }
    }
}

/// Outcome of applying one snapshot. Consumers react to the transitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotReport {
    pub applied: usize,
    pub skipped: Vec<(StatusRecord, SkipReason)>,
    /// Spots that were not occupied before this snapshot and are now.
    pub newly_occupied: Vec<SpotId>,
    /// Spots that were occupied before this snapshot and no longer are.
    pub released: Vec<SpotId>,
}

impl SnapshotReport {
    pub fn has_transitions(&self) -> bool {
        !self.newly_occupied.is_empty() || !self.released.is_empty()
    }
}

/// Totals per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub available: usize,
    pub occupied: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.available + self.occupied + self.unknown
    }
}

/// In-memory model of every spot on the map.
///
/// Spots are created once from the layout and never removed; only their
/// status changes.
#[derive(Debug, Clone, Default)]
pub struct SpotRegistry {
    sections: BTreeMap<Section, Vec<Spot>>,
}

impl SpotRegistry {
    /// Place every spot the layout describes, all with unknown status.
    pub fn initialize(layout: &Layout) -> Self {
        let sections = layout
            .sections
            .iter()
            .map(|(&section, geometry)| {
                let spots = (1..=geometry.spots)
                    .filter_map(|number| {
                        geometry.position(number).map(|position| Spot {
                            id: SpotId::new(section, number),
                            position,
                            status: SpotStatus::Unknown,
                        })
                    })
                    .collect();
                (section, spots)
            })
            .collect();
        Self { sections }
    }

    /// Overwrite the status of each spot named in `records`.
    ///
    /// Spots not mentioned keep their status. Records that do not match a spot
    /// are skipped one by one; the rest of the snapshot still applies. When a
    /// spot appears twice, the later record wins.
    pub fn apply_snapshot(&mut self, records: &[StatusRecord]) -> SnapshotReport {
        let mut report = SnapshotReport::default();
        let mut before: BTreeMap<SpotId, SpotStatus> = BTreeMap::new();

        for record in records {
            let id = match self.resolve(record) {
                Ok(id) => id,
                Err(reason) => {
                    warn!(
                        section = %record.section,
                        spot_number = record.spot_number,
                        "skipping status record: {reason}"
                    );
                    report.skipped.push((record.clone(), reason));
                    continue;
                }
            };
            let Some(spot) = self.spot_mut(id) else {
                continue;
            };
            before.entry(id).or_insert(spot.status);
            spot.status = record.status;
            report.applied += 1;
        }

        for (id, previous) in before {
            let current = self.status(id).unwrap_or_default();
            match (previous == SpotStatus::Occupied, current == SpotStatus::Occupied) {
                (false, true) => report.newly_occupied.push(id),
                (true, false) => report.released.push(id),
                _ => {}
            }
        }

        debug!(
            applied = report.applied,
            skipped = report.skipped.len(),
            newly_occupied = report.newly_occupied.len(),
            released = report.released.len(),
            "snapshot applied"
        );
        report
    }

    fn resolve(&self, record: &StatusRecord) -> Result<SpotId, SkipReason> {
        let section: Section = record
            .section
            .parse()
            .map_err(|_| SkipReason::UnknownSection(record.section.clone()))?;
        let number = u32::try_from(record.spot_number)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(SkipReason::InvalidNumber {
                section,
                number: record.spot_number,
            })?;
        let id = SpotId::new(section, number);
        if self.spot(id).is_none() {
            return Err(SkipReason::UnknownSpot(id));
        }
        Ok(id)
    }

    pub fn spot(&self, id: SpotId) -> Option<&Spot> {
        let index = usize::try_from(id.number).ok()?.checked_sub(1)?;
        self.sections.get(&id.section)?.get(index)
    }

    fn spot_mut(&mut self, id: SpotId) -> Option<&mut Spot> {
        let index = usize::try_from(id.number).ok()?.checked_sub(1)?;
        self.sections.get_mut(&id.section)?.get_mut(index)
    }

    pub fn status(&self, id: SpotId) -> Option<SpotStatus> {
        self.spot(id).map(|s| s.status)
    }

    /// Spots of one section ordered by number; empty for sections not on the map.
    pub fn section_spots(&self, section: Section) -> &[Spot] {
        self.sections
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn spots(&self) -> impl Iterator<Item = &Spot> {
        self.sections.values().flatten()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for spot in self.spots() {
            match spot.status {
                SpotStatus::Available => counts.available += 1,
                SpotStatus::Occupied => counts.occupied += 1,
                SpotStatus::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    /// The spot whose drawn rectangle contains `point`.
    pub fn spot_at(&self, layout: &Layout, point: Point) -> Option<SpotId> {
        self.spots()
            .find(|spot| {
                layout.geometry(spot.id.section).is_some_and(|geometry| {
                    let (min, max) = geometry.rect(spot.position);
                    (min.x..=max.x).contains(&point.x) && (min.y..=max.y).contains(&point.y)
                })
            })
            .map(|spot| spot.id)
    }
}
