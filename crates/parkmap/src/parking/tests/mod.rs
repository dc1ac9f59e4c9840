mod properties;

use super::facility::ParkingMap;
use super::layout::Layout;
use super::types::{Section, SpotId, SpotStatus, StatusRecord};
use super::waypoints::WaypointGraph;

/// Helper to create a status record.
fn rec(section: &str, number: i64, status: SpotStatus) -> StatusRecord {
    StatusRecord::new(section, number, status)
}

/// Helper to create a spot id.
fn spot(section: Section, number: u32) -> SpotId {
    SpotId::new(section, number)
}

/// Built-in facility with section sizes overridden.
fn map_with_sizes(sizes: &[(Section, u32)]) -> ParkingMap {
    let mut layout = Layout::facility();
    for &(section, spots) in sizes {
        if let Some(geometry) = layout.sections.get_mut(&section) {
            geometry.spots = spots;
        }
    }
    ParkingMap::new(layout, WaypointGraph::facility()).expect("valid facility")
}

/// Records giving every spot of `section` a status from `statuses`, in order.
fn section_records(section: Section, statuses: &[SpotStatus]) -> Vec<StatusRecord> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, &status)| rec(section.as_str(), i as i64 + 1, status))
        .collect()
}

/// Deterministic pseudo-random statuses, so property loops need no extra crates.
fn statuses(seed: u64, len: usize) -> Vec<SpotStatus> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            match (state >> 33) % 3 {
                0 => SpotStatus::Available,
                1 => SpotStatus::Occupied,
                _ => SpotStatus::Unknown,
            }
        })
        .collect()
}
