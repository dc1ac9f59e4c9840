//! Spot-state synchronization and routing engine.
//!
//! A [`SpotRegistry`](registry::SpotRegistry) holds every spot on the map and
//! absorbs status snapshots fetched by the [`poller`]. Each snapshot may mark
//! spots newly occupied; for those, [`search::find_nearest`] looks for the
//! closest free spot in the same row and the [`render::Diagram`] gets a
//! suggested reroute. Independently, the [`router::ClickRouter`] draws a
//! route from the entry/exit through the [`waypoints`] table to a clicked spot.
//! [`facility::ParkingMap`] ties the pieces together.

pub mod error;
pub mod facility;
pub mod layout;
pub mod poller;
pub mod registry;
pub mod render;
pub mod router;
pub mod search;
pub mod types;
pub mod waypoints;

#[cfg(test)]
mod tests;

pub use facility::{ParkingMap, Reroute, SnapshotUpdate};
pub use router::ClickOutcome;
pub use types::{Point, Section, Segment, SpotId, SpotStatus, StatusRecord};
