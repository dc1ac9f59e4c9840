use std::fmt;

use super::types::Section;

/// A broken static configuration: the layout table or the waypoint graph.
///
/// These are caught once at startup. Bad runtime data never produces one.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A section route names a waypoint id that is not defined.
    MissingWaypoint { section: Section, waypoint: u32 },
    /// A section route has no waypoints at all.
    EmptyRoute { section: Section },
    /// A layout section declares zero spots.
    EmptySection { section: Section },
    /// A layout section carries a NaN or infinite coordinate.
    NonFiniteGeometry { section: Section },
    /// The entry/exit point is NaN or infinite.
    NonFiniteEntry,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingWaypoint { section, waypoint } => write!(
                f,
                "route for section {section} references undefined waypoint {waypoint}"
            ),
            ConfigError::EmptyRoute { section } => {
                write!(f, "route for section {section} has no waypoints")
            }
            ConfigError::EmptySection { section } => {
                write!(f, "layout section {section} has no spots")
            }
            ConfigError::NonFiniteGeometry { section } => {
                write!(f, "layout section {section} has a non-finite coordinate")
            }
            ConfigError::NonFiniteEntry => write!(f, "entry/exit point is not finite"),
        }
    }
}

impl std::error::Error for ConfigError {}
