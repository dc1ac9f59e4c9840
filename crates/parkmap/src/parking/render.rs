use std::collections::BTreeMap;

use super::types::{Point, Segment, SpotId};

/// The drawing surface the engine mutates.
///
/// Holds two independent layers of path segments: the user route (at most one,
/// replaced wholesale on every draw) and the reroute overlay, one Z-shaped path
/// per occupied spot that has a suggested alternative. Clearing one layer
/// never touches the other.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    route: Vec<Segment>,
    reroutes: BTreeMap<SpotId, Vec<Segment>>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every segment of the user route. Idempotent.
    pub fn clear_paths(&mut self) {
        self.route.clear();
    }

    /// Append one straight segment to the user route.
    pub fn draw_segment(&mut self, from: Point, to: Point) {
        self.route.push(Segment::new(from, to));
    }

    /// Replace the user route with segments joining consecutive `points`.
    ///
    /// Clear and redraw happen in one call, so the route is never observed
    /// half-drawn. Fewer than two points leaves the route empty.
    pub fn render_route(&mut self, points: &[Point]) {
        self.clear_paths();
        for pair in points.windows(2) {
            self.draw_segment(pair[0], pair[1]);
        }
    }

    pub fn route(&self) -> &[Segment] {
        &self.route
    }

    pub fn set_reroute(&mut self, spot: SpotId, segments: Vec<Segment>) {
        self.reroutes.insert(spot, segments);
    }

    /// Drop the reroute drawn for `spot`; returns whether one existed.
    pub fn clear_reroute(&mut self, spot: SpotId) -> bool {
        self.reroutes.remove(&spot).is_some()
    }

    pub fn reroute(&self, spot: SpotId) -> Option<&[Segment]> {
        self.reroutes.get(&spot).map(Vec::as_slice)
    }

    pub fn reroutes(&self) -> impl Iterator<Item = (SpotId, &[Segment])> {
        self.reroutes.iter().map(|(&id, s)| (id, s.as_slice()))
    }

    /// Every segment currently on the surface, route last so it draws on top.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.reroutes.values().flatten().chain(self.route.iter())
    }
}

/// The fixed three-leg path from the entry/exit through an occupied spot to
/// its suggested free spot: down to the occupied spot, along to the free
/// spot's row, then across into it.
pub fn reroute_path(entry: Point, occupied: Point, free: Point) -> Vec<Segment> {
    let corner = Point::new(occupied.x, free.y);
    vec![
        Segment::new(entry, occupied),
        Segment::new(occupied, corner),
        Segment::new(corner, free),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::types::Section;

    fn points() -> Vec<Point> {
        vec![
            Point::new(430.0, 132.0),
            Point::new(430.0, 110.0),
            Point::new(380.0, 110.0),
        ]
    }

    #[test]
    fn render_route_joins_consecutive_points() {
        let mut diagram = Diagram::new();
        diagram.render_route(&points());
        assert_eq!(
            diagram.route(),
            &[
                Segment::new(Point::new(430.0, 132.0), Point::new(430.0, 110.0)),
                Segment::new(Point::new(430.0, 110.0), Point::new(380.0, 110.0)),
            ]
        );
    }

    #[test]
    fn render_route_twice_does_not_duplicate() {
        let mut diagram = Diagram::new();
        diagram.render_route(&points());
        let once = diagram.route().to_vec();
        diagram.render_route(&points());
        assert_eq!(diagram.route(), once.as_slice());
    }

    #[test]
    fn clear_after_render_leaves_nothing() {
        let mut diagram = Diagram::new();
        diagram.render_route(&points());
        diagram.clear_paths();
        assert!(diagram.route().is_empty());
        diagram.clear_paths();
        assert!(diagram.route().is_empty());
    }

    #[test]
    fn draw_segment_only_appends() {
        let mut diagram = Diagram::new();
        diagram.render_route(&points());
        let before = diagram.route().to_vec();
        diagram.draw_segment(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        assert_eq!(&diagram.route()[..before.len()], before.as_slice());
        assert_eq!(diagram.route().len(), before.len() + 1);
    }

    #[test]
    fn single_point_renders_no_segments() {
        let mut diagram = Diagram::new();
        diagram.render_route(&points());
        diagram.render_route(&[Point::new(1.0, 1.0)]);
        assert!(diagram.route().is_empty());
    }

    #[test]
    fn reroute_is_a_three_leg_z() {
        let entry = Point::new(421.0, 134.0);
        let occupied = Point::new(159.2, 163.0);
        let free = Point::new(148.1, 163.0);
        let path = reroute_path(entry, occupied, free);
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Segment::new(entry, occupied));
        assert_eq!(path[1].to, Point::new(occupied.x, free.y));
        assert_eq!(path[2].to, free);
    }

    #[test]
    fn route_layer_and_reroutes_are_independent() {
        let mut diagram = Diagram::new();
        let spot = SpotId::new(Section::B2, 3);
        diagram.set_reroute(
            spot,
            reroute_path(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 1.0)),
        );
        diagram.render_route(&points());
        diagram.clear_paths();
        assert_eq!(diagram.reroute(spot).map(<[Segment]>::len), Some(3));
        assert_eq!(diagram.segments().count(), 3);

        assert!(diagram.clear_reroute(spot));
        assert!(!diagram.clear_reroute(spot));
        assert_eq!(diagram.segments().count(), 0);
    }
}
