use super::*;
use crate::parking::render::Diagram;
use crate::parking::search::find_nearest;

#[test]
fn nearest_stays_in_section_and_is_minimal() {
    for seed in 0..40u64 {
        let mut map = ParkingMap::facility().unwrap();
        let mut records = Vec::new();
        for (i, section) in Section::ALL.into_iter().enumerate() {
            let size = map.layout().geometry(section).unwrap().spots as usize;
            records.extend(section_records(section, &statuses(seed * 7 + i as u64, size)));
        }
        map.apply_snapshot(&records);

        for section in Section::ALL {
            let spots = map.registry().section_spots(section);
            for origin in spots {
                let any_free = spots
                    .iter()
                    .any(|s| s.status == SpotStatus::Available && s.id != origin.id);
                let found = find_nearest(map.registry(), section, origin.id.number);
                assert_eq!(found.is_some(), any_free, "seed {seed} {}", origin.id);
                let Some(found) = found else { continue };

                assert_eq!(found.id.section, section);
                assert_eq!(found.status, SpotStatus::Available);
                assert_ne!(found.id, origin.id);

                let distance = |n: u32| n.abs_diff(origin.id.number);
                let best = spots
                    .iter()
                    .filter(|s| s.status == SpotStatus::Available && s.id != origin.id)
                    .map(|s| distance(s.id.number))
                    .min()
                    .unwrap();
                assert_eq!(distance(found.id.number), best, "seed {seed} {}", origin.id);
                // On a tie the lower number wins.
                if let Some(before) = origin.id.number.checked_sub(best).filter(|&n| n > 0) {
                    if spots[before as usize - 1].status == SpotStatus::Available {
                        assert_eq!(found.id.number, before, "seed {seed} {}", origin.id);
                    }
                }
            }
        }
    }
}

#[test]
fn every_section_route_is_deterministic() {
    let graph = WaypointGraph::facility();
    for section in Section::ALL {
        let first = graph.points_for(section);
        for _ in 0..5 {
            assert_eq!(graph.points_for(section), first);
        }
    }
}

#[test]
fn every_clickable_spot_gets_a_route_ending_at_its_edge() {
    let mut map = ParkingMap::facility().unwrap();
    let ids: Vec<SpotId> = map.registry().spots().map(|s| s.id).collect();
    for id in ids {
        let position = map.registry().spot(id).unwrap().position;
        let approach = map.layout().approach(id.section).unwrap();
        match map.click(id) {
            crate::parking::ClickOutcome::Drawn { points, .. } => {
                let end = *points.last().unwrap();
                assert_eq!(end, position.offset(approach.dx, approach.dy));
                assert_eq!(map.diagram().route().len(), points.len() - 1);
            }
            other => panic!("{id}: unexpected {other:?}"),
        }
    }
}

#[test]
fn render_then_clear_leaves_zero_segments() {
    let graph = WaypointGraph::facility();
    for section in Section::ALL {
        let points = graph.points_for(section).unwrap();
        let mut diagram = Diagram::new();
        diagram.render_route(&points);
        diagram.render_route(&points);
        assert_eq!(diagram.route().len(), points.len() - 1);
        diagram.clear_paths();
        assert!(diagram.route().is_empty());
    }
}
