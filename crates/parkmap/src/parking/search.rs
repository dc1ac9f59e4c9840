use super::registry::SpotRegistry;
use super::types::{Section, Spot, SpotStatus};

/// Find the closest available spot to `number` within `section`.
///
/// Searches outward one offset at a time, checking `number - offset` before
/// `number + offset`, so the lower-numbered spot wins a tie. The search never
/// leaves the section: a fully occupied row yields `None` even when other
/// rows have room.
///
/// Cost is O(n) in the section size per call. It runs once per newly
/// occupied spot per snapshot, so a row that fills up in one poll costs
/// O(n²); fine for rows of a few dozen spots, worth revisiting for much
/// larger sections.
pub fn find_nearest(registry: &SpotRegistry, section: Section, number: u32) -> Option<&Spot> {
    let spots = registry.section_spots(section);
    let origin = i64::from(number);
    for offset in 1..=spots.len() as i64 {
        if let Some(spot) = available_at(spots, origin - offset) {
            return Some(spot);
        }
        if let Some(spot) = available_at(spots, origin + offset) {
            return Some(spot);
        }
    }
    None
}

fn available_at(spots: &[Spot], number: i64) -> Option<&Spot> {
    let index = usize::try_from(number.checked_sub(1)?).ok()?;
    spots
        .get(index)
        .filter(|spot| spot.status == SpotStatus::Available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::layout::Layout;
    use crate::parking::types::SpotStatus::{Available as Free, Occupied as Taken, Unknown as Unk};
    use crate::parking::types::{SpotId, StatusRecord};

    fn registry_with(section: Section, statuses: &[SpotStatus]) -> SpotRegistry {
        let mut layout = Layout::facility();
        layout.sections.get_mut(&section).unwrap().spots = statuses.len() as u32;
        let mut registry = SpotRegistry::initialize(&layout);
        let records: Vec<StatusRecord> = statuses
            .iter()
            .enumerate()
            .map(|(i, &status)| StatusRecord::new(section.as_str(), i as i64 + 1, status))
            .collect();
        registry.apply_snapshot(&records);
        registry
    }

    #[test]
    fn before_wins_a_tie() {
        let registry = registry_with(Section::B2, &[Free, Free, Taken, Free, Free]);
        let found = find_nearest(&registry, Section::B2, 3).unwrap();
        assert_eq!(found.id, SpotId::new(Section::B2, 2));
    }

    #[test]
    fn after_found_when_before_is_taken() {
        let registry = registry_with(Section::A, &[Taken, Taken, Taken, Free, Free]);
        let found = find_nearest(&registry, Section::A, 3).unwrap();
        assert_eq!(found.id, SpotId::new(Section::A, 4));
    }

    #[test]
    fn smaller_offset_beats_before_preference() {
        let registry = registry_with(Section::C1, &[Free, Taken, Taken, Taken, Free, Taken]);
        // 5 is at offset 1 from 4, 1 is at offset 3.
        let found = find_nearest(&registry, Section::C1, 4).unwrap();
        assert_eq!(found.id.number, 5);
    }

    #[test]
    fn unknown_spots_are_not_candidates() {
        let registry = registry_with(Section::D, &[Unk, Taken, Unk, Free]);
        let found = find_nearest(&registry, Section::D, 2).unwrap();
        assert_eq!(found.id.number, 4);
    }

    #[test]
    fn reaches_the_far_end_of_the_row() {
        let registry = registry_with(Section::E, &[Taken, Taken, Taken, Taken, Taken, Free]);
        let found = find_nearest(&registry, Section::E, 1).unwrap();
        assert_eq!(found.id.number, 6);
    }

    #[test]
    fn none_when_section_has_no_free_spot() {
        let registry = registry_with(Section::B1, &[Taken, Unk, Taken]);
        assert!(find_nearest(&registry, Section::B1, 1).is_none());
    }

    #[test]
    fn single_spot_section_is_searched_normally() {
        let registry = registry_with(Section::D, &[Taken]);
        assert!(find_nearest(&registry, Section::D, 1).is_none());
    }

    #[test]
    fn never_crosses_into_another_section() {
        let mut registry = registry_with(Section::B1, &[Taken, Taken]);
        registry.apply_snapshot(&[StatusRecord::new("B2", 1, Free)]);
        assert!(find_nearest(&registry, Section::B1, 1).is_none());
    }
}
