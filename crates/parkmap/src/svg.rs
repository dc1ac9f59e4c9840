use std::fmt::Write;

use crate::parking::{ParkingMap, Point, Segment};
use crate::theme::Theme;

const MARGIN: f32 = 10.0;
const PATH_WIDTH: f32 = 2.0;

/// Size of the entry/exit box; the layout's entry point is its top-left corner.
pub const ENTRY_SIZE: (f32, f32) = (21.0, 50.0);
pub const ENTRY_LABEL_SIZE: f32 = 8.0;
const ENTRY_LABEL: [&str; 3] = ["entry", "/", "exit"];
const ENTRY_LABEL_LEADING: f32 = 10.0;

/// Corners of the entry/exit box.
pub fn entry_box(entry: Point) -> (Point, Point) {
    (entry, Point::new(entry.x + ENTRY_SIZE.0, entry.y + ENTRY_SIZE.1))
}

pub fn entry_contains(entry: Point, p: Point) -> bool {
    let (lo, hi) = entry_box(entry);
    p.x >= lo.x && p.x <= hi.x && p.y >= lo.y && p.y <= hi.y
}

/// The "entry / exit" label, one line per item, centred in the box.
pub fn entry_label(entry: Point) -> [(&'static str, Point); 3] {
    let (lo, hi) = entry_box(entry);
    let cx = (lo.x + hi.x) / 2.0;
    let cy = (lo.y + hi.y) / 2.0;
    let line = |i: usize| (ENTRY_LABEL[i], Point::new(cx, cy + (i as f32 - 1.0) * ENTRY_LABEL_LEADING));
    [line(0), line(1), line(2)]
}

/// Bounding box of everything the map draws, in diagram coordinates.
pub fn bounds(map: &ParkingMap) -> (Point, Point) {
    let layout = map.layout();
    let (mut min, mut max) = entry_box(layout.entry);
    let mut include = |p: Point| {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    };
    for spot in map.registry().spots() {
        if let Some(geometry) = layout.geometry(spot.id.section) {
            let (lo, hi) = geometry.rect(spot.position);
            include(lo);
            include(hi);
        }
    }
    for id in map.graph().waypoints.values() {
        include(*id);
    }
    for segment in map.diagram().segments() {
        include(segment.from);
        include(segment.to);
    }
    (min, max)
}

/// Render the current map state as a standalone SVG document.
///
/// Spot fill comes from the spot's status through the theme; paths are drawn
/// after the spots so they stay visible.
pub fn render_svg(map: &ParkingMap, theme: &Theme) -> String {
    let (min, max) = bounds(map);
    let x = min.x - MARGIN;
    let y = min.y - MARGIN;
    let width = max.x - min.x + MARGIN * 2.0;
    let height = max.y - min.y + MARGIN * 2.0;

    let mut svg = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{x} {y} {width} {height}" width="{w}" height="{h}">"#,
        w = width * 2.0,
        h = height * 2.0,
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{}"/>"#,
        Theme::hex(theme.background)
    );

    let _ = writeln!(svg, r#"  <g id="spots" font-family="sans-serif" font-size="{}">"#, theme.label_size);
    for spot in map.registry().spots() {
        let Some(geometry) = map.layout().geometry(spot.id.section) else {
            continue;
        };
        let (lo, hi) = geometry.rect(spot.position);
        let fill = Theme::hex(theme.spot_fill(spot.status, false));
        let _ = writeln!(
            svg,
            r#"    <rect id="{id}" x="{}" y="{}" width="{}" height="{}" fill="{fill}" stroke="{}" stroke-width="0.5"><title>{id} {status}</title></rect>"#,
            lo.x,
            lo.y,
            hi.x - lo.x,
            hi.y - lo.y,
            Theme::hex(theme.lot),
            id = spot.id,
            status = spot.status,
        );
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" fill="{}">{}</text>"#,
            (lo.x + hi.x) / 2.0,
            (lo.y + hi.y) / 2.0,
            Theme::hex(theme.label_color(false)),
            spot.id.number,
        );
    }
    let _ = writeln!(svg, "  </g>");

    let (lo, hi) = entry_box(map.layout().entry);
    let _ = writeln!(
        svg,
        r#"  <g id="entry-exit" font-family="sans-serif" font-size="{ENTRY_LABEL_SIZE}">"#
    );
    let _ = writeln!(
        svg,
        r#"    <rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
        lo.x,
        lo.y,
        hi.x - lo.x,
        hi.y - lo.y,
        Theme::hex(theme.entry)
    );
    for (text, at) in entry_label(map.layout().entry) {
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" fill="{}">{text}</text>"#,
            at.x,
            at.y,
            Theme::hex(theme.entry_label_color(false)),
        );
    }
    let _ = writeln!(svg, "  </g>");

    let _ = writeln!(svg, r#"  <g id="reroutes">"#);
    for (spot, segments) in map.diagram().reroutes() {
        write_path(&mut svg, &format!("reroute-{spot}"), segments, theme.reroute);
    }
    let _ = writeln!(svg, "  </g>");
    write_path(&mut svg, "route", map.diagram().route(), theme.route);

    svg.push_str("</svg>\n");
    svg
}

fn write_path(svg: &mut String, id: &str, segments: &[Segment], color: eframe::egui::Color32) {
    if segments.is_empty() {
        return;
    }
    let _ = write!(svg, r#"  <g id="{id}" stroke="{}" stroke-width="{PATH_WIDTH}" stroke-linecap="round">"#, Theme::hex(color));
    for segment in segments {
        let _ = write!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
            segment.from.x, segment.from.y, segment.to.x, segment.to.y
        );
    }
    svg.push_str("</g>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::{Section, SpotId, SpotStatus, StatusRecord};

    #[test]
    fn empty_map_has_every_spot_and_no_paths() {
        let map = ParkingMap::facility().unwrap();
        let svg = render_svg(&map, &Theme::light());
        assert_eq!(svg.matches("<title>").count(), map.layout().spot_count());
        assert!(!svg.contains("<line"));
        assert!(svg.contains(r#"id="entry-exit""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn entry_exit_is_labelled() {
        let map = ParkingMap::facility().unwrap();
        let svg = render_svg(&map, &Theme::dark());
        for word in [">entry<", ">/<", ">exit<"] {
            assert!(svg.contains(word), "missing {word}");
        }

        let entry = map.layout().entry;
        let lines = entry_label(entry);
        assert!(lines.iter().all(|(_, p)| entry_contains(entry, *p)));
        assert!(lines[0].1.y < lines[1].1.y && lines[1].1.y < lines[2].1.y);

        let (min, max) = bounds(&map);
        let (_, corner) = entry_box(entry);
        assert!(min.x <= entry.x && min.y <= entry.y);
        assert!(max.x >= corner.x && max.y >= corner.y);
    }

    #[test]
    fn fill_follows_status() {
        let theme = Theme::light();
        let mut map = ParkingMap::facility().unwrap();
        map.apply_snapshot(&[StatusRecord::new("C2", 4, SpotStatus::Occupied)]);
        let svg = render_svg(&map, &theme);
        let line = svg
            .lines()
            .find(|l| l.contains(r#"id="C2:4""#))
            .unwrap();
        assert!(line.contains(&Theme::hex(theme.occupied)));
        let other = svg.lines().find(|l| l.contains(r#"id="C2:5""#)).unwrap();
        assert!(other.contains(&Theme::hex(theme.unknown)));
    }

    #[test]
    fn route_and_reroutes_are_drawn_with_round_caps() {
        let mut map = ParkingMap::facility().unwrap();
        map.apply_snapshot(&[
            StatusRecord::new("B1", 1, SpotStatus::Occupied),
            StatusRecord::new("B1", 2, SpotStatus::Available),
        ]);
        map.click(SpotId::new(Section::B1, 2));
        let svg = render_svg(&map, &Theme::dark());
        assert!(svg.contains(r#"id="reroute-B1:1""#));
        assert!(svg.contains(r#"<g id="route""#));
        assert_eq!(svg.matches("<line").count(), 3 + map.diagram().route().len());
        assert!(svg.contains(r#"stroke-linecap="round""#));
    }
}
