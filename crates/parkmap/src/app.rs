use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use tracing::info;

use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::parking::poller::{PollEvent, PollerHandle, spawn_background};
use crate::parking::{ClickOutcome, ParkingMap, Point, Segment, SpotId};
use crate::theme::Theme;

const REJECTED_MESSAGE: &str = "This spot is occupied and cannot be routed.";
const TOAST_DURATION: f32 = 2.5;
const TOAST_FADE_START: f32 = 2.0;
const STATUS_BAR_HEIGHT: f32 = 28.0;
const MAP_MARGIN: f32 = 12.0;

struct ParkingApp {
    map: ParkingMap,
    theme: Theme,
    poller: Option<PollerHandle>,
    source: String,
    hovered: Option<SpotId>,
    entry_hovered: bool,
    toast: Option<Toast>,
    show_hud: bool,
    is_fullscreen: bool,
}

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        if elapsed < TOAST_FADE_START {
            1.0
        } else if elapsed < TOAST_DURATION {
            1.0 - (elapsed - TOAST_FADE_START) / (TOAST_DURATION - TOAST_FADE_START)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= TOAST_DURATION
    }
}

/// Maps diagram coordinates onto the screen, preserving aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MapView {
    origin: egui::Pos2,
    min: Point,
    scale: f32,
}

impl MapView {
    /// Fit the diagram box `min..max` centered into `rect`.
    fn fit(rect: egui::Rect, min: Point, max: Point) -> Self {
        let width = (max.x - min.x).max(1.0);
        let height = (max.y - min.y).max(1.0);
        let scale = (rect.width() / width).min(rect.height() / height).max(0.01);
        let origin = egui::pos2(
            rect.center().x - width * scale / 2.0,
            rect.center().y - height * scale / 2.0,
        );
        Self { origin, min, scale }
    }

    fn to_screen(&self, p: Point) -> egui::Pos2 {
        egui::pos2(
            self.origin.x + (p.x - self.min.x) * self.scale,
            self.origin.y + (p.y - self.min.y) * self.scale,
        )
    }

    fn to_diagram(&self, pos: egui::Pos2) -> Point {
        Point::new(
            self.min.x + (pos.x - self.origin.x) / self.scale,
            self.min.y + (pos.y - self.origin.y) / self.scale,
        )
    }
}

impl ParkingApp {
    fn new(map: ParkingMap, theme: Theme, poller: Option<PollerHandle>, source: String) -> Self {
        Self {
            map,
            theme,
            poller,
            source,
            hovered: None,
            entry_hovered: false,
            toast: None,
            show_hud: false,
            is_fullscreen: false,
        }
    }

    /// Apply everything the poller has delivered since the last frame.
    fn apply_poll_events(&mut self) {
        let Some(poller) = &self.poller else { return };
        for event in poller.drain() {
            match event {
                PollEvent::Snapshot(snapshot) => {
                    let update = self.map.apply_snapshot(&snapshot.records);
                    if update.report.has_transitions() {
                        info!(
                            occupied = update.report.newly_occupied.len(),
                            released = update.report.released.len(),
                            reroutes = update.reroutes.len(),
                            "occupancy changed"
                        );
                    }
                }
                PollEvent::Failed(error) => self.map.record_poll_failure(error),
            }
        }
    }

    fn handle_click(&mut self, spot: SpotId) {
        match self.map.click(spot) {
            ClickOutcome::Rejected { .. } => self.toast = Some(Toast::new(REJECTED_MESSAGE)),
            ClickOutcome::NoRoute { section } => {
                self.toast = Some(Toast::new(format!("No route into section {section}")))
            }
            ClickOutcome::Drawn { .. } | ClickOutcome::Cleared | ClickOutcome::UnknownSpot => {}
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.toast = Some(Toast::new(format!("Theme: {}", self.theme.name)));
    }

    fn map_view(&self, rect: egui::Rect) -> MapView {
        let (min, max) = crate::svg::bounds(&self.map);
        let inner = egui::Rect::from_min_max(
            rect.min + egui::vec2(MAP_MARGIN, MAP_MARGIN),
            rect.max - egui::vec2(MAP_MARGIN, MAP_MARGIN + STATUS_BAR_HEIGHT),
        );
        MapView::fit(inner, min, max)
    }

    fn draw_spots(&self, ui: &egui::Ui, view: &MapView) {
        let painter = ui.painter();
        let show_labels = view.scale * self.theme.label_size >= 9.0;
        for spot in self.map.registry().spots() {
            let Some(geometry) = self.map.layout().geometry(spot.id.section) else {
                continue;
            };
            let (lo, hi) = geometry.rect(spot.position);
            let rect = egui::Rect::from_min_max(view.to_screen(lo), view.to_screen(hi));
            let hovered = self.hovered == Some(spot.id);
            painter.rect_filled(rect, 1.0, self.theme.spot_fill(spot.status, hovered));
            painter.rect_stroke(
                rect,
                1.0,
                egui::Stroke::new(1.0, self.theme.lot),
                egui::StrokeKind::Inside,
            );
            if show_labels {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    spot.id.number.to_string(),
                    egui::FontId::proportional(self.theme.label_size * view.scale * 0.6),
                    self.theme.label_color(hovered),
                );
            }
        }

        self.draw_entry(ui, view);
    }

    fn draw_entry(&self, ui: &egui::Ui, view: &MapView) {
        let painter = ui.painter();
        let entry = self.map.layout().entry;
        let (lo, hi) = crate::svg::entry_box(entry);
        let rect = egui::Rect::from_min_max(view.to_screen(lo), view.to_screen(hi));
        painter.rect_filled(rect, 1.0, self.theme.entry);

        let font = egui::FontId::proportional(crate::svg::ENTRY_LABEL_SIZE * view.scale);
        let color = self.theme.entry_label_color(self.entry_hovered);
        for (text, at) in crate::svg::entry_label(entry) {
            painter.text(
                view.to_screen(at),
                egui::Align2::CENTER_CENTER,
                text,
                font.clone(),
                color,
            );
        }
    }

    /// Update hover state for a pointer at `pos`, in diagram coordinates.
    fn hover(&mut self, pos: Option<Point>) {
        self.hovered =
            pos.and_then(|p| self.map.registry().spot_at(self.map.layout(), p));
        self.entry_hovered = self.hovered.is_none()
            && pos.is_some_and(|p| crate::svg::entry_contains(self.map.layout().entry, p));
    }

    fn draw_paths(&self, ui: &egui::Ui, view: &MapView) {
        let width = (1.5 * view.scale).max(2.0);
        for (_, segments) in self.map.diagram().reroutes() {
            draw_segments(ui, view, segments, egui::Stroke::new(width, self.theme.reroute));
        }
        draw_segments(
            ui,
            view,
            self.map.diagram().route(),
            egui::Stroke::new(width, self.theme.route),
        );
    }

    fn draw_status_bar(&self, ui: &egui::Ui, rect: egui::Rect) {
        let bar = egui::Rect::from_min_max(
            egui::pos2(rect.left(), rect.bottom() - STATUS_BAR_HEIGHT),
            rect.max,
        );
        let painter = ui.painter();
        painter.rect_filled(bar, 0.0, self.theme.panel);

        let counts = self.map.registry().counts();
        let polled = match self.map.last_success() {
            Some(at) => {
                let secs = at.elapsed().map(|d| d.as_secs()).unwrap_or_default();
                format!("updated {secs}s ago")
            }
            None => "waiting for first snapshot".to_string(),
        };
        let hovered = self
            .hovered
            .and_then(|id| self.map.registry().spot(id))
            .map(|spot| format!("   {} {}", spot.id, spot.status))
            .unwrap_or_default();
        let text = format!(
            "{} spots: {} available   {} occupied   {} unknown   {}   {polled}{hovered}",
            counts.total(),
            counts.available,
            counts.occupied,
            counts.unknown,
            self.source
        );
        let font = egui::FontId::proportional(self.theme.status_size);
        painter.text(
            egui::pos2(bar.left() + 10.0, bar.center().y),
            egui::Align2::LEFT_CENTER,
            text,
            font.clone(),
            self.theme.foreground,
        );

        if let Some(error) = self.map.last_error() {
            painter.text(
                egui::pos2(bar.right() - 10.0, bar.center().y),
                egui::Align2::RIGHT_CENTER,
                format!("poll failed: {error}"),
                font,
                self.theme.occupied,
            );
        }
    }

    fn draw_toast(&self, ui: &egui::Ui, ctx: &egui::Context, rect: egui::Rect) {
        let Some(toast) = &self.toast else { return };
        let opacity = toast.opacity();
        if opacity <= 0.0 {
            return;
        }
        let toast_color = Theme::with_opacity(self.theme.foreground, opacity * 0.9);
        let toast_bg = Theme::with_opacity(self.theme.panel, opacity * 0.9);
        let galley = ui.painter().layout_no_wrap(
            toast.message.clone(),
            egui::FontId::proportional(18.0),
            toast_color,
        );
        let padding = 14.0;
        let toast_rect = egui::Rect::from_min_size(
            egui::pos2(
                rect.center().x - galley.rect.width() / 2.0 - padding,
                rect.bottom() - STATUS_BAR_HEIGHT - 70.0,
            ),
            egui::vec2(
                galley.rect.width() + padding * 2.0,
                galley.rect.height() + padding * 2.0,
            ),
        );
        ui.painter().rect_filled(toast_rect, 8.0, toast_bg);
        let text_pos = egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding);
        ui.painter().galley(text_pos, galley, toast_color);
        ctx.request_repaint();
    }
}

fn draw_segments(ui: &egui::Ui, view: &MapView, segments: &[Segment], stroke: egui::Stroke) {
    let painter = ui.painter();
    for segment in segments {
        let from = view.to_screen(segment.from);
        let to = view.to_screen(segment.to);
        painter.line_segment([from, to], stroke);
        // Round caps.
        painter.circle_filled(from, stroke.width / 2.0, stroke.color);
        painter.circle_filled(to, stroke.width / 2.0, stroke.color);
    }
}

fn draw_hud(ui: &egui::Ui, theme: &Theme, rect: egui::Rect) {
    let shortcuts = [
        ("Click", "Route to spot / click again to clear"),
        ("Esc", "Clear route"),
        ("D", "Toggle theme"),
        ("F", "Toggle fullscreen"),
        ("H", "Toggle this HUD"),
        ("Q", "Quit"),
    ];

    let bg = Theme::with_opacity(theme.panel, 0.92);
    let text_color = Theme::with_opacity(theme.foreground, 0.9);
    let key_color = Theme::with_opacity(theme.entry, 0.9);

    let padding = 20.0;
    let line_height = 26.0;
    let hud_height = shortcuts.len() as f32 * line_height + padding * 2.0;
    let hud_rect = egui::Rect::from_center_size(rect.center(), egui::vec2(380.0, hud_height));
    ui.painter().rect_filled(hud_rect, 10.0, bg);

    let mut y = hud_rect.top() + padding;
    for (key, desc) in &shortcuts {
        ui.painter().text(
            egui::pos2(hud_rect.left() + padding, y),
            egui::Align2::LEFT_TOP,
            key,
            egui::FontId::monospace(14.0),
            key_color,
        );
        ui.painter().text(
            egui::pos2(hud_rect.left() + padding + 80.0, y),
            egui::Align2::LEFT_TOP,
            desc,
            egui::FontId::proportional(14.0),
            text_color,
        );
        y += line_height;
    }
}

impl eframe::App for ParkingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_poll_events();

        // Collect viewport commands to send AFTER the input closure
        // (sending inside ctx.input() causes RwLock deadlock)
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();
        let mut toggle_theme = false;
        let mut clear_route = false;

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                viewport_cmds.push(egui::ViewportCommand::Close);
                return;
            }
            if i.key_pressed(egui::Key::Escape) {
                clear_route = true;
            }
            if i.key_pressed(egui::Key::F) {
                self.is_fullscreen = !self.is_fullscreen;
                viewport_cmds.push(egui::ViewportCommand::Fullscreen(self.is_fullscreen));
            }
            if i.key_pressed(egui::Key::D) {
                toggle_theme = true;
            }
            if i.key_pressed(egui::Key::H) {
                self.show_hud = !self.show_hud;
            }
        });

        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }
        if toggle_theme {
            self.toggle_theme();
        }
        if clear_route {
            self.map.clear_route();
        }
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }

        let bg = self.theme.background;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                ui.painter().rect_filled(rect, 0.0, bg);
                let view = self.map_view(rect);

                let (pointer, clicked) =
                    ctx.input(|i| (i.pointer.hover_pos(), i.pointer.primary_clicked()));
                self.hover(pointer.map(|pos| view.to_diagram(pos)));
                if clicked {
                    if let Some(spot) = self.hovered {
                        self.handle_click(spot);
                    }
                }

                self.draw_spots(ui, &view);
                self.draw_paths(ui, &view);
                self.draw_status_bar(ui, rect);
                self.draw_toast(ui, ctx, rect);
                if self.show_hud {
                    draw_hud(ui, &self.theme, rect);
                }
            });

        // Keeps the "updated Ns ago" label fresh between polls.
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}

pub fn run(globals: &GlobalArgs, snapshot: Option<PathBuf>, fullscreen: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default();
    let map = crate::commands::load_map(globals, &config)?;
    let source = crate::commands::snapshot_source(globals, &config, snapshot);
    let source_label = source.describe();
    let interval = config.poll_interval();
    let theme = Theme::from_name(config.theme_name());
    let windowed = !fullscreen && config.windowed();

    let title = format!("parkmap: {source_label}");
    let viewport = if windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let poller = spawn_background(source, interval, move || ctx.request_repaint())?;
            let mut app = ParkingApp::new(map, theme, Some(poller), source_label);
            app.is_fullscreen = !windowed;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::{Section, SpotStatus, StatusRecord};

    fn app() -> ParkingApp {
        let map = ParkingMap::facility().unwrap();
        ParkingApp::new(map, Theme::light(), None, "test".to_string())
    }

    #[test]
    fn map_view_round_trips_points() {
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 400.0));
        let view = MapView::fit(rect, Point::new(0.0, 0.0), Point::new(400.0, 100.0));
        assert!((view.scale - 2.0).abs() < 1e-6);

        let p = Point::new(123.0, 45.0);
        let back = view.to_diagram(view.to_screen(p));
        assert!((back.x - p.x).abs() < 1e-3);
        assert!((back.y - p.y).abs() < 1e-3);
    }

    #[test]
    fn map_view_centers_the_short_axis() {
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(400.0, 400.0));
        let view = MapView::fit(rect, Point::new(0.0, 0.0), Point::new(200.0, 100.0));
        let top_left = view.to_screen(Point::new(0.0, 0.0));
        assert!((top_left.x - 0.0).abs() < 1e-3);
        assert!((top_left.y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn clicking_occupied_spot_shows_rejection_toast() {
        let mut app = app();
        app.map
            .apply_snapshot(&[StatusRecord::new("B2", 3, SpotStatus::Occupied)]);
        app.handle_click(SpotId::new(Section::B2, 3));
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.message, REJECTED_MESSAGE);
        assert!(app.map.diagram().route().is_empty());
    }

    #[test]
    fn clicking_free_spot_draws_without_toast() {
        let mut app = app();
        app.handle_click(SpotId::new(Section::A, 4));
        assert!(app.toast.is_none());
        assert!(!app.map.diagram().route().is_empty());
    }

    #[test]
    fn hovering_entry_marks_it_not_a_spot() {
        let mut app = app();
        let entry = app.map.layout().entry;
        let (lo, hi) = crate::svg::entry_box(entry);
        app.hover(Some(Point::new((lo.x + hi.x) / 2.0, (lo.y + hi.y) / 2.0)));
        assert!(app.entry_hovered);
        assert!(app.hovered.is_none());

        app.hover(None);
        assert!(!app.entry_hovered);
    }

    #[test]
    fn toast_fades_out() {
        let mut toast = Toast::new("hi");
        assert_eq!(toast.opacity(), 1.0);
        toast.start = Instant::now() - Duration::from_secs(5);
        assert_eq!(toast.opacity(), 0.0);
        assert!(toast.is_expired());
    }
}
