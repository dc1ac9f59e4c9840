use eframe::egui::Color32;

use crate::parking::SpotStatus;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    pub foreground: Color32,
    pub lot: Color32,
    pub panel: Color32,
    pub available: Color32,
    pub available_hover: Color32,
    pub occupied: Color32,
    pub occupied_hover: Color32,
    pub unknown: Color32,
    pub unknown_hover: Color32,
    pub route: Color32,
    pub reroute: Color32,
    pub entry: Color32,
    pub label_size: f32,
    pub status_size: f32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(0x1E, 0x1E, 0x1E),
            foreground: Color32::from_rgb(0xC8, 0xC8, 0xC8),
            lot: Color32::from_rgb(0x2D, 0x2D, 0x2D),
            panel: Color32::from_rgb(0x26, 0x26, 0x26),
            available: Color32::from_rgb(0x00, 0xFF, 0xFF),
            available_hover: Color32::from_rgb(0x00, 0x8B, 0x8B),
            occupied: Color32::from_rgb(0xFF, 0x00, 0x00),
            occupied_hover: Color32::from_rgb(0x8B, 0x00, 0x00),
            unknown: Color32::from_rgb(0xA9, 0xA9, 0xA9),
            unknown_hover: Color32::from_rgb(0x80, 0x80, 0x80),
            route: Color32::from_rgb(0xFF, 0x45, 0x45),
            reroute: Color32::from_rgb(0xE8, 0xA8, 0x38),
            entry: Color32::from_rgb(0x52, 0x94, 0xE2),
            label_size: 8.0,
            status_size: 14.0,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::WHITE,
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            lot: Color32::from_rgb(0x55, 0x55, 0x55),
            panel: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            available: Color32::from_rgb(0x00, 0xFF, 0xFF),
            available_hover: Color32::from_rgb(0x00, 0x8B, 0x8B),
            occupied: Color32::from_rgb(0xFF, 0x00, 0x00),
            occupied_hover: Color32::from_rgb(0x8B, 0x00, 0x00),
            unknown: Color32::from_rgb(0xA9, 0xA9, 0xA9),
            unknown_hover: Color32::from_rgb(0x80, 0x80, 0x80),
            route: Color32::from_rgb(0xFF, 0x00, 0x00),
            reroute: Color32::from_rgb(0xC7, 0x3E, 0x1D),
            entry: Color32::from_rgb(0x0F, 0x34, 0x60),
            label_size: 8.0,
            status_size: 14.0,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    pub fn toggled(&self) -> Self {
        if self.name == "dark" {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }

    /// Fill for a spot. Derived from status only; never read back.
    pub fn spot_fill(&self, status: SpotStatus, hovered: bool) -> Color32 {
        match (status, hovered) {
            (SpotStatus::Available, false) => self.available,
            (SpotStatus::Available, true) => self.available_hover,
            (SpotStatus::Occupied, false) => self.occupied,
            (SpotStatus::Occupied, true) => self.occupied_hover,
            (SpotStatus::Unknown, false) => self.unknown,
            (SpotStatus::Unknown, true) => self.unknown_hover,
        }
    }

    /// Spot number color, inverted while hovered.
    pub fn label_color(&self, hovered: bool) -> Color32 {
        if hovered {
            Color32::WHITE
        } else {
            Color32::BLACK
        }
    }

    /// Entry/exit label color: light on the marker, dark while hovered.
    pub fn entry_label_color(&self, hovered: bool) -> Color32 {
        if hovered {
            Color32::BLACK
        } else {
            Color32::WHITE
        }
    }

    /// `#rrggbb` form of a color, for SVG output.
    pub fn hex(color: Color32) -> String {
        format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_depends_only_on_status_and_hover() {
        let theme = Theme::light();
        assert_eq!(theme.spot_fill(SpotStatus::Occupied, false), theme.occupied);
        assert_eq!(theme.spot_fill(SpotStatus::Occupied, true), theme.occupied_hover);
        assert_eq!(theme.spot_fill(SpotStatus::Unknown, false), theme.unknown);
        assert_ne!(
            theme.spot_fill(SpotStatus::Available, false),
            theme.spot_fill(SpotStatus::Available, true)
        );
    }

    #[test]
    fn entry_label_inverts_on_hover() {
        let theme = Theme::dark();
        assert_eq!(theme.entry_label_color(false), Color32::WHITE);
        assert_eq!(theme.entry_label_color(true), Color32::BLACK);
    }

    #[test]
    fn hex_formats_rgb() {
        assert_eq!(Theme::hex(Color32::from_rgb(0, 0xFF, 0x10)), "#00ff10");
    }

    #[test]
    fn toggled_switches_name() {
        assert_eq!(Theme::from_name("dark").toggled().name, "light");
        assert_eq!(Theme::from_name("anything").name, "light");
    }
}
