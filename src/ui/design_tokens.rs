use eframe::egui::{self, Color32, FontId, RichText};

pub const FONT_SIZE_11: f32 = 11.0;
pub const FONT_SIZE_13: f32 = 13.0;

pub const CONTROL_PANEL_WIDTH: f32 = 300.0;
pub const SECTION_GAP: f32 = 8.0;
pub const OVERLAY_ORIGIN: egui::Pos2 = egui::pos2(10.0, 10.0);

pub const GRAPH_BG: Color32 = Color32::from_rgb(0x17, 0x17, 0x17);

/// Clear color of the HDR framebuffer.
pub const HDR_CLEAR_COLOR: [f64; 4] = [0.38, 0.52, 0.10, 1.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRole {
    SectionTitle,
    AttributeTitle,
    Overlay,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyleToken {
    pub size: f32,
    pub color: Color32,
}

pub fn text_style(role: TextRole) -> TextStyleToken {
    match role {
        TextRole::SectionTitle => TextStyleToken {
            size: FONT_SIZE_13,
            color: white(90),
        },
        TextRole::AttributeTitle => TextStyleToken {
            size: FONT_SIZE_11,
            color: white(60),
        },
        TextRole::Overlay => TextStyleToken {
            size: FONT_SIZE_13,
            color: white(100),
        },
        TextRole::Error => TextStyleToken {
            size: FONT_SIZE_11,
            color: error_fg(),
        },
    }
}

pub fn font_id(role: TextRole) -> FontId {
    FontId::proportional(text_style(role).size)
}

pub fn rich_text(text: impl Into<String>, role: TextRole) -> RichText {
    let style = text_style(role);
    RichText::new(text).font(font_id(role)).color(style.color)
}

pub fn error_fg() -> Color32 {
    Color32::from_rgb(255, 118, 118)
}

pub fn white(step: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(255, 255, 255, alpha_from_step(step))
}

fn alpha_from_step(step: u8) -> u8 {
    let canonical = canonical_step(step);
    ((canonical as f32 / 100.0) * 255.0).round() as u8
}

fn canonical_step(step: u8) -> u8 {
    let clamped = step.clamp(10, 100);
    let rounded = (((clamped as f32) / 10.0).round() * 10.0) as u8;
    rounded.clamp(10, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_round_to_tens() {
        assert_eq!(canonical_step(0), 10);
        assert_eq!(canonical_step(64), 60);
        assert_eq!(canonical_step(255), 100);
    }

    #[test]
    fn full_white_is_opaque() {
        assert_eq!(white(100).a(), 255);
    }
}
