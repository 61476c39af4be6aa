//! Control panel groups. Widgets mutate [`UiState`] directly and report the
//! events the application has to act on.

use std::path::PathBuf;

use eframe::egui;

use crate::renderer::tone_mapping::{ToneMapOperator, ToneMappingSettings};
use crate::state::{
    GRAPH_SCALE_RANGE, GRAPH_SCALE_STEP, HistogramMode, ImageUnit, ScenePreset, UiState, Variant,
};
use crate::ui::design_tokens::{self, TextRole};

pub const IMAGE_EXTENSIONS: [&str; 5] = ["hdr", "exr", "png", "jpg", "jpeg"];

pub const SRGB_LABEL: &str = "sRGB";
pub const IMAGE_UNIT_LABEL: &str = "Radiometry/Photometry";
pub const SCENE_PRESET_LABEL: &str = "Scene Preset";

const EXPOSURE_KEY_RANGE: std::ops::RangeInclusive<f32> = 0.0001..=200.0;
const COMPENSATION_RANGE: std::ops::RangeInclusive<f32> = -12.0..=12.0;
const WHITE_MAX_LUMINANCE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=100.0;
const WHITE_SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=100.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelEvents {
    /// A file was picked; load it in place of the current image.
    pub load_path: Option<PathBuf>,
    /// The sRGB flag changed; reload the current path.
    pub reload: bool,
}

pub fn section(ui: &mut egui::Ui, title: &str, body: impl FnOnce(&mut egui::Ui)) {
    egui::CollapsingHeader::new(design_tokens::rich_text(title, TextRole::SectionTitle))
        .id_salt(title)
        .default_open(true)
        .show(ui, body);
    ui.add_space(design_tokens::SECTION_GAP);
}

fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .pick_file()
}

pub fn image_group(
    ui: &mut egui::Ui,
    variant: Variant,
    state: &mut UiState,
    last_error: Option<&str>,
) -> PanelEvents {
    let mut events = PanelEvents::default();

    section(ui, variant.image_group_label(), |ui| {
        if ui.button("Load HDR Image").clicked() {
            events.load_path = pick_image_file();
        }

        if let Some(path) = state.image_path.as_ref() {
            ui.label(design_tokens::rich_text(
                path.display().to_string(),
                TextRole::AttributeTitle,
            ));
        }

        if ui.checkbox(&mut state.srgb, SRGB_LABEL).changed() {
            events.reload = true;
        }

        match variant {
            Variant::Analysis => {
                egui::ComboBox::from_label(IMAGE_UNIT_LABEL)
                    .selected_text(state.image_unit.label())
                    .show_ui(ui, |ui| {
                        for unit in ImageUnit::ALL {
                            ui.selectable_value(&mut state.image_unit, unit, unit.label());
                        }
                    });
            }
            Variant::Basic => {
                egui::ComboBox::from_label(SCENE_PRESET_LABEL)
                    .selected_text(state.scene_preset.label())
                    .show_ui(ui, |ui| {
                        for preset in ScenePreset::ALL {
                            ui.selectable_value(&mut state.scene_preset, preset, preset.label());
                        }
                    });
            }
        }

        if let Some(message) = last_error {
            ui.label(design_tokens::rich_text(message, TextRole::Error));
        }
    });

    events
}

pub fn tone_mapping_group(ui: &mut egui::Ui, settings: &mut ToneMappingSettings) {
    section(ui, "HDR", |ui| {
        egui::ComboBox::from_label("Operator")
            .selected_text(settings.operator.label())
            .show_ui(ui, |ui| {
                for op in ToneMapOperator::ALL {
                    ui.selectable_value(&mut settings.operator, op, op.label());
                }
            });

        ui.checkbox(&mut settings.auto_exposure, "Auto Exposure");
        ui.add(
            egui::Slider::new(&mut settings.exposure_key, EXPOSURE_KEY_RANGE)
                .logarithmic(true)
                .text("Exposure Key"),
        );
        ui.add(
            egui::Slider::new(&mut settings.exposure_compensation, COMPENSATION_RANGE)
                .step_by(0.1)
                .text("Exposure Compensation"),
        );

        if settings.operator.uses_white_max_luminance() {
            ui.add(
                egui::Slider::new(&mut settings.white_max_luminance, WHITE_MAX_LUMINANCE_RANGE)
                    .logarithmic(true)
                    .text("White Max Luminance"),
            );
        }
        if settings.operator.uses_white_scale() {
            ui.add(
                egui::Slider::new(&mut settings.white_scale, WHITE_SCALE_RANGE)
                    .logarithmic(true)
                    .text("Linear White"),
            );
        }
    });
}

pub fn statistics_group(ui: &mut egui::Ui, state: &mut UiState) {
    section(ui, "Statistics", |ui| {
        egui::ComboBox::from_label("Histogram")
            .selected_text(state.histogram_mode.label())
            .show_ui(ui, |ui| {
                for (mode, label) in HistogramMode::CHOICES {
                    ui.selectable_value(&mut state.histogram_mode, mode, label);
                }
            });

        let mut scale = state.graph_scale;
        let response = ui.add(
            egui::Slider::new(&mut scale, GRAPH_SCALE_RANGE)
                .step_by(GRAPH_SCALE_STEP)
                .text("Graph Scale"),
        );
        if response.changed() {
            state.set_graph_scale(scale);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_filter_covers_supported_formats() {
        for ext in ["hdr", "exr", "png", "jpg"] {
            assert!(IMAGE_EXTENSIONS.contains(&ext));
        }
    }

    #[test]
    fn default_events_request_nothing() {
        let events = PanelEvents::default();
        assert!(events.load_path.is_none());
        assert!(!events.reload);
    }

    #[test]
    fn image_group_labels_name_the_controls() {
        assert_eq!(SRGB_LABEL, "sRGB");
        assert_eq!(IMAGE_UNIT_LABEL, "Radiometry/Photometry");
        for unit in ImageUnit::ALL {
            assert!(IMAGE_UNIT_LABEL.contains(unit.label()), "{unit:?}");
        }
    }
}
