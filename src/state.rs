//! GUI-driven application state.
//!
//! Everything the widgets mutate lives in [`UiState`], which is passed by
//! reference into the frame and GUI hooks. It doubles as the `[ui]` table of
//! the config file, so it derives serde.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::renderer::tone_mapping::ToneMappingSettings;

/// Which flavour of the playground is running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Image analysis pass and histogram window enabled.
    #[default]
    Analysis,
    /// Plain tone-mapping viewer that tracks the window size.
    Basic,
}

impl Variant {
    pub fn has_analysis(self) -> bool {
        matches!(self, Variant::Analysis)
    }

    pub fn image_group_label(self) -> &'static str {
        match self {
            Variant::Analysis => "Scene Referred Image",
            Variant::Basic => "Input HDR Image",
        }
    }

    /// Whether a swap-chain resize should replace the HDR framebuffer.
    ///
    /// Analysis keeps an image-sized framebuffer across window resizes once
    /// one exists; Basic always follows the window.
    pub fn recreate_hdr_on_resize(self, hdr_exists: bool) -> bool {
        match self {
            Variant::Analysis => !hdr_exists,
            Variant::Basic => true,
        }
    }

    /// Whether loading an image also resizes the presentation surface.
    pub fn resize_swap_chain_on_load(self) -> bool {
        matches!(self, Variant::Analysis)
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" | "a" => Ok(Variant::Analysis),
            "basic" | "b" => Ok(Variant::Basic),
            other => Err(format!("unknown variant '{other}' (expected analysis|basic)")),
        }
    }
}

/// How the passthrough shader interprets input texel values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageUnit {
    /// Texels are radiance (W·sr⁻¹·m⁻²) and get converted to luminance.
    Radiometry,
    /// Texels are already luminance (cd·m⁻²).
    #[default]
    Photometry,
}

impl ImageUnit {
    pub const ALL: [ImageUnit; 2] = [ImageUnit::Radiometry, ImageUnit::Photometry];

    pub fn label(self) -> &'static str {
        match self {
            ImageUnit::Radiometry => "Radiometry",
            ImageUnit::Photometry => "Photometry",
        }
    }

    /// Value written into the passthrough shader's `hdr_image_unit` constant.
    pub fn shader_value(self) -> i32 {
        match self {
            ImageUnit::Radiometry => 0,
            ImageUnit::Photometry => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenePreset {
    #[default]
    EveningSun,
    AtTheWindow,
    OvercastDay,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 3] = [
        ScenePreset::EveningSun,
        ScenePreset::AtTheWindow,
        ScenePreset::OvercastDay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScenePreset::EveningSun => "Evening Sun",
            ScenePreset::AtTheWindow => "At The Window",
            ScenePreset::OvercastDay => "Overcast Day",
        }
    }
}

bitflags::bitflags! {
    /// Channels drawn by the histogram window.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct HistogramMode: u32 {
        const LUMINANCE = 1 << 0;
        const R = 1 << 1;
        const G = 1 << 2;
        const B = 1 << 3;
        const ALL = Self::LUMINANCE.bits() | Self::R.bits() | Self::G.bits() | Self::B.bits();
    }
}

impl HistogramMode {
    /// Entries offered by the histogram dropdown, in display order.
    pub const CHOICES: [(HistogramMode, &'static str); 6] = [
        (HistogramMode::empty(), "None"),
        (HistogramMode::ALL, "All"),
        (HistogramMode::LUMINANCE, "Luminance"),
        (HistogramMode::R, "R"),
        (HistogramMode::G, "G"),
        (HistogramMode::B, "B"),
    ];

    pub fn luminance(self) -> bool {
        self.contains(HistogramMode::LUMINANCE)
    }

    pub fn red(self) -> bool {
        self.contains(HistogramMode::R)
    }

    pub fn green(self) -> bool {
        self.contains(HistogramMode::G)
    }

    pub fn blue(self) -> bool {
        self.contains(HistogramMode::B)
    }

    pub fn label(self) -> String {
        if let Some((_, label)) = Self::CHOICES.iter().find(|(mode, _)| *mode == self) {
            return (*label).to_owned();
        }
        self.iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

pub const GRAPH_SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=10.0;
pub const GRAPH_SCALE_STEP: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub image_path: Option<PathBuf>,
    pub srgb: bool,
    pub image_unit: ImageUnit,
    pub scene_preset: ScenePreset,
    pub histogram_mode: HistogramMode,
    pub graph_scale: f32,
    pub tone_mapping: ToneMappingSettings,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            image_path: None,
            srgb: false,
            image_unit: ImageUnit::Photometry,
            scene_preset: ScenePreset::EveningSun,
            histogram_mode: HistogramMode::empty(),
            graph_scale: 2.0,
            tone_mapping: ToneMappingSettings::default(),
        }
    }
}

impl UiState {
    pub fn set_graph_scale(&mut self, value: f32) {
        self.graph_scale = value.clamp(*GRAPH_SCALE_RANGE.start(), *GRAPH_SCALE_RANGE.end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_mode_accessors_follow_bits() {
        let mode = HistogramMode::R | HistogramMode::G;
        assert_eq!(mode.bits(), 0b0110);
        assert!(mode.red() && mode.green());
        assert!(!mode.luminance() && !mode.blue());
    }

    #[test]
    fn histogram_mode_all_covers_every_channel() {
        let all = HistogramMode::ALL;
        assert!(all.luminance() && all.red() && all.green() && all.blue());
        assert_eq!(HistogramMode::default(), HistogramMode::empty());
    }

    #[test]
    fn histogram_mode_labels_prefer_dropdown_names() {
        assert_eq!(HistogramMode::empty().label(), "None");
        assert_eq!(HistogramMode::ALL.label(), "All");
        assert_eq!((HistogramMode::R | HistogramMode::B).label(), "R | B");
    }

    #[test]
    fn resize_policy_differs_per_variant() {
        assert!(Variant::Analysis.recreate_hdr_on_resize(false));
        assert!(!Variant::Analysis.recreate_hdr_on_resize(true));
        assert!(Variant::Basic.recreate_hdr_on_resize(false));
        assert!(Variant::Basic.recreate_hdr_on_resize(true));
    }

    #[test]
    fn variant_parses_short_and_long_names() {
        assert_eq!("analysis".parse::<Variant>().unwrap(), Variant::Analysis);
        assert_eq!("B".parse::<Variant>().unwrap(), Variant::Basic);
        assert!("fancy".parse::<Variant>().is_err());
    }

    #[test]
    fn graph_scale_is_clamped_to_slider_range() {
        let mut state = UiState::default();
        state.set_graph_scale(50.0);
        assert_eq!(state.graph_scale, 10.0);
        state.set_graph_scale(0.0);
        assert_eq!(state.graph_scale, 0.1);
    }

    #[test]
    fn defaults_match_playground_startup() {
        let state = UiState::default();
        assert_eq!(state.image_unit, ImageUnit::Photometry);
        assert_eq!(state.histogram_mode, HistogramMode::empty());
        assert_eq!(state.graph_scale, 2.0);
        assert!(!state.srgb);
    }
}
