//! Histogram window contents: one 400×100 bar graph per enabled channel.

use eframe::egui;

use crate::renderer::analysis::{Channel, StatisticsSnapshot};
use crate::state::HistogramMode;
use crate::ui::design_tokens;

pub const GRAPH_SIZE: egui::Vec2 = egui::vec2(400.0, 100.0);
pub const WINDOW_SIZE: egui::Vec2 = egui::vec2(480.0, 240.0);
pub const WINDOW_MARGIN: f32 = 20.0;

/// Fallback used when no color channel has a positive sample.
pub const CEILING_FALLBACK: f32 = 1.0;

/// Mean of the strictly positive samples, or `None` when there are none.
pub fn positive_mean(samples: &[i32]) -> Option<f32> {
    let (sum, count) = samples
        .iter()
        .filter(|&&v| v > 0)
        .fold((0i64, 0u32), |(sum, count), &v| (sum + i64::from(v), count + 1));
    (count > 0).then(|| sum as f32 / count as f32)
}

/// Upper bound of the graph axis before the user's graph scale is applied.
///
/// Maximum over R, G and B of [`positive_mean`]. Luminance does not
/// participate.
pub fn scale_ceiling(stats: &StatisticsSnapshot) -> f32 {
    [Channel::R, Channel::G, Channel::B]
        .into_iter()
        .filter_map(|channel| positive_mean(stats.channel(channel)))
        .fold(None, |acc: Option<f32>, mean| Some(acc.map_or(mean, |m| m.max(mean))))
        .unwrap_or(CEILING_FALLBACK)
}

pub fn channels_to_draw(mode: HistogramMode) -> Vec<Channel> {
    Channel::ALL
        .into_iter()
        .filter(|channel| mode.contains(channel.flag()))
        .collect()
}

pub fn channel_color(channel: Channel) -> egui::Color32 {
    match channel {
        Channel::Luminance => egui::Color32::from_gray(179),
        Channel::R => egui::Color32::from_rgb(255, 0, 0),
        Channel::G => egui::Color32::from_rgb(0, 255, 0),
        Channel::B => egui::Color32::from_rgb(0, 0, 255),
    }
}

/// Top-left corner of the histogram window for an output of `fbo_width`.
pub fn window_position(fbo_width: f32) -> egui::Pos2 {
    egui::pos2(fbo_width - WINDOW_MARGIN - WINDOW_SIZE.x, WINDOW_MARGIN)
}

/// Bar heights in `[0, 1]` for one channel; `scale_max` maps to a full bar.
pub fn bar_heights(samples: &[i32], scale_max: f32) -> Vec<f32> {
    let scale_max = if scale_max > 0.0 { scale_max } else { CEILING_FALLBACK };
    samples
        .iter()
        .map(|&v| (v as f32 / scale_max).clamp(0.0, 1.0))
        .collect()
}

fn graph(ui: &mut egui::Ui, channel: Channel, samples: &[i32], scale_max: f32) {
    ui.label(channel.label());
    let (rect, _) = ui.allocate_exact_size(GRAPH_SIZE, egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, design_tokens::GRAPH_BG);

    let heights = bar_heights(samples, scale_max);
    let bar_width = rect.width() / heights.len().max(1) as f32;
    let color = channel_color(channel);
    for (i, h) in heights.iter().enumerate() {
        if *h <= 0.0 {
            continue;
        }
        let left = rect.left() + i as f32 * bar_width;
        let bar = egui::Rect::from_min_max(
            egui::pos2(left, rect.bottom() - h * rect.height()),
            egui::pos2(left + bar_width, rect.bottom()),
        );
        painter.rect_filled(bar, 0.0, color);
    }
}

/// Draw every channel enabled in `mode`.
pub fn show(
    ui: &mut egui::Ui,
    stats: &StatisticsSnapshot,
    mode: HistogramMode,
    ceiling: f32,
    graph_scale: f32,
) {
    let scale_max = ceiling * graph_scale;
    for channel in channels_to_draw(mode) {
        graph(ui, channel, stats.channel(channel), scale_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::analysis::SAMPLES_PER_CHANNEL;
    use proptest::prelude::*;

    fn snapshot(lum: i32, r: &[i32], g: &[i32], b: &[i32]) -> StatisticsSnapshot {
        let fill = |values: &[i32]| -> Vec<i32> {
            (0..SAMPLES_PER_CHANNEL)
                .map(|i| values.get(i).copied().unwrap_or(0))
                .collect()
        };
        let lum = vec![lum; SAMPLES_PER_CHANNEL];
        StatisticsSnapshot::from_channels([&lum, &fill(r), &fill(g), &fill(b)]).unwrap()
    }

    #[test]
    fn ceiling_is_max_positive_mean_of_color_channels() {
        let stats = snapshot(250, &[10, 20, -5], &[40], &[3, 3, 3]);
        assert_eq!(scale_ceiling(&stats), 40.0);
    }

    #[test]
    fn ceiling_ignores_luminance() {
        let stats = snapshot(255, &[2], &[], &[]);
        assert_eq!(scale_ceiling(&stats), 2.0);
    }

    #[test]
    fn ceiling_falls_back_when_nothing_is_positive() {
        let stats = snapshot(0, &[0, -1], &[], &[]);
        assert_eq!(scale_ceiling(&stats), CEILING_FALLBACK);
    }

    #[test]
    fn red_green_mode_draws_exactly_red_and_green() {
        let channels = channels_to_draw(HistogramMode::R | HistogramMode::G);
        assert_eq!(channels, vec![Channel::R, Channel::G]);
    }

    #[test]
    fn none_and_all_modes() {
        assert!(channels_to_draw(HistogramMode::empty()).is_empty());
        assert_eq!(channels_to_draw(HistogramMode::all()), Channel::ALL.to_vec());
    }

    #[test]
    fn window_sits_twenty_pixels_from_top_right() {
        let pos = window_position(1280.0);
        assert_eq!(pos, egui::pos2(1280.0 - 20.0 - 480.0, 20.0));
    }

    #[test]
    fn bars_are_clamped_to_unit_range() {
        let heights = bar_heights(&[0, 50, 100, 400, -3], 100.0);
        assert_eq!(heights, vec![0.0, 0.5, 1.0, 1.0, 0.0]);
    }

    proptest! {
        #[test]
        fn ceiling_is_finite_positive_and_bounds_color_means(
            values in prop::collection::vec(-255i32..=255, SAMPLES_PER_CHANNEL * 3)
        ) {
            let (r, rest) = values.split_at(SAMPLES_PER_CHANNEL);
            let (g, b) = rest.split_at(SAMPLES_PER_CHANNEL);
            let stats = snapshot(0, r, g, b);
            let ceiling = scale_ceiling(&stats);

            prop_assert!(ceiling.is_finite());
            prop_assert!(ceiling > 0.0);
            for channel in [r, g, b] {
                if let Some(mean) = positive_mean(channel) {
                    prop_assert!(mean <= ceiling);
                }
            }
        }
    }
}
