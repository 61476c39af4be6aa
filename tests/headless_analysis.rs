mod common;

use common::{TempFile, gpu_or_skip, unique_temp_path, write_constant_exr};
use exposure_playground::color::quantize_display;
use exposure_playground::config::Config;
use exposure_playground::headless::{self, HeadlessFrame};
use exposure_playground::renderer::Channel;
use exposure_playground::renderer::analysis::SAMPLES_PER_CHANNEL;
use exposure_playground::renderer::tone_mapping::{ToneMapOperator, log_average_luminance};
use exposure_playground::state::{ImageUnit, Variant};
use exposure_playground::ui::histogram;

// Exactly representable in f16, so the upload does not perturb the reference.
const COLOR: [f32; 3] = [0.5, 0.25, 0.125];

fn reference_samples(config: &Config) -> [i32; 4] {
    let avg = log_average_luminance(std::iter::repeat_n(COLOR, 16));
    let mapped = config.ui.tone_mapping.apply(COLOR, avg);
    let lum = exposure_playground::color::luminance(mapped);
    [
        quantize_display(lum),
        quantize_display(mapped[0]),
        quantize_display(mapped[1]),
        quantize_display(mapped[2]),
    ]
}

fn run(operator: ToneMapOperator) {
    let Some(gpu) = gpu_or_skip("headless analysis test") else {
        return;
    };
    let image = TempFile(unique_temp_path("constant", "exr"));
    write_constant_exr(&image.0, 4, 4, COLOR);

    let mut config = Config {
        variant: Variant::Analysis,
        ..Config::default()
    };
    config.ui.image_path = Some(image.0.clone());
    config.ui.tone_mapping.operator = operator;

    let frame = headless::render_once(&gpu, &config).expect("headless frame");
    assert_eq!(frame.size, [4, 4]);
    assert_eq!(frame.pixels.len(), 4 * 4 * 4);

    let stats = frame.statistics.as_ref().expect("analysis snapshot");
    let expected = reference_samples(&config);

    for (channel, want) in Channel::ALL.into_iter().zip(expected) {
        let samples = stats.channel(channel);
        assert_eq!(samples.len(), SAMPLES_PER_CHANNEL);
        let first = samples[0];
        assert!(
            samples.iter().all(|&v| v == first),
            "{operator:?} {channel:?}: samples differ: {samples:?}"
        );
        assert!(
            (first - want).abs() <= 1,
            "{operator:?} {channel:?}: gpu {first}, cpu {want}"
        );
    }

    assert_eq!(frame.scale_ceiling, histogram::scale_ceiling(stats));
}

#[test]
fn constant_image_yields_identical_samples_matching_cpu_reference() {
    run(ToneMapOperator::HableUc2);
}

#[test]
fn constant_image_with_reinhard() {
    run(ToneMapOperator::Reinhard);
}

#[test]
fn statistics_json_lists_every_channel() {
    let Some(gpu) = gpu_or_skip("statistics json test") else {
        return;
    };
    let image = TempFile(unique_temp_path("json", "exr"));
    write_constant_exr(&image.0, 4, 4, COLOR);

    let mut config = Config::default();
    config.ui.image_path = Some(image.0.clone());
    let frame = headless::render_once(&gpu, &config).expect("headless frame");

    let json = frame.statistics_json().expect("analysis variant reports statistics");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    for key in ["luminance", "r", "g", "b"] {
        assert_eq!(value[key].as_array().map(Vec::len), Some(SAMPLES_PER_CHANNEL), "{key}");
    }
    assert_eq!(value["width"], 4);
    assert!(value["average_luminance"].as_f64().is_some());
    assert!(value["log_average_luminance"].as_f64().is_some());
}

#[test]
fn gpu_log_average_matches_cpu_reference() {
    let Some(gpu) = gpu_or_skip("log-average luminance test") else {
        return;
    };
    let image = TempFile(unique_temp_path("log-average", "exr"));
    write_constant_exr(&image.0, 4, 4, COLOR);

    let mut config = Config::default();
    config.ui.image_path = Some(image.0.clone());
    let frame = headless::render_once(&gpu, &config).expect("headless frame");

    let want = log_average_luminance(std::iter::repeat_n(COLOR, 16));
    let got = frame.scene_luminance;
    assert_eq!(got.pixel_count, 16);
    assert!((got.average - want).abs() <= want * 1e-3, "gpu {}, cpu {want}", got.average);
    assert!((got.log_average - want.log2()).abs() < 1e-3);
}

#[test]
fn basic_variant_renders_without_statistics() {
    let Some(gpu) = gpu_or_skip("basic headless test") else {
        return;
    };
    let config = Config {
        variant: Variant::Basic,
        ..Config::default()
    };
    let frame = headless::render_once(&gpu, &config).expect("headless frame");
    assert_eq!(frame.size, [config.window.width, config.window.height]);
    assert!(frame.statistics.is_none());
    assert!(frame.statistics_json().is_none());

    let out = TempFile(unique_temp_path("basic", "png"));
    frame.save_png(&out.0).expect("png written");
    let decoded = image::open(&out.0).expect("png readable");
    assert_eq!((decoded.width(), decoded.height()), (frame.size[0], frame.size[1]));
}

// 2^-10 survives the f16 upload exactly. Without exposure it stays near black
// in photometric units and lands mid-range once scaled to radiometric ones.
const DIM: [f32; 3] = [0.0009765625; 3];

fn render_dim(variant: Variant, unit: ImageUnit) -> Option<HeadlessFrame> {
    let gpu = gpu_or_skip("image unit test")?;
    let image = TempFile(unique_temp_path("dim", "exr"));
    write_constant_exr(&image.0, 4, 4, DIM);

    let mut config = Config {
        variant,
        ..Config::default()
    };
    config.window.width = 8;
    config.window.height = 8;
    config.ui.image_path = Some(image.0.clone());
    config.ui.image_unit = unit;
    config.ui.tone_mapping.operator = ToneMapOperator::Clamp;
    config.ui.tone_mapping.auto_exposure = false;
    Some(headless::render_once(&gpu, &config).expect("headless frame"))
}

#[test]
fn radiometry_brightens_the_analysed_image() {
    let (Some(photo), Some(radio)) = (
        render_dim(Variant::Analysis, ImageUnit::Photometry),
        render_dim(Variant::Analysis, ImageUnit::Radiometry),
    ) else {
        return;
    };
    let photo = photo.statistics.expect("analysis snapshot");
    let radio = radio.statistics.expect("analysis snapshot");

    for channel in [Channel::Luminance, Channel::R, Channel::G, Channel::B] {
        let (p, r) = (photo.channel(channel)[0], radio.channel(channel)[0]);
        assert!(r > p + 100, "{channel:?}: radiometry {r}, photometry {p}");
    }
}

#[test]
fn basic_variant_ignores_the_image_unit() {
    let (Some(photo), Some(radio)) = (
        render_dim(Variant::Basic, ImageUnit::Photometry),
        render_dim(Variant::Basic, ImageUnit::Radiometry),
    ) else {
        return;
    };
    assert_eq!(photo.size, radio.size);
    assert!(photo.pixels == radio.pixels, "basic output changed with the image unit");
}
