use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use eframe::egui;
use exposure_playground::{app::shell::PlaygroundApp, config::Config, headless, logging, state::Variant};
use tracing::info;

#[derive(Debug, Default, Clone)]
struct Cli {
    config: Option<PathBuf>,
    image: Option<PathBuf>,
    srgb: bool,
    variant: Option<Variant>,
    verbose: bool,
    headless: bool,
    output: Option<PathBuf>,
    stats_json: Option<PathBuf>,
}

const USAGE: &str = "supported: --config <file>, --image <path>, --srgb, --variant <analysis|basic>, \
--verbose, --headless, --output <png>, --stats-json <file>";

fn parse_cli(args: &[String]) -> Result<Cli> {
    fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
        args.get(i + 1)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("missing value for {flag}"))
    }

    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--headless" => {
                cli.headless = true;
                i += 1;
            }
            "--srgb" => {
                cli.srgb = true;
                i += 1;
            }
            "--verbose" | "-v" => {
                cli.verbose = true;
                i += 1;
            }
            "--config" => {
                cli.config = Some(PathBuf::from(value(args, i, "--config")?));
                i += 2;
            }
            "--image" => {
                cli.image = Some(PathBuf::from(value(args, i, "--image")?));
                i += 2;
            }
            "--variant" => {
                let v = value(args, i, "--variant")?;
                cli.variant = Some(v.parse().map_err(|e: String| anyhow!(e))?);
                i += 2;
            }
            "--output" => {
                cli.output = Some(PathBuf::from(value(args, i, "--output")?));
                i += 2;
            }
            "--stats-json" => {
                cli.stats_json = Some(PathBuf::from(value(args, i, "--stats-json")?));
                i += 2;
            }
            other => return Err(anyhow!("unknown argument: {other} ({USAGE})")),
        }
    }

    if !cli.headless && (cli.output.is_some() || cli.stats_json.is_some()) {
        return Err(anyhow!("--output and --stats-json require --headless"));
    }
    Ok(cli)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(variant) = cli.variant {
        config.variant = variant;
    }
    if let Some(image) = cli.image.clone() {
        config.ui.image_path = Some(image);
    }
    if cli.srgb {
        config.ui.srgb = true;
    }
}

fn run_headless(config: &Config, cli: &Cli) -> Result<()> {
    let frame = headless::render_headless(config).context("headless render failed")?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("exposure-playground.png"));
    frame.save_png(&output)?;
    println!("[headless] saved: {}", output.display());

    if let Some(path) = cli.stats_json.as_ref() {
        let json = frame
            .statistics_json()
            .ok_or_else(|| anyhow!("--stats-json needs the analysis variant"))?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("[headless] statistics: {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    logging::init(cli.verbose);

    let (mut config, source) = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    match source {
        Some(path) => info!(path = %path.display(), "config loaded"),
        None => info!("no config file; using defaults"),
    }

    if cli.headless {
        return run_headless(&config, &cli);
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Exposure Playground")
            .with_inner_size([config.window.width as f32, config.window.height as f32]),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "Exposure Playground",
        native_options,
        Box::new(move |cc| Ok(Box::new(PlaygroundApp::new(cc, &config)?))),
    )
    .map_err(|e| anyhow!("eframe run failed: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_cli_headless_with_outputs() {
        let cli = parse_cli(&args(&[
            "--headless",
            "--image",
            "scene.exr",
            "--variant",
            "basic",
            "--output",
            "out.png",
            "--stats-json",
            "stats.json",
        ]))
        .unwrap();
        assert!(cli.headless);
        assert_eq!(cli.image, Some(PathBuf::from("scene.exr")));
        assert_eq!(cli.variant, Some(Variant::Basic));
        assert_eq!(cli.output, Some(PathBuf::from("out.png")));
        assert_eq!(cli.stats_json, Some(PathBuf::from("stats.json")));
    }

    #[test]
    fn parse_cli_rejects_unknown_and_missing_values() {
        assert!(parse_cli(&args(&["--bogus"])).is_err());
        assert!(parse_cli(&args(&["--image"])).is_err());
        assert!(parse_cli(&args(&["--variant", "c"])).is_err());
    }

    #[test]
    fn outputs_require_headless() {
        assert!(parse_cli(&args(&["--output", "x.png"])).is_err());
    }

    #[test]
    fn cli_overrides_config() {
        let mut config = Config::default();
        let cli = parse_cli(&args(&["--srgb", "--image", "a.png", "--variant", "b"])).unwrap();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.variant, Variant::Basic);
        assert!(config.ui.srgb);
        assert_eq!(config.ui.image_path, Some(PathBuf::from("a.png")));
    }
}
