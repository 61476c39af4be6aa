//! WGSL sources, validation and module creation.
//!
//! Sources are embedded at build time. When a shader directory is configured
//! a file of the same name there takes precedence, which makes it possible to
//! iterate on a shader without rebuilding.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PlaygroundError, Result};

pub const EXPOSURE_PRO: &str = "exposure_pro.wgsl";
pub const LUMINANCE: &str = "luminance.wgsl";
pub const TONE_MAPPING: &str = "tone_mapping.wgsl";
pub const IMAGE_ANALYSIS: &str = "image_analysis.wgsl";

const EMBEDDED: [(&str, &str); 4] = [
    (EXPOSURE_PRO, include_str!("shaders/exposure_pro.wgsl")),
    (LUMINANCE, include_str!("shaders/luminance.wgsl")),
    (TONE_MAPPING, include_str!("shaders/tone_mapping.wgsl")),
    (IMAGE_ANALYSIS, include_str!("shaders/image_analysis.wgsl")),
];

#[derive(Clone, Debug, Default)]
pub struct ShaderLibrary {
    override_dir: Option<PathBuf>,
}

impl ShaderLibrary {
    pub fn embedded() -> Self {
        Self::default()
    }

    pub fn with_override_dir(dir: Option<&Path>) -> Self {
        Self {
            override_dir: dir.map(Path::to_path_buf),
        }
    }

    pub fn source(&self, name: &str) -> Result<Cow<'static, str>> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(name);
            if path.is_file() {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| PlaygroundError::Io { path: path.clone(), source })?;
                info!(shader = name, path = %path.display(), "using shader override");
                return Ok(Cow::Owned(text));
            }
            debug!(shader = name, dir = %dir.display(), "no override found, using embedded source");
        }

        EMBEDDED
            .iter()
            .find(|(embedded, _)| *embedded == name)
            .map(|(_, src)| Cow::Borrowed(*src))
            .ok_or_else(|| PlaygroundError::Shader {
                name: name.to_owned(),
                message: "unknown shader".to_owned(),
            })
    }

    /// Validate `name` with naga and create the wgpu module.
    pub fn load_module(&self, device: &wgpu::Device, name: &str) -> Result<wgpu::ShaderModule> {
        let source = self.source(name)?;
        validate_wgsl(name, &source)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source),
        }))
    }
}

/// Parse and validate WGSL, returning a line-numbered listing on failure.
pub fn validate_wgsl(name: &str, source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| PlaygroundError::Shader {
        name: name.to_owned(),
        message: format_listing(&e.emit_to_string(source), source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| PlaygroundError::Shader {
        name: name.to_owned(),
        message: format_listing(&e.emit_to_string(source), source),
    })?;

    Ok(module)
}

fn format_listing(error: &str, source: &str) -> String {
    let mut output = String::new();
    output.push_str(error);
    output.push_str("\n---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_shaders_validate() {
        let library = ShaderLibrary::embedded();
        for (name, _) in EMBEDDED {
            let source = library.source(name).unwrap();
            if let Err(e) = validate_wgsl(name, &source) {
                panic!("{e}");
            }
        }
    }

    #[test]
    fn analysis_kernel_exposes_main_entry_point() {
        let source = ShaderLibrary::embedded().source(IMAGE_ANALYSIS).unwrap();
        let module = validate_wgsl(IMAGE_ANALYSIS, &source).unwrap();
        let entry = module
            .entry_points
            .iter()
            .find(|ep| ep.name == "main")
            .expect("main entry point");
        assert_eq!(entry.stage, naga::ShaderStage::Compute);
        assert_eq!(entry.workgroup_size, [16, 16, 1]);
    }

    #[test]
    fn invalid_source_reports_name_and_listing() {
        let err = validate_wgsl("broken.wgsl", "fn broken() -> { return 1.0; }").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken.wgsl"), "unexpected error: {msg}");
        assert!(msg.contains("   1 | fn broken()"), "missing listing: {msg}");
    }

    #[test]
    fn override_dir_takes_precedence() {
        let dir = std::env::temp_dir().join(format!(
            "exposure-playground-shaders-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(LUMINANCE), "// override\n").unwrap();

        let library = ShaderLibrary::with_override_dir(Some(&dir));
        assert_eq!(library.source(LUMINANCE).unwrap(), "// override\n");
        assert!(library.source(TONE_MAPPING).unwrap().contains("fs_main"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_shader_is_an_error() {
        assert!(ShaderLibrary::embedded().source("nope.wgsl").is_err());
    }
}
