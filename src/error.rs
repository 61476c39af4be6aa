use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = PlaygroundError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("no image path given")]
    EmptyPath,

    #[error("failed to load image '{}': {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "image '{}' is {}x{}, larger than the device limit of {max} texels per side",
        path.display(),
        size[0],
        size[1]
    )]
    ImageTooLarge {
        path: PathBuf,
        size: [u32; 2],
        max: u32,
    },

    #[error("failed to save image '{}': {source}", path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{name}' is invalid:\n{message}")]
    Shader { name: String, message: String },

    #[error("gpu readback of '{label}' failed: {reason}")]
    Readback { label: &'static str, reason: String },

    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(String),

    #[error("failed to create GPU device: {0}")]
    RequestDevice(String),

    #[error("invalid config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}
