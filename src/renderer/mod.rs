//! GPU passes of the playground.
//!
//! - `image_loader`: decode an image file and upload it as a texture
//! - `framebuffer`: the HDR framebuffer and the display-referred target
//! - `passthrough`: copy the loaded image into the HDR framebuffer
//! - `tone_mapping`: luminance reduction and tone operators
//! - `analysis`: 256-sample statistics of the tone-mapped target
//! - `shaders`: embedded WGSL plus naga validation

pub mod analysis;
pub mod framebuffer;
pub mod image_loader;
pub mod passthrough;
pub mod shaders;
pub mod tone_mapping;

pub use analysis::{Channel, ImageAnalysisPass, StatisticsSnapshot};
pub use framebuffer::{HdrFramebuffer, TargetFramebuffer};
pub use image_loader::HdrImage;
pub use passthrough::PassthroughPass;
pub use shaders::ShaderLibrary;
pub use tone_mapping::{ToneMapOperator, ToneMapper, ToneMappingSettings};
