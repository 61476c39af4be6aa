pub mod app;
pub mod color;
pub mod config;
pub mod error;
pub mod gpu;
pub mod headless;
pub mod logging;
pub mod renderer;
pub mod state;
pub mod ui;

pub use error::{PlaygroundError, Result};
