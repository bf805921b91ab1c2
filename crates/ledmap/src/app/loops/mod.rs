//! Timed loops owned by the application.

pub mod render;

pub use render::{RenderLoop, RenderSummary};
