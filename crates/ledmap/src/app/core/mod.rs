//! Application state and initialization.

pub mod app_struct;
pub mod init;

pub use app_struct::{App, RunOptions};
