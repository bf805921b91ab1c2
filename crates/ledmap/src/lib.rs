//! LedMap - ArtNet and LM pixel router for LED strips
//!
//! The binary wires the network input thread, the strip-type listener and
//! the render loop together. This library target exposes the pieces so they
//! can be driven from integration tests.

#![warn(missing_docs)]

pub mod app;
pub mod logging_setup;
pub mod signals;
