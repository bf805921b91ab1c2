//! Startup wiring and the worker loops.

pub mod core;
pub mod loops;
