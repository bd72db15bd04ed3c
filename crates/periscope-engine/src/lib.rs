//! Periscope engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the viewer
//! binary: per-window GPU contexts, render surfaces, the dual-surface
//! frame loop, and the pixel readback path.

pub mod camera;
pub mod coordinator;
pub mod device;
pub mod render;
pub mod surface;

pub mod logging;
pub mod time;
