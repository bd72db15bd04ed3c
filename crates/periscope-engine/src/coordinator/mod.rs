//! Dual-surface frame loop.
//!
//! The coordinator owns exactly two render surfaces, routes window events to
//! them by window id, and runs the per-frame pipeline: render the primary,
//! read its pixels back, re-upload them as the secondary's vertex colors,
//! render the secondary through the primary's inverse transform.

mod registry;
mod runtime;

pub use registry::{SurfaceRegistry, SurfaceRole};
pub use runtime::{run, CoordinatorConfig, DualSurfaceCoordinator, MeshData, SurfaceSpec};

/// Per-frame decision of the coordinator.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramePlan {
    /// Primary surface is hidden; leave the loop without rendering.
    Quit,
    /// Render and read back the primary only.
    PrimaryOnly,
    /// Render the primary, read back, feed and render the secondary.
    Both,
}

/// Decides what this frame does from the surfaces' display state.
///
/// Hiding the primary ends the loop before anything is rendered; hiding only
/// the secondary skips its feed-and-render step.
pub fn frame_plan(primary_shown: bool, secondary_shown: bool) -> FramePlan {
    match (primary_shown, secondary_shown) {
        (false, _) => FramePlan::Quit,
        (true, false) => FramePlan::PrimaryOnly,
        (true, true) => FramePlan::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_primary_quits_before_any_render() {
        assert_eq!(frame_plan(false, true), FramePlan::Quit);
        assert_eq!(frame_plan(false, false), FramePlan::Quit);
    }

    #[test]
    fn hidden_secondary_only_skips_its_render() {
        assert_eq!(frame_plan(true, false), FramePlan::PrimaryOnly);
    }

    #[test]
    fn both_shown_runs_full_pipeline() {
        assert_eq!(frame_plan(true, true), FramePlan::Both);
    }
}
