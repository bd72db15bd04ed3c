//! Render surfaces.
//!
//! A `RenderSurface` is one native window plus its own GPU context, camera,
//! and geometry buffers. Surfaces never reference each other; the coordinator
//! moves pixel data between them.

mod event;
mod surface;

pub use event::{translate_window_event, MoveKey, SurfaceEvent};
pub use surface::{RenderSurface, SurfaceConfig};
