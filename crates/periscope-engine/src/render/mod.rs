//! GPU rendering subsystem.
//!
//! One `MeshRenderer` per surface owns the vertex/color/depth/index buffers,
//! the transform uniform, and the render pipeline built from a loaded
//! `ShaderProgram`.
//!
//! Convention:
//! - Flat surfaces take 2-component positions and draw point lists.
//! - Spatial surfaces take 3-component positions and draw triangle lists,
//!   with quad indices expanded at upload.

mod mesh;
mod program;

pub use mesh::{expand_quad_indices, MeshRenderer, SurfaceMode};
pub use program::{ShaderError, ShaderProgram, ShaderStage};
