//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue per window
//! - creating & configuring the Surface (swapchain) and depth attachment
//! - acquiring frames and providing encoders/views for rendering
//! - staging completed frames for CPU readback

mod gpu;
mod readback;

pub(crate) use gpu::DEPTH_FORMAT;
pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use readback::{
    expected_color_len, expected_depth_len, normalize_color_texels, padded_bytes_per_row,
    unpack_rows, ChannelOrder, ReadbackBuffer,
};
