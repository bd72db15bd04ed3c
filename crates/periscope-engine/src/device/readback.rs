//! Staging buffers and sample conversion for frame readback.
//!
//! Texture-to-buffer copies in wgpu require the per-row byte count to be a
//! multiple of `COPY_BYTES_PER_ROW_ALIGNMENT`, so a staged frame carries row
//! padding that must be stripped before the samples are handed to callers.

use anyhow::{Context, Result};

/// Number of f32 samples expected from a full color readback.
///
/// Three channels per pixel, regardless of the four-byte texel layout the
/// surface itself uses.
pub fn expected_color_len(width: u32, height: u32) -> usize {
    3 * width as usize * height as usize
}

/// Number of f32 samples expected from a full depth readback.
pub fn expected_depth_len(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Rounds a tightly packed row size up to the copy alignment.
pub fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips row padding from a mapped staging buffer.
///
/// `src` holds `rows` rows of `padded` bytes each; the leading `unpadded`
/// bytes of every row are the real texels.
pub fn unpack_rows(src: &[u8], padded: u32, unpadded: u32, rows: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(unpadded as usize * rows as usize);
    for row in src.chunks_exact(padded as usize).take(rows as usize) {
        out.extend_from_slice(&row[..unpadded as usize]);
    }
    out
}

/// Channel layout of a four-byte color texel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
}

impl ChannelOrder {
    /// Channel order for the given surface format, if it is one the readback
    /// path understands.
    pub fn of_format(format: wgpu::TextureFormat) -> Option<Self> {
        use wgpu::TextureFormat as F;
        match format {
            F::Rgba8Unorm | F::Rgba8UnormSrgb => Some(Self::Rgba),
            F::Bgra8Unorm | F::Bgra8UnormSrgb => Some(Self::Bgra),
            _ => None,
        }
    }
}

/// Converts packed 8-bit texels to normalized RGB f32 samples.
///
/// Output is always in R, G, B order with every sample in [0, 1]; the alpha
/// byte is dropped.
pub fn normalize_color_texels(texels: &[u8], order: ChannelOrder, out: &mut [f32]) {
    debug_assert_eq!(texels.len() / 4 * 3, out.len());

    for (texel, rgb) in texels.chunks_exact(4).zip(out.chunks_exact_mut(3)) {
        let (r, g, b) = match order {
            ChannelOrder::Rgba => (texel[0], texel[1], texel[2]),
            ChannelOrder::Bgra => (texel[2], texel[1], texel[0]),
        };
        rgb[0] = r as f32 / 255.0;
        rgb[1] = g as f32 / 255.0;
        rgb[2] = b as f32 / 255.0;
    }
}

/// One persistent staging buffer for copying a texture out of the GPU.
///
/// The buffer is sized for the padded row layout once and reused every frame;
/// resizing the source texture requires recreating it.
pub struct ReadbackBuffer {
    buffer: wgpu::Buffer,
    padded_bytes_per_row: u32,
    unpadded_bytes_per_row: u32,
    width: u32,
    rows: u32,
}

impl ReadbackBuffer {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        bytes_per_texel: u32,
        label: &str,
    ) -> Self {
        let unpadded = width * bytes_per_texel;
        let padded = padded_bytes_per_row(unpadded);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            padded_bytes_per_row: padded,
            unpadded_bytes_per_row: unpadded,
            width,
            rows: height,
        }
    }

    /// Records a full copy of `texture` into the staging buffer.
    ///
    /// Must be recorded after the last render pass writing the texture and
    /// before the encoder is submitted.
    pub fn record_copy(&self, encoder: &mut wgpu::CommandEncoder, texture: &wgpu::Texture) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.rows),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.rows,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Maps the staging buffer and returns the tightly packed texel bytes.
    ///
    /// Blocks until the GPU has finished the copy submitted earlier this
    /// frame.
    pub fn fetch(&self, device: &wgpu::Device) -> Result<Vec<u8>> {
        let slice = self.buffer.slice(..);

        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed while waiting for readback")?;

        rx.recv()
            .context("readback map callback dropped")?
            .context("failed to map readback buffer")?;

        let packed = unpack_rows(
            &slice.get_mapped_range(),
            self.padded_bytes_per_row,
            self.unpadded_bytes_per_row,
            self.rows,
        );

        self.buffer.unmap();
        Ok(packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── sizing ────────────────────────────────────────────────────────────

    #[test]
    fn expected_lengths_match_dimensions() {
        assert_eq!(expected_color_len(640, 480), 3 * 640 * 480);
        assert_eq!(expected_depth_len(640, 480), 640 * 480);
        assert_eq!(expected_color_len(0, 480), 0);
    }

    #[test]
    fn row_padding_rounds_up_to_alignment() {
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        assert_eq!(padded_bytes_per_row(align), align);
        assert_eq!(padded_bytes_per_row(align + 1), 2 * align);
        assert_eq!(padded_bytes_per_row(1), align);
        // 640 px * 4 bytes is already aligned.
        assert_eq!(padded_bytes_per_row(2560), 2560);
    }

    // ── unpacking ─────────────────────────────────────────────────────────

    #[test]
    fn unpack_strips_row_padding() {
        // Two rows of 3 real bytes padded to 8.
        let src = [1, 2, 3, 0, 0, 0, 0, 0, 4, 5, 6, 0, 0, 0, 0, 0];
        assert_eq!(unpack_rows(&src, 8, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn unpack_is_identity_when_unpadded() {
        let src = [9u8, 8, 7, 6];
        assert_eq!(unpack_rows(&src, 2, 2, 2), src.to_vec());
    }

    // ── normalization ─────────────────────────────────────────────────────

    #[test]
    fn normalize_drops_alpha_and_scales() {
        let texels = [0u8, 255, 128, 7];
        let mut out = [0.0f32; 3];
        normalize_color_texels(&texels, ChannelOrder::Rgba, &mut out);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 1.0);
        assert!((out[2] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_swizzles_bgra() {
        let texels = [10u8, 20, 30, 255];
        let mut out = [0.0f32; 3];
        normalize_color_texels(&texels, ChannelOrder::Bgra, &mut out);
        assert!((out[0] - 30.0 / 255.0).abs() < 1e-6);
        assert!((out[2] - 10.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn normalized_samples_stay_in_unit_range() {
        let texels: Vec<u8> = (0..=255u8).flat_map(|v| [v, v, v, 255]).collect();
        let mut out = vec![0.0f32; 256 * 3];
        normalize_color_texels(&texels, ChannelOrder::Bgra, &mut out);
        assert!(out.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn channel_order_known_formats() {
        assert_eq!(
            ChannelOrder::of_format(wgpu::TextureFormat::Bgra8Unorm),
            Some(ChannelOrder::Bgra)
        );
        assert_eq!(
            ChannelOrder::of_format(wgpu::TextureFormat::Rgba8UnormSrgb),
            Some(ChannelOrder::Rgba)
        );
        assert_eq!(ChannelOrder::of_format(wgpu::TextureFormat::R32Float), None);
    }
}
