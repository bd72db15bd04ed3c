//! Static geometry for both windows.
//!
//! The scene window shows a unit cube with per-vertex colors; the mirror
//! window gets one vertex per output pixel, laid out row by row in
//! normalized device coordinates.

/// Cube corner positions, 3 floats per vertex.
pub fn cube_vertices() -> Vec<f32> {
    vec![
        0.5, 0.5, 0.5, //
        0.5, -0.5, 0.5, //
        0.5, -0.5, -0.5, //
        0.5, 0.5, -0.5, //
        -0.5, 0.5, 0.5, //
        -0.5, -0.5, 0.5, //
        -0.5, -0.5, -0.5, //
        -0.5, 0.5, -0.5,
    ]
}

/// Per-corner colors, 3 floats per vertex.
pub fn cube_colors() -> Vec<f32> {
    vec![
        0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, //
        1.0, 0.0, 1.0, //
        0.0, 1.0, 1.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, //
        1.0, 0.0, 1.0, //
        0.0, 1.0, 1.0,
    ]
}

/// Six quad faces, 4 indices each.
pub fn cube_indices() -> Vec<u32> {
    vec![
        0, 1, 2, 3, //
        4, 5, 6, 7, //
        0, 1, 5, 4, //
        2, 3, 7, 6, //
        0, 3, 7, 4, //
        1, 2, 6, 5,
    ]
}

/// One 2D vertex per pixel, row-major from the top row down, mapped to
/// [-1, 1] on both axes.
///
/// Row r of the grid corresponds to row r of a read-back frame, so the
/// color stream can be uploaded without reordering.
pub fn pixel_grid_vertices(width: u32, height: u32) -> Vec<f32> {
    let mut vertices = Vec::with_capacity(2 * width as usize * height as usize);
    for row in 0..height {
        let y = 1.0 - row as f32 * 2.0 / height as f32;
        for col in 0..width {
            let x = col as f32 * 2.0 / width as f32 - 1.0;
            vertices.push(x);
            vertices.push(y);
        }
    }
    vertices
}

/// Identity indices, one per grid vertex.
pub fn pixel_grid_indices(width: u32, height: u32) -> Vec<u32> {
    (0..width * height).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_eight_corners_and_six_faces() {
        assert_eq!(cube_vertices().len(), 8 * 3);
        assert_eq!(cube_colors().len(), 8 * 3);
        assert_eq!(cube_indices().len(), 6 * 4);
        assert!(cube_indices().iter().all(|&i| i < 8));
    }

    #[test]
    fn grid_covers_every_pixel_once() {
        let verts = pixel_grid_vertices(4, 3);
        assert_eq!(verts.len(), 2 * 4 * 3);

        let indices = pixel_grid_indices(4, 3);
        assert_eq!(indices.len(), 12);
        assert_eq!(indices[0], 0);
        assert_eq!(indices[11], 11);
    }

    #[test]
    fn grid_coordinates_stay_in_ndc() {
        let verts = pixel_grid_vertices(16, 16);
        assert!(verts.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn grid_is_row_major_top_down() {
        let verts = pixel_grid_vertices(2, 2);
        // First vertex: top-left corner.
        assert_eq!(verts[0], -1.0);
        assert_eq!(verts[1], 1.0);
        // Second vertex is on the same row, to the right.
        assert_eq!(verts[2], 0.0);
        assert_eq!(verts[3], 1.0);
        // Third vertex starts the next row down.
        assert_eq!(verts[4], -1.0);
        assert_eq!(verts[5], 0.0);
    }
}
