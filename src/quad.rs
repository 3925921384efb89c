use gl_wrapper::geometry::VertexAttribute;

pub const QUAD_VERTICES: usize = 6;
pub const QUAD_STRIDE: usize = 5 * std::mem::size_of::<f32>();
pub const QUAD_UV_OFFSET: usize = 3 * std::mem::size_of::<f32>();

/// Position then uv for each vertex.
pub const QUAD_ATTRIBUTES: [VertexAttribute; 2] = [VertexAttribute::Vec3, VertexAttribute::Vec2];

#[rustfmt::skip]
pub const QUAD: [f32; 30] = [
     1.0,  1.0, 0.0,   1.0, 1.0,
     1.0, -1.0, 0.0,   1.0, 0.0,
    -1.0, -1.0, 0.0,   0.0, 0.0,
    -1.0, -1.0, 0.0,   0.0, 0.0,
    -1.0,  1.0, 0.0,   0.0, 1.0,
     1.0,  1.0, 0.0,   1.0, 1.0,
];

#[cfg(test)]
mod tests {
    use super::*;
    use gl_wrapper::geometry::VertexLayout;

    #[test]
    fn layout_matches_constants() {
        let layout = VertexLayout::new(&QUAD_ATTRIBUTES, QUAD.len()).unwrap();

        assert_eq!(layout.vertices, QUAD_VERTICES);
        assert_eq!(layout.stride, QUAD_STRIDE);
        assert_eq!(layout.offsets[1], QUAD_UV_OFFSET);
    }

    #[test]
    fn uv_follows_position() {
        for vertex in QUAD.chunks(5) {
            let (x, y) = (vertex[0], vertex[1]);
            let (u, v) = (vertex[3], vertex[4]);

            assert_eq!(u, (x + 1.0) / 2.0);
            assert_eq!(v, (y + 1.0) / 2.0);
        }
    }

    #[test]
    fn triangles_cover_clip_space() {
        let area: f32 = QUAD
            .chunks(15)
            .map(|tri| {
                let (ax, ay) = (tri[0], tri[1]);
                let (bx, by) = (tri[5], tri[6]);
                let (cx, cy) = (tri[10], tri[11]);

                ((bx - ax) * (cy - ay) - (cx - ax) * (by - ay)).abs() / 2.0
            })
            .sum();

        assert_eq!(area, 4.0);
    }
}
