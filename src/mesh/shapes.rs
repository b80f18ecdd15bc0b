use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;

use super::{Mesh, Topology, VertexAttribute};

// Per-face corner signs (position) and texture coordinates (uvw) of the
// volume box, faces in the order front, right, back, left, bottom, top.
const BOX_SIGNS: [[f32; 3]; 36] = [
    [1., 1., 1.], [1., -1., 1.], [-1., -1., 1.], [-1., -1., 1.], [-1., 1., 1.], [1., 1., 1.],
    [1., 1., -1.], [1., -1., -1.], [1., -1., 1.], [1., -1., 1.], [1., 1., 1.], [1., 1., -1.],
    [1., -1., -1.], [1., 1., -1.], [-1., -1., -1.], [-1., 1., -1.], [-1., -1., -1.], [1., 1., -1.],
    [-1., -1., -1.], [-1., 1., -1.], [-1., -1., 1.], [-1., 1., 1.], [-1., -1., 1.], [-1., 1., -1.],
    [1., -1., 1.], [1., -1., -1.], [-1., -1., 1.], [-1., -1., -1.], [-1., -1., 1.], [1., -1., -1.],
    [1., 1., -1.], [1., 1., 1.], [-1., 1., 1.], [-1., 1., 1.], [-1., 1., -1.], [1., 1., -1.],
];

const BOX_UVW: [[f32; 3]; 36] = [
    [1., 0., 1.], [1., 0., 0.], [0., 0., 0.], [0., 0., 0.], [0., 0., 1.], [1., 0., 1.],
    [1., 1., 1.], [1., 1., 0.], [1., 0., 0.], [1., 0., 0.], [1., 0., 1.], [1., 1., 1.],
    [1., 1., 0.], [1., 1., 1.], [0., 1., 0.], [0., 1., 1.], [0., 1., 0.], [1., 1., 1.],
    [0., 1., 0.], [0., 1., 1.], [0., 0., 0.], [0., 0., 1.], [0., 0., 0.], [0., 1., 1.],
    [1., 0., 0.], [1., 1., 0.], [0., 0., 0.], [0., 1., 0.], [0., 0., 0.], [1., 1., 0.],
    [1., 1., 1.], [1., 0., 1.], [0., 0., 1.], [0., 0., 1.], [0., 1., 1.], [1., 1., 1.],
];

const BOX_NORMALS: [[f32; 3]; 6] = [
    [0., 0., 1.],
    [1., 0., 0.],
    [0., 0., -1.],
    [-1., 0., 0.],
    [0., -1., 0.],
    [0., 1., 0.],
];

fn sample_sphere(u: f32, v: f32) -> Vec3 {
    Vec3::new(u.cos() * v.cos(), u.sin() * v.cos(), v.sin())
}

impl Mesh {
    /// Axis-aligned box spanning `±size` on each axis, 36 vertices drawn as
    /// triangles. The texture coordinate of each corner is its position in
    /// the unit cube, so a rasterized face yields ray entry/exit points in
    /// volume space.
    #[must_use]
    pub fn volume(size_x: f32, size_y: f32, size_z: f32) -> Self {
        let scale = Vec3::new(size_x, size_y, size_z);
        let positions = BOX_SIGNS
            .iter()
            .flat_map(|s| (Vec3::from_array(*s) * scale).to_array())
            .collect();
        let uvw = BOX_UVW.iter().flatten().copied().collect();
        let normals = BOX_NORMALS
            .iter()
            .flat_map(|n| std::iter::repeat_n(*n, 6))
            .flatten()
            .collect();

        Self::new(
            Topology::Triangles,
            vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    data: positions,
                },
                VertexAttribute {
                    location: 1,
                    components: 3,
                    data: uvw,
                },
                VertexAttribute {
                    location: 2,
                    components: 3,
                    data: normals,
                },
            ],
            None,
        )
    }

    /// [`volume`](Self::volume) with equal extents.
    #[must_use]
    pub fn volume_cube(size: f32) -> Self {
        Self::volume(size, size, size)
    }

    /// Screen-filling quad in normalized device coordinates, drawn as a
    /// 4-vertex triangle strip.
    #[must_use]
    pub fn quad() -> Self {
        Self::new(
            Topology::TriangleStrip,
            vec![
                VertexAttribute {
                    location: 0,
                    components: 2,
                    data: vec![-1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0],
                },
                VertexAttribute {
                    location: 1,
                    components: 2,
                    data: vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0],
                },
            ],
            None,
        )
    }

    /// UV sphere of `radius` with `h_slices` latitude and `v_slices`
    /// longitude subdivisions, two triangles per cell.
    #[must_use]
    pub fn sphere(h_slices: u32, v_slices: u32, radius: f32) -> Self {
        let cells = (h_slices * v_slices) as usize;
        let mut positions = Vec::with_capacity(cells * 18);
        let mut uv = Vec::with_capacity(cells * 12);
        let mut normals = Vec::with_capacity(cells * 18);

        let du = 2.0 * PI / v_slices.max(1) as f32;
        let dv = PI / h_slices.max(1) as f32;
        for i in 0..v_slices {
            let u = -PI + i as f32 * du;
            for j in 0..h_slices {
                let v = -FRAC_PI_2 + j as f32 * dv;
                let corners = [
                    (u, v),
                    (u, v + dv),
                    (u + du, v + dv),
                    (u + du, v + dv),
                    (u + du, v),
                    (u, v),
                ];
                for (cu, cv) in corners {
                    let point = sample_sphere(cu, cv);
                    positions.extend_from_slice(&(point * radius).to_array());
                    uv.extend_from_slice(&[(point.x + 1.0) * 0.5, (point.z + 1.0) * 0.5]);
                    normals.extend_from_slice(&point.to_array());
                }
            }
        }

        Self::new(
            Topology::Triangles,
            vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    data: positions,
                },
                VertexAttribute {
                    location: 1,
                    components: 2,
                    data: uv,
                },
                VertexAttribute {
                    location: 2,
                    components: 3,
                    data: normals,
                },
            ],
            None,
        )
    }

    /// Flat `fields_x × fields_y` grid of `size_x × size_y` cells in the
    /// z = 0 plane facing +Z, drawn as one indexed triangle strip.
    ///
    /// With `centered` the grid is offset so its middle sits at the origin,
    /// otherwise its corner does.
    #[must_use]
    pub fn grid(fields_x: u32, fields_y: u32, size_x: f32, size_y: f32, centered: bool) -> Self {
        let vertices = ((fields_x + 1) * (fields_y + 1)) as usize;
        let mut positions = Vec::with_capacity(vertices * 3);
        let mut uv = Vec::with_capacity(vertices * 2);
        let mut normals = Vec::with_capacity(vertices * 3);

        let (offset_x, offset_y) = if centered {
            (
                -(fields_x as f32 / 2.0) * size_x,
                -(fields_y as f32 / 2.0) * size_y,
            )
        } else {
            (0.0, 0.0)
        };
        let du = 1.0 / fields_x.max(1) as f32;
        let dv = 1.0 / fields_y.max(1) as f32;

        for iy in 0..=fields_y {
            for ix in 0..=fields_x {
                positions.extend_from_slice(&[
                    ix as f32 * size_x + offset_x,
                    iy as f32 * size_y + offset_y,
                    0.0,
                ]);
                uv.extend_from_slice(&[ix as f32 * du, iy as f32 * dv]);
                normals.extend_from_slice(&[0.0, 0.0, 1.0]);
            }
        }

        let len = ((fields_x + 1) * 2 * fields_y) as usize;
        let mut top = 0;
        let mut bottom = fields_x + 1;
        let indices = (0..len)
            .map(|i| {
                let slot = if i % 2 == 0 { &mut top } else { &mut bottom };
                let index = *slot;
                *slot += 1;
                index
            })
            .collect();

        Self::new(
            Topology::TriangleStrip,
            vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    data: positions,
                },
                VertexAttribute {
                    location: 1,
                    components: 2,
                    data: uv,
                },
                VertexAttribute {
                    location: 2,
                    components: 3,
                    data: normals,
                },
            ],
            Some(indices),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_has_36_vertices_in_unit_uvw() {
        let mesh = Mesh::volume(1.0, 0.75, 0.25);
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.index_count(), 0);
        assert_eq!(mesh.topology(), Topology::Triangles);

        let positions = &mesh.attribute(0).unwrap().data;
        for p in positions.chunks(3) {
            assert_eq!(p[0].abs(), 1.0);
            assert_eq!(p[1].abs(), 0.75);
            assert_eq!(p[2].abs(), 0.25);
        }
        let uvw = &mesh.attribute(1).unwrap().data;
        assert!(uvw.iter().all(|&c| c == 0.0 || c == 1.0));
    }

    #[test]
    fn volume_normals_point_out_of_each_face() {
        let mesh = Mesh::volume_cube(2.0);
        let positions = &mesh.attribute(0).unwrap().data;
        let normals = &mesh.attribute(2).unwrap().data;
        for (p, n) in positions.chunks(3).zip(normals.chunks(3)) {
            let p = Vec3::from_slice(p);
            let n = Vec3::from_slice(n);
            // The vertex lies on the face the normal belongs to.
            assert_eq!(p.dot(n), 2.0);
        }
    }

    #[test]
    fn quad_is_a_four_vertex_strip() {
        let mesh = Mesh::quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.topology(), Topology::TriangleStrip);
        assert_eq!(mesh.attribute(0).unwrap().components, 2);
    }

    #[test]
    fn sphere_counts_and_radius() {
        let mesh = Mesh::sphere(20, 40, 0.25);
        assert_eq!(mesh.vertex_count(), 20 * 40 * 6);
        assert_eq!(mesh.attribute(1).unwrap().vertex_count(), 20 * 40 * 6);
        for p in mesh.attribute(0).unwrap().data.chunks(3) {
            assert!((Vec3::from_slice(p).length() - 0.25).abs() < 1e-5);
        }
        for n in mesh.attribute(2).unwrap().data.chunks(3) {
            assert!((Vec3::from_slice(n).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn grid_strip_alternates_rows() {
        let mesh = Mesh::grid(2, 1, 1.0, 1.0, false);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices(), Some(&[0, 3, 1, 4, 2, 5][..]));
        assert_eq!(mesh.element_count(), 6);
    }

    #[test]
    fn centered_grid_straddles_origin() {
        let mesh = Mesh::grid(1, 1, 3.0, 3.0, true);
        let positions = &mesh.attribute(0).unwrap().data;
        assert_eq!(&positions[0..3], &[-1.5, -1.5, 0.0]);
        assert_eq!(&positions[9..12], &[1.5, 1.5, 0.0]);
        let normals = &mesh.attribute(2).unwrap().data;
        assert!(normals.chunks(3).all(|n| n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn draw_mode_can_change() {
        let mut mesh = Mesh::quad();
        mesh.set_draw_mode(Topology::Points);
        assert_eq!(mesh.topology(), Topology::Points);
    }
}
