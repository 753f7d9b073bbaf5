use std::collections::BTreeMap;

use glam::Vec3;

use crate::buffer::{GeometryBuffer, PrimitiveKind};
use crate::builder::{Builder, Topology};
use crate::color::Rgba;
use crate::layout::VertexLayout;
use crate::text::TextBuffer;
use crate::vertex::VertexRecord;

/// Scale used by [`Drawable::add_cone`].
pub const DEFAULT_CONE_SCALE: f32 = 0.075;

const CONE_SIDES: usize = 8;

/// Quad split into two triangles sharing the 0-2 diagonal.
const QUAD_INDICES: [usize; 6] = [0, 1, 2, 0, 2, 3];

/// All geometry of one scene object.
///
/// Owns one [`GeometryBuffer`] per (layout, primitive kind) actually used plus
/// a [`TextBuffer`]. Buffers are created on first use and iterate in a fixed
/// order (layout, then kind).
#[derive(Debug, Default)]
pub struct Drawable {
    buffers: BTreeMap<(VertexLayout, PrimitiveKind), GeometryBuffer>,
    text: TextBuffer,
}

impl Drawable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an immediate-mode primitive.
    pub fn begin_primitive(&mut self, topology: Topology) -> Builder<'_> {
        Builder::new(self, topology)
    }

    pub fn buffer(&self, layout: VertexLayout, kind: PrimitiveKind) -> Option<&GeometryBuffer> {
        self.buffers.get(&(layout, kind))
    }

    /// Buffer for `(layout, kind)`, created empty on first use.
    pub fn buffer_mut(&mut self, layout: VertexLayout, kind: PrimitiveKind) -> &mut GeometryBuffer {
        self.buffers
            .entry((layout, kind))
            .or_insert_with(|| GeometryBuffer::new(layout, kind))
    }

    pub fn buffers(&self) -> impl Iterator<Item = &GeometryBuffer> {
        self.buffers.values()
    }

    pub fn buffers_mut(&mut self) -> impl Iterator<Item = &mut GeometryBuffer> {
        self.buffers.values_mut()
    }

    #[inline]
    pub fn text(&self) -> &TextBuffer {
        &self.text
    }

    #[inline]
    pub fn text_mut(&mut self) -> &mut TextBuffer {
        &mut self.text
    }

    /// Total CPU-side vertices across all geometry buffers.
    pub fn vertex_count(&self) -> usize {
        self.buffers.values().map(GeometryBuffer::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0 && self.text.is_empty()
    }

    /// Empties every buffer. Device copies are kept for reuse.
    pub fn clear(&mut self) {
        for buf in self.buffers.values_mut() {
            buf.clear();
        }
        self.text.clear();
    }

    // ── helpers ──────────────────────────────────────────────────────────

    pub fn add_line(&mut self, a: [f32; 3], b: [f32; 3]) {
        let buf = self.buffer_mut(VertexLayout::Position, PrimitiveKind::Lines);
        buf.push(&VertexRecord::new(a));
        buf.push(&VertexRecord::new(b));
    }

    /// Triangle with a face normal and per-vertex colors.
    pub fn add_triangle(&mut self, vtx: [[f32; 3]; 3], normal: [f32; 3], rgba: [Rgba; 3]) {
        let buf = self.buffer_mut(VertexLayout::PositionNormalColor, PrimitiveKind::Triangles);
        for (p, c) in vtx.into_iter().zip(rgba) {
            buf.push(&VertexRecord::new(p).with_normal(normal).with_color(c));
        }
    }

    /// Triangle with a face normal and per-vertex color-ramp coordinates.
    pub fn add_triangle_tex(&mut self, vtx: [[f32; 3]; 3], normal: [f32; 3], texcoord: [f32; 3]) {
        let buf = self.buffer_mut(VertexLayout::PositionNormalTexCoord, PrimitiveKind::Triangles);
        for (p, t) in vtx.into_iter().zip(texcoord) {
            buf.push(&VertexRecord::new(p).with_normal(normal).with_texcoord(t));
        }
    }

    /// Quad with per-vertex colors, stored as two triangles.
    pub fn add_quad(&mut self, vtx: [[f32; 3]; 4], normal: [f32; 3], rgba: [Rgba; 4]) {
        let buf = self.buffer_mut(VertexLayout::PositionNormalColor, PrimitiveKind::Triangles);
        for i in QUAD_INDICES {
            buf.push(&VertexRecord::new(vtx[i]).with_normal(normal).with_color(rgba[i]));
        }
    }

    /// Quad with one color for the whole face.
    pub fn add_quad_face(&mut self, vtx: [[f32; 3]; 4], normal: [f32; 3], rgba: Rgba) {
        self.add_quad(vtx, normal, [rgba; 4]);
    }

    pub fn add_quad_tex(&mut self, vtx: [[f32; 3]; 4], normal: [f32; 3], texcoord: [f32; 4]) {
        let buf = self.buffer_mut(VertexLayout::PositionNormalTexCoord, PrimitiveKind::Triangles);
        for i in QUAD_INDICES {
            buf.push(&VertexRecord::new(vtx[i]).with_normal(normal).with_texcoord(texcoord[i]));
        }
    }

    /// Arrow-head cone with its apex at `(x, y, z)` pointing along `(vx, vy, vz)`.
    pub fn add_cone(&mut self, x: f32, y: f32, z: f32, vx: f32, vy: f32, vz: f32) {
        self.add_cone_scaled(x, y, z, vx, vy, vz, DEFAULT_CONE_SCALE);
    }

    /// Like [`add_cone`](Self::add_cone) with an explicit size: the cone is
    /// `4 * scale` long with a base radius of `scale`. A zero direction adds
    /// nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn add_cone_scaled(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        vx: f32,
        vy: f32,
        vz: f32,
        scale: f32,
    ) {
        let Some(axis) = Vec3::new(vx, vy, vz).try_normalize() else {
            log::debug!("add_cone: zero-length direction ignored");
            return;
        };
        let apex = Vec3::new(x, y, z);
        let height = 4.0 * scale;
        let base = apex - axis * height;

        // Right-handed frame around the axis: u × w = axis.
        let u = axis.any_orthogonal_vector().normalize();
        let w = axis.cross(u);

        let radial = |k: usize| {
            let theta = std::f32::consts::TAU * k as f32 / CONE_SIDES as f32;
            u * theta.cos() + w * theta.sin()
        };
        // Side normal tilts towards the apex by the cone's slope.
        let side_normal = |r: Vec3| (r * height + axis * scale).normalize();

        let buf = self.buffer_mut(VertexLayout::PositionNormal, PrimitiveKind::Triangles);
        let mut push = |p: Vec3, n: Vec3| {
            buf.push(&VertexRecord::new(p.to_array()).with_normal(n.to_array()));
        };

        for k in 0..CONE_SIDES {
            let (r0, r1) = (radial(k), radial(k + 1));
            let (p0, p1) = (base + r0 * scale, base + r1 * scale);
            let apex_normal = side_normal((r0 + r1).normalize());

            push(apex, apex_normal);
            push(p0, side_normal(r0));
            push(p1, side_normal(r1));

            push(base, -axis);
            push(p1, -axis);
            push(p0, -axis);
        }
    }

    pub fn add_text(&mut self, x: f32, y: f32, z: f32, text: impl Into<String>) {
        self.text.add_text([x, y, z], text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: [f32; 3] = [0.0, 0.0, 1.0];

    #[test]
    fn quad_splits_on_the_0_2_diagonal() {
        let mut d = Drawable::new();
        let vtx = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        d.add_quad_face(vtx, N, [1.0, 0.0, 0.0, 1.0]);
        let buf = d.buffer(VertexLayout::PositionNormalColor, PrimitiveKind::Triangles).unwrap();
        let got: Vec<[f32; 3]> = buf.positions().collect();
        assert_eq!(got, vec![vtx[0], vtx[1], vtx[2], vtx[0], vtx[2], vtx[3]]);
    }

    #[test]
    fn helpers_pick_their_layouts() {
        let mut d = Drawable::new();
        d.add_line([0.0; 3], [1.0; 3]);
        d.add_triangle([[0.0; 3]; 3], N, [[1.0; 4]; 3]);
        d.add_triangle_tex([[0.0; 3]; 3], N, [0.0, 0.5, 1.0]);
        d.add_quad_tex([[0.0; 3]; 4], N, [0.0; 4]);

        assert_eq!(d.buffer(VertexLayout::Position, PrimitiveKind::Lines).unwrap().len(), 2);
        assert_eq!(
            d.buffer(VertexLayout::PositionNormalColor, PrimitiveKind::Triangles).unwrap().len(),
            3
        );
        assert_eq!(
            d.buffer(VertexLayout::PositionNormalTexCoord, PrimitiveKind::Triangles).unwrap().len(),
            9
        );
        assert_eq!(d.vertex_count(), 14);
    }

    #[test]
    fn cone_is_closed_and_faces_outward() {
        let mut d = Drawable::new();
        d.add_cone_scaled(1.0, 2.0, 3.0, 0.0, 0.0, 2.0, 0.5);
        let buf = d.buffer(VertexLayout::PositionNormal, PrimitiveKind::Triangles).unwrap();
        assert_eq!(buf.len(), CONE_SIDES * 6);

        let apex = Vec3::new(1.0, 2.0, 3.0);
        for tri in 0..buf.len() / 3 {
            let r: Vec<VertexRecord> = (0..3).map(|i| buf.record(tri * 3 + i).unwrap()).collect();
            let p: Vec<Vec3> = r.iter().map(|v| Vec3::from_array(v.position)).collect();
            let face = (p[1] - p[0]).cross(p[2] - p[0]);
            for v in &r {
                let n = Vec3::from_array(v.normal.unwrap());
                assert!(face.dot(n) > 0.0, "triangle {tri} winds against its normal");
            }
            // Every vertex lies within the cone's bounding slab.
            for q in &p {
                assert!(q.z <= apex.z + 1e-5 && q.z >= apex.z - 2.0 - 1e-5);
            }
        }
    }

    #[test]
    fn zero_direction_cone_is_a_no_op() {
        let mut d = Drawable::new();
        d.add_cone(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(d.is_empty());
    }

    #[test]
    fn clear_empties_all_buffers_and_text() {
        let mut d = Drawable::new();
        d.add_line([0.0; 3], [1.0; 3]);
        d.add_text(0.0, 0.0, 0.0, "label");
        d.clear();
        assert!(d.is_empty());
        assert_eq!(d.buffers().count(), 1, "buffers are kept for reuse");
    }
}
