//! Immediate-mode geometry builder.
//!
//! ```text
//! let mut b = drawable.begin_primitive(Topology::LineStrip);
//! b.color([1.0, 0.0, 0.0, 1.0]);
//! b.vertex(0.0, 0.0, 0.0);
//! b.vertex(1.0, 0.0, 0.0);
//! b.vertex(1.0, 1.0, 0.0);
//! b.end_primitive();
//! ```
//!
//! Strips and loops are expanded into independent segments as vertices
//! arrive, so every stored buffer is a flat primitive list.

use crate::buffer::PrimitiveKind;
use crate::color::Rgba;
use crate::drawable::Drawable;
use crate::layout::{DEFAULT_NORMAL, VertexLayout};
use crate::vertex::{ColorSource, VertexRecord};

/// Primitive assembly requested by the caller.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
}

impl Topology {
    /// Assembly the vertices are stored as.
    #[inline]
    pub const fn stored_kind(self) -> PrimitiveKind {
        match self {
            Topology::Triangles => PrimitiveKind::Triangles,
            Topology::Lines | Topology::LineStrip | Topology::LineLoop => PrimitiveKind::Lines,
        }
    }

    #[inline]
    pub const fn is_line(self) -> bool {
        !matches!(self, Topology::Triangles)
    }
}

/// Builds one primitive into a [`Drawable`].
///
/// The layout of the primitive is fixed by its first vertex. Lines never store
/// normals; triangles always do (the current normal, `+Z` until set).
/// Dropping the builder ends the primitive.
pub struct Builder<'a> {
    drawable: &'a mut Drawable,
    topology: Topology,
    layout: Option<VertexLayout>,

    // independent lines / triangles: vertices of the primitive being assembled
    pending: Vec<VertexRecord>,
    // strips / loops
    first: Option<VertexRecord>,
    last: Option<VertexRecord>,
    emitted: usize,

    normal: [f32; 3],
    color: ColorSource,
    finished: bool,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(drawable: &'a mut Drawable, topology: Topology) -> Self {
        Self {
            drawable,
            topology,
            layout: None,
            pending: Vec::with_capacity(3),
            first: None,
            last: None,
            emitted: 0,
            normal: DEFAULT_NORMAL,
            color: ColorSource::None,
            finished: false,
        }
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Layout of this primitive, once its first vertex is in.
    #[inline]
    pub fn layout(&self) -> Option<VertexLayout> {
        self.layout
    }

    // ── current attribute state ──────────────────────────────────────────

    pub fn normal(&mut self, nx: f32, ny: f32, nz: f32) -> &mut Self {
        self.normal = [nx, ny, nz];
        self
    }

    pub fn color(&mut self, rgba: Rgba) -> &mut Self {
        self.color = ColorSource::Rgba(rgba);
        self
    }

    /// Opaque color.
    pub fn color3(&mut self, r: f32, g: f32, b: f32) -> &mut Self {
        self.color([r, g, b, 1.0])
    }

    /// Color-ramp coordinate.
    pub fn texcoord(&mut self, t: f32) -> &mut Self {
        self.color = ColorSource::TexCoord(t);
        self
    }

    /// Emits a vertex at `(x, y, z)` with the current normal and color state.
    pub fn vertex(&mut self, x: f32, y: f32, z: f32) -> bool {
        let mut v = VertexRecord::new([x, y, z]);
        v.color = self.color;
        if !self.topology.is_line() {
            v.normal = Some(self.normal);
        }
        self.emit_vertex(v)
    }

    // ── emission ─────────────────────────────────────────────────────────

    /// Emits a fully specified vertex.
    ///
    /// Returns `false` (with a warning) when the vertex doesn't match the layout
    /// fixed by the primitive's first vertex.
    pub fn emit_vertex(&mut self, vertex: VertexRecord) -> bool {
        let layout = vertex.layout();
        match self.layout {
            None => self.layout = Some(layout),
            Some(fixed) if fixed != layout => {
                log::warn!(
                    "dropping vertex: primitive started as {:?}, vertex is {:?}",
                    fixed,
                    layout
                );
                return false;
            }
            Some(_) => {}
        }

        match self.topology {
            Topology::Lines | Topology::Triangles => {
                self.pending.push(vertex);
                if self.pending.len() == self.topology.stored_kind().vertices_per_primitive() {
                    let prim = std::mem::take(&mut self.pending);
                    self.store(layout, &prim);
                }
            }
            Topology::LineStrip | Topology::LineLoop => {
                match self.last {
                    Some(prev) => self.store(layout, &[prev, vertex]),
                    None => self.first = Some(vertex),
                }
                self.last = Some(vertex);
            }
        }
        self.emitted += 1;
        true
    }

    /// Ends the primitive. Line loops get their closing segment; vertices that
    /// don't complete a primitive are discarded.
    pub fn end_primitive(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        match self.topology {
            Topology::LineLoop if self.emitted >= 3 => {
                if let (Some(layout), Some(first), Some(last)) = (self.layout, self.first, self.last) {
                    self.store(layout, &[last, first]);
                }
            }
            Topology::LineStrip | Topology::LineLoop if self.emitted == 1 => {
                log::warn!("discarding {:?} with a single vertex", self.topology);
            }
            _ => {}
        }

        if !self.pending.is_empty() {
            log::warn!(
                "discarding {} dangling vertices of an incomplete {:?} primitive",
                self.pending.len(),
                self.topology
            );
            self.pending.clear();
        }
    }

    fn store(&mut self, layout: VertexLayout, prim: &[VertexRecord]) {
        let buf = self.drawable.buffer_mut(layout, self.topology.stored_kind());
        for v in prim {
            buf.push(v);
        }
    }
}

impl Drop for Builder<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_expands_into_segments() {
        let mut d = Drawable::new();
        {
            let mut b = d.begin_primitive(Topology::LineStrip);
            for i in 0..5 {
                b.vertex(i as f32, 0.0, 0.0);
            }
            b.end_primitive();
        }
        let buf = d.buffer(VertexLayout::Position, PrimitiveKind::Lines).unwrap();
        assert_eq!(buf.len(), 2 * (5 - 1));
        let xs: Vec<f32> = buf.positions().map(|p| p[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0]);
        // Each segment's second point equals the next segment's first.
        for pair in xs.chunks(2).collect::<Vec<_>>().windows(2) {
            assert_eq!(pair[0][1], pair[1][0]);
        }
    }

    #[test]
    fn loop_gets_closing_segment() {
        let mut d = Drawable::new();
        let mut b = d.begin_primitive(Topology::LineLoop);
        b.color3(0.0, 1.0, 0.0);
        b.vertex(0.0, 0.0, 0.0);
        b.vertex(1.0, 0.0, 0.0);
        b.vertex(1.0, 1.0, 0.0);
        b.end_primitive();

        let buf = d.buffer(VertexLayout::PositionColor, PrimitiveKind::Lines).unwrap();
        assert_eq!(buf.len(), 6);
        let last: Vec<[f32; 3]> = buf.positions().skip(4).collect();
        assert_eq!(last, vec![[1.0, 1.0, 0.0], [0.0, 0.0, 0.0]]);
    }

    #[test]
    fn triangles_always_carry_a_normal() {
        let mut d = Drawable::new();
        let mut b = d.begin_primitive(Topology::Triangles);
        b.texcoord(0.5);
        b.vertex(0.0, 0.0, 0.0);
        b.vertex(1.0, 0.0, 0.0);
        b.vertex(0.0, 1.0, 0.0);
        drop(b);

        let buf = d.buffer(VertexLayout::PositionNormalTexCoord, PrimitiveKind::Triangles).unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.record(0).unwrap().normal, Some(DEFAULT_NORMAL));
    }

    #[test]
    fn first_vertex_fixes_the_layout() {
        let mut d = Drawable::new();
        let mut b = d.begin_primitive(Topology::Lines);
        b.color([1.0; 4]);
        assert!(b.vertex(0.0, 0.0, 0.0));
        b.texcoord(0.1);
        assert!(!b.vertex(1.0, 0.0, 0.0), "texcoord after color must be dropped");
        b.color([0.0, 0.0, 0.0, 1.0]);
        assert!(b.vertex(1.0, 0.0, 0.0));
        b.end_primitive();

        assert_eq!(d.buffer(VertexLayout::PositionColor, PrimitiveKind::Lines).unwrap().len(), 2);
        assert!(d.buffer(VertexLayout::PositionTexCoord, PrimitiveKind::Lines).is_none());
    }

    #[test]
    fn dangling_vertices_are_discarded() {
        let mut d = Drawable::new();
        let mut b = d.begin_primitive(Topology::Triangles);
        for i in 0..5 {
            b.vertex(i as f32, 0.0, 0.0);
        }
        b.end_primitive();
        let buf = d.buffer(VertexLayout::PositionNormal, PrimitiveKind::Triangles).unwrap();
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn stored_counts_are_primitive_multiples() {
        let mut d = Drawable::new();
        for topology in [Topology::Lines, Topology::LineStrip, Topology::LineLoop, Topology::Triangles] {
            let mut b = d.begin_primitive(topology);
            for i in 0..7 {
                b.vertex(i as f32, (i * i) as f32, 0.0);
            }
        }
        for buf in d.buffers() {
            assert_eq!(buf.len() % buf.kind().vertices_per_primitive(), 0, "{:?}", buf.layout());
        }
    }
}
