use crate::color::unpack_color;
use crate::handle::{BufferHandle, DeviceSlot};
use crate::layout::{Attribute, ScalarType, VertexLayout};
use crate::vertex::{ColorSource, VertexRecord};

/// Stored primitive assembly. Strips and loops are expanded into independent
/// segments before they reach a buffer, so only flat lists exist here.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PrimitiveKind {
    Lines,
    Triangles,
}

impl PrimitiveKind {
    #[inline]
    pub const fn vertices_per_primitive(self) -> usize {
        match self {
            PrimitiveKind::Lines => 2,
            PrimitiveKind::Triangles => 3,
        }
    }
}

/// Packed vertex records of one layout and one primitive kind.
///
/// Lifecycle: created empty, appended to, uploaded by the device manager, drawn
/// any number of times, cleared on rebuild. The layout never changes.
#[derive(Debug)]
pub struct GeometryBuffer {
    layout: VertexLayout,
    kind: PrimitiveKind,
    data: Vec<u8>,
    count: usize,

    device: Option<DeviceSlot>,
    device_count: usize,
}

impl GeometryBuffer {
    pub fn new(layout: VertexLayout, kind: PrimitiveKind) -> Self {
        Self { layout, kind, data: Vec::new(), count: 0, device: None, device_count: 0 }
    }

    #[inline]
    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Number of vertices on the CPU side.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Packed bytes, `len() * stride()` long.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Appends one vertex.
    ///
    /// A vertex whose attributes don't match the buffer's layout is logged and
    /// dropped; the buffer is left untouched and `false` is returned.
    pub fn push(&mut self, vertex: &VertexRecord) -> bool {
        if !vertex.write_packed(self.layout, &mut self.data) {
            log::warn!(
                "dropping vertex: attributes {:?} do not match buffer layout {:?}",
                vertex.layout(),
                self.layout
            );
            return false;
        }
        self.count += 1;
        true
    }

    /// Discards the CPU contents. The device copy stays allocated for reuse but
    /// is no longer considered drawable.
    pub fn clear(&mut self) {
        self.data.clear();
        self.count = 0;
        self.device_count = 0;
    }

    /// Decodes the `index`-th stored vertex. Packed colors come back quantized.
    pub fn record(&self, index: usize) -> Option<VertexRecord> {
        let stride = self.stride();
        let bytes = self.data.get(index * stride..(index + 1) * stride)?;
        let mut out = VertexRecord::default();
        for b in self.layout.attributes() {
            let field = &bytes[b.offset..b.offset + b.size()];
            match (b.attribute, b.scalar) {
                (Attribute::Position, _) => out.position = bytemuck::pod_read_unaligned(field),
                (Attribute::Normal, _) => out.normal = Some(bytemuck::pod_read_unaligned(field)),
                (Attribute::Color, ScalarType::UnsignedByte) => {
                    out.color = ColorSource::Rgba(unpack_color(bytemuck::pod_read_unaligned(field)))
                }
                (Attribute::Color, ScalarType::Float) => {
                    out.color = ColorSource::Rgba(bytemuck::pod_read_unaligned(field))
                }
                (Attribute::TexCoord, _) => {
                    out.color = ColorSource::TexCoord(bytemuck::pod_read_unaligned(field))
                }
            }
        }
        Some(out)
    }

    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.data
            .chunks_exact(self.stride())
            .map(|rec| bytemuck::pod_read_unaligned(&rec[..12]))
    }

    // ── device side ──────────────────────────────────────────────────────

    /// Handle of the device copy, `None` until first upload.
    #[inline]
    pub fn device_handle(&self) -> Option<BufferHandle> {
        self.device.as_ref().map(DeviceSlot::handle)
    }

    /// Vertex count of the last upload. This is what a draw uses.
    #[inline]
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Hands ownership of a freshly allocated device buffer to this buffer.
    /// A previously attached slot is dropped (and queued for release).
    pub fn attach_device(&mut self, slot: DeviceSlot) {
        self.device = Some(slot);
        self.device_count = 0;
    }

    pub fn mark_uploaded(&mut self) {
        self.device_count = self.count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ReleaseQueue;

    #[test]
    fn stride_of_every_record_is_fixed() {
        let mut buf = GeometryBuffer::new(VertexLayout::PositionNormalColor, PrimitiveKind::Triangles);
        for i in 0..5 {
            let v = VertexRecord::new([i as f32, 0.0, 0.0])
                .with_normal([0.0, 0.0, 1.0])
                .with_color([0.1 * i as f32, 0.0, 0.0, 1.0]);
            assert!(buf.push(&v));
        }
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.bytes().len(), 5 * 32);
        let xs: Vec<f32> = buf.positions().map(|p| p[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn mismatched_vertex_is_dropped() {
        let mut buf = GeometryBuffer::new(VertexLayout::PositionColor, PrimitiveKind::Lines);
        assert!(buf.push(&VertexRecord::new([0.0; 3]).with_color([1.0; 4])));
        assert!(!buf.push(&VertexRecord::new([1.0; 3])));
        assert!(!buf.push(&VertexRecord::new([1.0; 3]).with_texcoord(0.2)));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.bytes().len(), 16);
    }

    #[test]
    fn record_decodes_what_was_pushed() {
        let mut buf = GeometryBuffer::new(VertexLayout::PositionNormalTexCoord, PrimitiveKind::Triangles);
        let v = VertexRecord::new([1.0, 2.0, 3.0]).with_normal([0.0, 1.0, 0.0]).with_texcoord(0.75);
        buf.push(&v);
        assert_eq!(buf.record(0), Some(v));
        assert_eq!(buf.record(1), None);
    }

    #[test]
    fn clear_resets_counts_but_keeps_device_slot() {
        let queue = ReleaseQueue::new();
        let mut buf = GeometryBuffer::new(VertexLayout::Position, PrimitiveKind::Lines);
        buf.push(&VertexRecord::new([0.0; 3]));
        buf.push(&VertexRecord::new([1.0; 3]));
        buf.attach_device(DeviceSlot::new(BufferHandle::new(9).unwrap(), queue.clone()));
        buf.mark_uploaded();
        assert_eq!(buf.device_count(), 2);

        buf.push(&VertexRecord::new([2.0; 3]));
        assert_eq!(buf.device_count(), 2, "appends are not drawn until re-upload");

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.device_count(), 0);
        assert!(buf.device_handle().is_some());
        assert!(queue.is_empty());

        drop(buf);
        assert_eq!(queue.len(), 1);
    }
}
