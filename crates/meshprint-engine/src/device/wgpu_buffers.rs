//! wgpu path for hosts that render through wgpu instead of a
//! [`GraphicsContext`](super::GraphicsContext).
//!
//! Vertex records are uploaded byte for byte; the layouts below describe them
//! with the same shader locations as the fixed attribute slots. wgpu has no
//! transform feedback, so capture is not available here.

use std::collections::BTreeMap;

use meshprint_geom::{Drawable, PrimitiveKind, VertexLayout};

const ATTRS_POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const ATTRS_POSITION_COLOR: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 3 => Unorm8x4];
const ATTRS_POSITION_TEX: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 4 => Float32];
const ATTRS_POSITION_NORMAL: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 2 => Float32x3];
const ATTRS_POSITION_NORMAL_COLOR: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 2 => Float32x3, 3 => Unorm8x4];
const ATTRS_POSITION_NORMAL_TEX: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 2 => Float32x3, 4 => Float32];

/// wgpu description of a layout's vertex records.
pub fn vertex_buffer_layout(layout: VertexLayout) -> wgpu::VertexBufferLayout<'static> {
    let attributes: &'static [wgpu::VertexAttribute] = match layout {
        VertexLayout::Position => &ATTRS_POSITION,
        VertexLayout::PositionColor => &ATTRS_POSITION_COLOR,
        VertexLayout::PositionTexCoord => &ATTRS_POSITION_TEX,
        VertexLayout::PositionNormal => &ATTRS_POSITION_NORMAL,
        VertexLayout::PositionNormalColor => &ATTRS_POSITION_NORMAL_COLOR,
        VertexLayout::PositionNormalTexCoord => &ATTRS_POSITION_NORMAL_TEX,
    };
    wgpu::VertexBufferLayout {
        array_stride: layout.stride() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

pub fn primitive_topology(kind: PrimitiveKind) -> wgpu::PrimitiveTopology {
    match kind {
        PrimitiveKind::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveKind::Triangles => wgpu::PrimitiveTopology::TriangleList,
    }
}

#[derive(Debug)]
struct Slot {
    buffer: wgpu::Buffer,
    capacity: u64,
    count: u32,
}

/// One `wgpu::Buffer` per (layout, kind) of a drawable.
#[derive(Debug, Default)]
pub struct WgpuBuffers {
    slots: BTreeMap<(VertexLayout, PrimitiveKind), Slot>,
}

impl WgpuBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes every non-empty buffer of `drawable`, growing device buffers as
    /// needed. Buffers that became empty keep their storage but draw nothing.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, drawable: &Drawable) {
        for buf in drawable.buffers() {
            let key = (buf.layout(), buf.kind());
            if buf.is_empty() {
                if let Some(slot) = self.slots.get_mut(&key) {
                    slot.count = 0;
                }
                continue;
            }

            let required = buf.bytes().len() as u64;
            let grow = self.slots.get(&key).is_none_or(|s| s.capacity < required);
            if grow {
                let capacity = required.next_power_of_two().max(256);
                log::debug!("growing {key:?} vertex buffer to {capacity} bytes");
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("meshprint vertex buffer"),
                    size: capacity,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                self.slots.insert(key, Slot { buffer, capacity, count: 0 });
            }

            let Some(slot) = self.slots.get_mut(&key) else { continue };
            queue.write_buffer(&slot.buffer, 0, buf.bytes());
            slot.count = buf.len() as u32;
        }
    }

    pub fn vertex_count(&self, layout: VertexLayout, kind: PrimitiveKind) -> u32 {
        self.slots.get(&(layout, kind)).map_or(0, |s| s.count)
    }

    /// Draws one (layout, kind). The caller has set a pipeline built with
    /// [`vertex_buffer_layout`] and [`primitive_topology`] for it.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, layout: VertexLayout, kind: PrimitiveKind) {
        let Some(slot) = self.slots.get(&(layout, kind)) else { return };
        if slot.count == 0 {
            return;
        }
        let bytes = slot.count as u64 * layout.stride() as u64;
        pass.set_vertex_buffer(0, slot.buffer.slice(..bytes));
        pass.draw(0..slot.count, 0..1);
    }

    /// Draws every non-empty buffer, asking `pipeline_for` for its pipeline.
    /// Pairs without a pipeline are skipped.
    pub fn draw_all<'p>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        mut pipeline_for: impl FnMut(VertexLayout, PrimitiveKind) -> Option<&'p wgpu::RenderPipeline>,
    ) {
        for &(layout, kind) in self.slots.keys() {
            if self.vertex_count(layout, kind) == 0 {
                continue;
            }
            let Some(pipeline) = pipeline_for(layout, kind) else { continue };
            pass.set_pipeline(pipeline);
            self.draw(pass, layout, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use meshprint_geom::ScalarType;

    use super::*;
    use crate::device::AttribSlot;

    #[test]
    fn wgpu_layouts_match_the_record_layout() {
        for layout in VertexLayout::ALL {
            let desc = vertex_buffer_layout(layout);
            assert_eq!(desc.array_stride, layout.stride() as u64);
            assert_eq!(desc.attributes.len(), layout.attributes().len());

            for (attr, binding) in desc.attributes.iter().zip(layout.attributes()) {
                assert_eq!(attr.offset, binding.offset as u64, "{layout:?}");
                assert_eq!(attr.shader_location, AttribSlot::for_attribute(binding.attribute).location());
                assert_eq!(attr.format.size(), binding.size() as u64);
                let unorm = attr.format == wgpu::VertexFormat::Unorm8x4;
                assert_eq!(unorm, binding.scalar == ScalarType::UnsignedByte && binding.normalized);
            }
        }
    }

    #[test]
    fn kinds_map_to_list_topologies() {
        assert_eq!(primitive_topology(PrimitiveKind::Lines), wgpu::PrimitiveTopology::LineList);
        assert_eq!(primitive_topology(PrimitiveKind::Triangles), wgpu::PrimitiveTopology::TriangleList);
    }
}
