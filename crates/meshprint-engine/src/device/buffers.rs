use meshprint_geom::{
    Attribute, BufferHandle, ColorDefault, DeviceSlot, GeometryBuffer, PrimitiveKind, ReleaseQueue,
    ScalarType, TextBuffer,
};

use crate::capture::{clip_lines, clip_triangles, CaptureBuffer, ClipVertex};
use crate::render::RenderState;
use crate::text::{expand_text, measure_text, GlyphMetrics, TextVertex};

use super::context::{AttribPointer, AttribSlot, GraphicsContext};

/// Moves CPU geometry to the device and issues draws.
///
/// Device buffers belong to the CPU buffers that requested them. When one of
/// those is dropped its handle lands on the shared [`ReleaseQueue`] and is
/// deleted on the next pass through this manager.
#[derive(Debug, Default)]
pub struct BufferManager {
    release: ReleaseQueue,
    /// Scratch target for captures, created on first use.
    feedback: Option<BufferHandle>,
}

impl BufferManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_queue(&self) -> &ReleaseQueue {
        &self.release
    }

    /// Deletes every handle queued since the last call.
    pub fn collect_garbage<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        for handle in self.release.drain() {
            log::debug!("releasing device buffer {}", handle.get());
            ctx.delete_buffer(handle);
        }
    }

    fn allocate<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) -> Option<DeviceSlot> {
        let Some(handle) = ctx.create_buffer() else {
            log::warn!("device buffer allocation failed");
            return None;
        };
        log::debug!("allocated device buffer {}", handle.get());
        Some(DeviceSlot::new(handle, self.release.clone()))
    }

    /// Copies `buf` to its device buffer, allocating it on first use.
    ///
    /// The old contents are invalidated before the write. Empty buffers are
    /// skipped; returns whether anything was written.
    pub fn upload<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C, buf: &mut GeometryBuffer) -> bool {
        self.collect_garbage(ctx);
        if buf.is_empty() {
            return false;
        }

        let handle = match buf.device_handle() {
            Some(h) => h,
            None => {
                let Some(slot) = self.allocate(ctx) else { return false };
                let h = slot.handle();
                buf.attach_device(slot);
                h
            }
        };

        ctx.invalidate_buffer(handle);
        ctx.write_buffer(handle, buf.bytes());
        buf.mark_uploaded();
        true
    }

    /// Expands the strings of `text` into glyph quads and uploads them.
    pub fn upload_text<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        text: &mut TextBuffer,
        metrics: &dyn GlyphMetrics,
    ) -> bool {
        self.collect_garbage(ctx);
        let extents = text.entries().iter().map(|e| measure_text(&e.text, metrics)).collect();
        text.set_extents(extents);
        let vertices = expand_text(text.entries(), metrics);
        if vertices.is_empty() {
            text.mark_uploaded(0);
            return false;
        }

        let handle = match text.device_handle() {
            Some(h) => h,
            None => {
                let Some(slot) = self.allocate(ctx) else { return false };
                let h = slot.handle();
                text.attach_device(slot);
                h
            }
        };

        ctx.invalidate_buffer(handle);
        ctx.write_buffer(handle, bytemuck::cast_slice(&vertices));
        text.mark_uploaded(vertices.len());
        true
    }

    /// Draws the last upload of `buf`.
    ///
    /// Binds the layout's attributes, supplies constants for the ones it
    /// lacks, draws, then disables what it enabled.
    pub fn draw<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C, state: &RenderState, buf: &GeometryBuffer) {
        self.collect_garbage(ctx);
        let (Some(handle), count) = (buf.device_handle(), buf.device_count()) else { return };
        if count == 0 {
            return;
        }

        let layout = buf.layout();
        let defaults = layout.defaults();
        if let Some([x, y, z]) = defaults.normal {
            ctx.attrib_constant(AttribSlot::Normal, [x, y, z, 1.0]);
        }
        match defaults.color {
            ColorDefault::Attribute => {}
            ColorDefault::Static => ctx.attrib_constant(AttribSlot::Color, state.static_color),
            ColorDefault::Constant(c) => ctx.attrib_constant(AttribSlot::Color, c),
        }

        let ramp = layout.has(Attribute::TexCoord);
        if ramp {
            ctx.set_uniform("useColorTex", true.into());
        }

        let stride = layout.stride();
        for b in layout.attributes() {
            let slot = AttribSlot::for_attribute(b.attribute);
            ctx.enable_attrib(slot);
            ctx.attrib_pointer(
                slot,
                handle,
                AttribPointer {
                    components: b.components,
                    scalar: b.scalar,
                    normalized: b.normalized,
                    stride,
                    offset: b.offset,
                },
            );
        }

        ctx.draw_arrays(buf.kind(), 0, count);

        for b in layout.attributes() {
            ctx.disable_attrib(AttribSlot::for_attribute(b.attribute));
        }
        if ramp {
            ctx.set_uniform("useColorTex", false.into());
        }
    }

    /// Draws the last text upload as screen-aligned glyph quads in the
    /// static color.
    pub fn draw_text<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C, state: &RenderState, text: &TextBuffer) {
        self.collect_garbage(ctx);
        let (Some(handle), count) = (text.device_handle(), text.device_count()) else { return };
        if count == 0 {
            return;
        }

        const BINDINGS: [(AttribSlot, usize, usize); 3] = [
            (AttribSlot::Vertex, 3, 0),
            (AttribSlot::TextVertex, 2, TextVertex::OFFSET_OFFSET),
            (AttribSlot::TexCoord1, 2, TextVertex::TEXCOORD_OFFSET),
        ];

        ctx.attrib_constant(AttribSlot::Color, state.static_color);
        ctx.set_uniform("containsText", true.into());
        for (slot, components, offset) in BINDINGS {
            ctx.enable_attrib(slot);
            ctx.attrib_pointer(
                slot,
                handle,
                AttribPointer {
                    components,
                    scalar: ScalarType::Float,
                    normalized: false,
                    stride: TextVertex::STRIDE,
                    offset,
                },
            );
        }

        ctx.draw_arrays(PrimitiveKind::Triangles, 0, count);

        for (slot, _, _) in BINDINGS {
            ctx.disable_attrib(slot);
        }
        ctx.set_uniform("containsText", false.into());
    }

    /// Replays the last upload of `buf` in feedback mode and appends the
    /// clipped result to `out`.
    ///
    /// The capture program must already be bound with `state` applied.
    /// Blocks on the read-back.
    pub fn capture<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        state: &RenderState,
        buf: &GeometryBuffer,
        out: &mut CaptureBuffer,
    ) {
        let count = buf.device_count();
        if buf.device_handle().is_none() || count == 0 {
            return;
        }

        let feedback = match self.feedback {
            Some(h) => h,
            None => {
                let Some(h) = ctx.create_buffer() else {
                    log::warn!("feedback buffer allocation failed; capture skipped");
                    return;
                };
                self.feedback = Some(h);
                h
            }
        };

        let size = count * ClipVertex::SIZE;
        ctx.reserve_buffer(feedback, size);
        ctx.begin_feedback(feedback, buf.kind());
        self.draw(ctx, state, buf);
        ctx.end_feedback();

        let mut bytes = vec![0u8; size];
        ctx.read_buffer(feedback, 0, &mut bytes);
        let records: Vec<ClipVertex> =
            bytes.chunks_exact(ClipVertex::SIZE).map(bytemuck::pod_read_unaligned).collect();

        match buf.kind() {
            PrimitiveKind::Triangles => {
                clip_triangles(&records, state.viewport, state.use_clip_plane, &mut out.triangles)
            }
            PrimitiveKind::Lines => clip_lines(&records, state.viewport, state.use_clip_plane, &mut out.lines),
        }
    }

    /// Deletes the feedback buffer and everything still queued.
    pub fn release<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        if let Some(h) = self.feedback.take() {
            ctx.delete_buffer(h);
        }
        self.collect_garbage(ctx);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec4};
    use meshprint_geom::{Drawable, Topology, VertexLayout, VertexRecord};

    use super::*;
    use crate::coords::Viewport;
    use crate::device::{HeadlessContext, UniformValue};
    use crate::text::FixedMetrics;

    fn state() -> RenderState {
        RenderState::new(Viewport::new(100.0, 100.0), 3)
    }

    fn lines(n: usize) -> GeometryBuffer {
        let mut buf = GeometryBuffer::new(VertexLayout::Position, PrimitiveKind::Lines);
        for i in 0..n {
            buf.push(&VertexRecord::new([i as f32, 0.0, 0.0]));
        }
        buf
    }

    #[test]
    fn empty_buffers_are_not_allocated() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut buf = lines(0);
        assert!(!mgr.upload(&mut ctx, &mut buf));
        assert_eq!(buf.device_handle(), None);
        assert_eq!(ctx.live_buffers(), 0);
    }

    #[test]
    fn upload_allocates_once_and_invalidates_every_time() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut buf = lines(2);

        assert!(mgr.upload(&mut ctx, &mut buf));
        let h = buf.device_handle().unwrap();
        buf.push(&VertexRecord::new([9.0, 9.0, 9.0]));
        buf.push(&VertexRecord::new([8.0, 8.0, 8.0]));
        assert!(mgr.upload(&mut ctx, &mut buf));

        assert_eq!(buf.device_handle(), Some(h));
        assert_eq!(ctx.live_buffers(), 1);
        assert_eq!(ctx.invalidations(), 2);
        assert_eq!(ctx.buffer_data(h).unwrap(), buf.bytes());
        assert_eq!(buf.device_count(), 4);
    }

    #[test]
    fn draw_uses_uploaded_count_not_cpu_count() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut buf = lines(2);
        mgr.upload(&mut ctx, &mut buf);
        buf.push(&VertexRecord::new([1.0; 3]));
        buf.push(&VertexRecord::new([2.0; 3]));

        mgr.draw(&mut ctx, &state(), &buf);
        assert_eq!(ctx.draws().len(), 1);
        assert_eq!(ctx.draws()[0].count, 2);
    }

    #[test]
    fn never_uploaded_buffers_do_not_draw() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        mgr.draw(&mut ctx, &state(), &lines(4));
        assert!(ctx.draws().is_empty());
    }

    #[test]
    fn draw_binds_layout_slots_and_restores_them() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut buf = GeometryBuffer::new(VertexLayout::PositionNormalColor, PrimitiveKind::Triangles);
        for _ in 0..3 {
            buf.push(&VertexRecord::new([0.0; 3]).with_normal([0.0, 1.0, 0.0]).with_color([1.0; 4]));
        }
        mgr.upload(&mut ctx, &mut buf);
        mgr.draw(&mut ctx, &state(), &buf);

        let call = &ctx.draws()[0];
        assert_eq!(call.enabled, vec![AttribSlot::Vertex, AttribSlot::Normal, AttribSlot::Color]);
        assert_eq!(call.kind, PrimitiveKind::Triangles);
        for slot in AttribSlot::ALL {
            assert!(!ctx.attrib(slot).enabled, "{slot:?} left enabled");
        }
        let (_, color) = ctx.attrib(AttribSlot::Color).pointer.unwrap();
        assert_eq!(color.stride, 32);
        assert_eq!(color.offset, 24);
        assert!(color.normalized);
    }

    #[test]
    fn missing_attributes_get_defaults() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut st = state();
        st.static_color = [0.1, 0.2, 0.3, 1.0];

        let mut plain = lines(2);
        mgr.upload(&mut ctx, &mut plain);
        mgr.draw(&mut ctx, &st, &plain);

        let mut ramp = GeometryBuffer::new(VertexLayout::PositionTexCoord, PrimitiveKind::Lines);
        ramp.push(&VertexRecord::new([0.0; 3]).with_texcoord(0.25));
        ramp.push(&VertexRecord::new([1.0; 3]).with_texcoord(0.75));
        mgr.upload(&mut ctx, &mut ramp);
        mgr.draw(&mut ctx, &st, &ramp);

        let [a, b] = ctx.draws() else { panic!("expected two draws") };
        assert_eq!(a.constant(AttribSlot::Normal), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(a.constant(AttribSlot::Color), [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(b.constant(AttribSlot::Color), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(b.enabled, vec![AttribSlot::Vertex, AttribSlot::TexCoord0]);
    }

    #[test]
    fn ramp_layouts_toggle_color_texture() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let p = ctx.create_program().unwrap();
        ctx.link_program(p, &[]).unwrap();
        ctx.use_program(p);

        let mut mgr = BufferManager::new();
        let mut ramp = GeometryBuffer::new(VertexLayout::PositionNormalTexCoord, PrimitiveKind::Triangles);
        for t in [0.0, 0.5, 1.0] {
            ramp.push(&VertexRecord::new([t; 3]).with_normal([0.0, 0.0, 1.0]).with_texcoord(t));
        }
        mgr.upload(&mut ctx, &mut ramp);
        mgr.draw(&mut ctx, &state(), &ramp);

        assert_eq!(ctx.draws()[0].uniform("useColorTex"), Some(UniformValue::Int(1)));
        assert_eq!(ctx.uniform("useColorTex"), Some(UniformValue::Int(0)));
    }

    #[test]
    fn dropped_buffers_are_released_exactly_once() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut d = Drawable::new();
        d.add_line([0.0; 3], [1.0; 3]);
        for buf in d.buffers_mut() {
            mgr.upload(&mut ctx, buf);
        }
        let h = d.buffers().next().and_then(GeometryBuffer::device_handle).unwrap();

        drop(d);
        assert_eq!(mgr.release_queue().len(), 1);
        mgr.collect_garbage(&mut ctx);
        mgr.collect_garbage(&mut ctx);

        assert_eq!(ctx.deleted_buffers(), [h]);
        assert_eq!(ctx.live_buffers(), 0);
    }

    #[test]
    fn text_uses_glyph_slots() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut text = TextBuffer::new();
        text.add_text([0.0; 3], "a b");
        assert!(mgr.upload_text(&mut ctx, &mut text, &FixedMetrics));
        assert_eq!(text.device_count(), 12);

        mgr.draw_text(&mut ctx, &state(), &text);
        let call = &ctx.draws()[0];
        assert_eq!(call.enabled, vec![AttribSlot::Vertex, AttribSlot::TextVertex, AttribSlot::TexCoord1]);
        assert_eq!(call.count, 12);
        assert_eq!(text.object_size("a b"), Some([28.0, 10.0]));
        assert_eq!(call.constant(AttribSlot::Color), state().static_color);
        let (_, ptr) = ctx.attrib(AttribSlot::TexCoord1).pointer.unwrap();
        assert_eq!((ptr.stride, ptr.offset), (32, 20));
    }

    #[test]
    fn whitespace_only_text_draws_nothing() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let mut mgr = BufferManager::new();
        let mut text = TextBuffer::new();
        text.add_text([0.0; 3], "   ");
        assert!(!mgr.upload_text(&mut ctx, &mut text, &FixedMetrics));
        mgr.draw_text(&mut ctx, &state(), &text);
        assert!(ctx.draws().is_empty());
    }

    #[test]
    fn capture_reads_back_and_clips_lines() {
        let mut ctx = HeadlessContext::new("3.3").recording_draws();
        let p = ctx.create_program().unwrap();
        ctx.link_program(p, &[]).unwrap();
        ctx.use_program(p);

        let mut st = state();
        st.model_view = Mat4::IDENTITY;
        st.clip_plane = Vec4::new(1.0, 0.0, 0.0, 0.0);
        st.use_clip_plane = true;
        st.apply(&mut ctx);

        let mut d = Drawable::new();
        {
            let mut b = d.begin_primitive(Topology::Lines);
            b.vertex(-0.5, 0.0, 0.0);
            b.vertex(1.0, 0.0, 0.0);
            b.end_primitive();
        }
        let buf = d.buffer_mut(VertexLayout::Position, PrimitiveKind::Lines);
        let mut mgr = BufferManager::new();
        mgr.upload(&mut ctx, buf);

        let mut out = CaptureBuffer::new();
        mgr.capture(&mut ctx, &st, buf, &mut out);

        assert_eq!(out.line_count(), 1);
        // Intersection at x = 0 (device 50), then the visible endpoint (device 100).
        assert!((out.lines[0].position.x - 50.0).abs() < 1e-4);
        assert!((out.lines[1].position.x - 100.0).abs() < 1e-4);
        assert!(ctx.draws()[0].feedback);

        mgr.release(&mut ctx);
        assert_eq!(ctx.live_buffers(), 1, "only the drawable's buffer remains");
    }
}
