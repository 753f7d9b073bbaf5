use glam::{Mat4, Vec4};
use meshprint_geom::{Drawable, GeometryBuffer, Rgba};

use crate::capture::CaptureBuffer;
use crate::coords::Viewport;
use crate::device::{GraphicsContext, UniformValue};

use super::renderer::Renderer;
use super::state::{Light, Material, RenderState};

/// Render state scoped to one frame or export.
///
/// Setters update the state and upload it to the bound program right away.
/// Dropping the frame turns the clip plane off.
pub struct Frame<'r, C: GraphicsContext> {
    renderer: &'r mut Renderer<C>,
    state: RenderState,
}

impl<'r, C: GraphicsContext> Frame<'r, C> {
    pub(super) fn new(renderer: &'r mut Renderer<C>, viewport: Viewport) -> Self {
        if !viewport.is_valid() {
            log::warn!("frame viewport {}x{} is degenerate", viewport.width, viewport.height);
        }
        let state = RenderState::new(viewport, renderer.max_lights);
        renderer.ctx.use_program(renderer.programs.default);
        state.apply(&mut renderer.ctx);
        Self { renderer, state }
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    pub fn set_transform_matrices(&mut self, model_view: Mat4, projection: Mat4) {
        self.state.model_view = model_view;
        self.state.projection = projection;
        self.state.apply_transforms(&mut self.renderer.ctx);
    }

    /// Sets the clip plane from an object-space equation `ax + by + cz + d`.
    /// Points where it is negative are clipped. Uses the current model-view.
    pub fn set_clip_plane_eqn(&mut self, eqn: [f32; 4]) {
        self.state.set_clip_plane_eqn(Vec4::from_array(eqn));
        self.state.apply_clip_plane(&mut self.renderer.ctx);
    }

    pub fn set_clip_plane_use(&mut self, enable: bool) {
        self.state.use_clip_plane = enable;
        self.renderer.ctx.set_uniform("useClipPlane", enable.into());
    }

    /// Color for geometry without per-vertex colors.
    pub fn set_static_color(&mut self, rgba: Rgba) {
        self.state.static_color = rgba;
    }

    /// Counts above the number of light slots are ignored.
    pub fn set_num_lights(&mut self, n: usize) {
        if n > self.state.lights.len() {
            log::warn!("{n} lights requested, at most {} supported", self.state.lights.len());
            return;
        }
        self.state.num_lights = n;
        self.renderer.ctx.set_uniform("num_lights", UniformValue::Int(n as i32));
    }

    pub fn set_point_light(&mut self, index: usize, light: Light) {
        let Some(slot) = self.state.lights.get_mut(index) else {
            log::warn!("light index {index} out of range");
            return;
        };
        *slot = light;
        self.state.apply_light(&mut self.renderer.ctx, index);
    }

    pub fn set_ambient_light(&mut self, rgba: Rgba) {
        self.state.ambient = rgba;
        self.renderer.ctx.set_uniform("g_ambient", UniformValue::Vec4(rgba));
    }

    pub fn set_material(&mut self, material: Material) {
        self.state.material = material;
        self.renderer.ctx.set_uniform("material.specular", UniformValue::Vec4(material.specular));
        self.renderer.ctx.set_uniform("material.shininess", UniformValue::Float(material.shininess));
    }

    /// Draws every uploaded buffer of `drawable`, then its text.
    pub fn draw(&mut self, drawable: &Drawable) {
        for buf in drawable.buffers() {
            self.draw_buffer(buf);
        }
        let r = &mut *self.renderer;
        r.buffers.draw_text(&mut r.ctx, &self.state, drawable.text());
    }

    pub fn draw_buffer(&mut self, buf: &GeometryBuffer) {
        let r = &mut *self.renderer;
        r.buffers.draw(&mut r.ctx, &self.state, buf);
    }

    /// Captures one uploaded buffer in device space, clipped against the
    /// active clip plane. Empty (with a warning) when capture is unavailable.
    pub fn capture_buffer(&mut self, buf: &GeometryBuffer) -> CaptureBuffer {
        let mut out = CaptureBuffer::new();
        self.capture_into(std::iter::once(buf), &mut out);
        out
    }

    /// Captures every uploaded buffer of `drawable` into one result. Text is
    /// not captured.
    pub fn capture(&mut self, drawable: &Drawable) -> CaptureBuffer {
        let mut out = CaptureBuffer::new();
        self.capture_into(drawable.buffers(), &mut out);
        out
    }

    fn capture_into<'b>(&mut self, bufs: impl Iterator<Item = &'b GeometryBuffer>, out: &mut CaptureBuffer) {
        let r = &mut *self.renderer;
        let Some(print) = r.programs.print else {
            log::warn!("vector capture unavailable on this context; returning empty capture");
            return;
        };

        r.ctx.use_program(print);
        self.state.apply(&mut r.ctx);
        for buf in bufs {
            r.buffers.capture(&mut r.ctx, &self.state, buf, out);
        }
        r.ctx.use_program(r.programs.default);
        self.state.apply(&mut r.ctx);

        log::debug!("captured {} triangles, {} lines", out.triangle_count(), out.line_count());
    }
}

impl<C: GraphicsContext> Drop for Frame<'_, C> {
    fn drop(&mut self) {
        self.state.use_clip_plane = false;
        self.renderer.ctx.set_uniform("useClipPlane", false.into());
    }
}
