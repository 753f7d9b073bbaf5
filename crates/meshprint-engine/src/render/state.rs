use glam::{Mat3, Mat4, Vec4};
use meshprint_geom::Rgba;

use crate::coords::Viewport;
use crate::device::{GraphicsContext, UniformValue};

/// Point light in eye space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub position: [f32; 3],
    pub diffuse: Rgba,
    pub specular: Rgba,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub specular: Rgba,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self { specular: [0.0, 0.0, 0.0, 1.0], shininess: 1.0 }
    }
}

/// Everything the shaders read besides vertex data, for one frame.
///
/// Owned by a [`Frame`](super::Frame) and re-uploaded whenever the bound
/// program changes.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub viewport: Viewport,
    pub model_view: Mat4,
    pub projection: Mat4,
    /// Plane equation in eye space.
    pub clip_plane: Vec4,
    pub use_clip_plane: bool,
    /// Color supplied to layouts without a per-vertex color.
    pub static_color: Rgba,
    pub ambient: Rgba,
    /// One entry per light slot; length is the maximum light count.
    pub lights: Vec<Light>,
    pub num_lights: usize,
    pub material: Material,
}

impl RenderState {
    pub fn new(viewport: Viewport, max_lights: usize) -> Self {
        Self {
            viewport,
            model_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            clip_plane: Vec4::ZERO,
            use_clip_plane: false,
            static_color: [1.0, 1.0, 1.0, 1.0],
            ambient: [0.0, 0.0, 0.0, 1.0],
            lights: vec![Light::default(); max_lights],
            num_lights: 0,
            material: Material::default(),
        }
    }

    /// Inverse-transpose of the model-view's upper 3×3.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.model_view).inverse().transpose()
    }

    /// Pixel-space projection used to offset glyph quads.
    pub fn text_projection(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(0.0, self.viewport.width, 0.0, self.viewport.height, -5.0, 5.0)
    }

    /// Stores an object-space plane equation, moved into eye space by the
    /// current model-view.
    pub fn set_clip_plane_eqn(&mut self, eqn: Vec4) {
        self.clip_plane = self.model_view.inverse().transpose() * eqn;
    }

    pub fn apply_transforms<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.set_uniform("modelViewMatrix", UniformValue::Mat4(self.model_view.to_cols_array()));
        ctx.set_uniform("projectionMatrix", UniformValue::Mat4(self.projection.to_cols_array()));
        ctx.set_uniform("textProjMatrix", UniformValue::Mat4(self.text_projection().to_cols_array()));
        ctx.set_uniform("normalMatrix", UniformValue::Mat3(self.normal_matrix().to_cols_array()));
    }

    pub fn apply_clip_plane<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.set_uniform("clipPlane", UniformValue::Vec4(self.clip_plane.to_array()));
        ctx.set_uniform("useClipPlane", self.use_clip_plane.into());
    }

    pub fn apply_light<C: GraphicsContext + ?Sized>(&self, ctx: &mut C, index: usize) {
        let Some(light) = self.lights.get(index) else { return };
        ctx.set_uniform(&format!("lights[{index}].position"), UniformValue::Vec3(light.position));
        ctx.set_uniform(&format!("lights[{index}].diffuse"), UniformValue::Vec4(light.diffuse));
        ctx.set_uniform(&format!("lights[{index}].specular"), UniformValue::Vec4(light.specular));
    }

    pub fn apply_lighting<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.set_uniform("num_lights", UniformValue::Int(self.num_lights as i32));
        for i in 0..self.lights.len() {
            self.apply_light(ctx, i);
        }
        ctx.set_uniform("g_ambient", UniformValue::Vec4(self.ambient));
        ctx.set_uniform("material.specular", UniformValue::Vec4(self.material.specular));
        ctx.set_uniform("material.shininess", UniformValue::Float(self.material.shininess));
    }

    /// Uploads the whole state to the bound program, samplers included.
    pub fn apply<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.set_uniform("colorTex", UniformValue::Int(0));
        ctx.set_uniform("alphaTex", UniformValue::Int(1));
        ctx.set_uniform("containsText", false.into());
        ctx.set_uniform("useColorTex", false.into());
        self.apply_transforms(ctx);
        self.apply_clip_plane(ctx);
        self.apply_lighting(ctx);
    }
}
