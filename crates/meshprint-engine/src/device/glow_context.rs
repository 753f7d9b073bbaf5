//! OpenGL implementation of [`GraphicsContext`] over `glow`.
//!
//! Every method issues GL calls. The wrapped context must stay current on the
//! calling thread for as long as the [`GlowContext`] is used; that is the
//! invariant behind each `unsafe` block below.

use std::collections::HashMap;

use glow::HasContext;
use meshprint_geom::{BufferHandle, PrimitiveKind, ScalarType};

use super::context::{
    AttribPointer, AttribSlot, ContextTarget, GraphicsContext, ProgramHandle, ShaderHandle,
    ShaderStage, UniformValue,
};

pub const fn primitive_mode(kind: PrimitiveKind) -> u32 {
    match kind {
        PrimitiveKind::Lines => glow::LINES,
        PrimitiveKind::Triangles => glow::TRIANGLES,
    }
}

pub const fn scalar_type(scalar: ScalarType) -> u32 {
    match scalar {
        ScalarType::Float => glow::FLOAT,
        ScalarType::UnsignedByte => glow::UNSIGNED_BYTE,
    }
}

pub const fn shader_type(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

/// Sizes and offsets past `i32::MAX` saturate; GL rejects them anyway.
#[inline]
fn gl_int(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// GL objects keyed by the nonzero ids handed out to the engine.
#[derive(Debug)]
struct Objects<T> {
    next: u32,
    live: HashMap<u32, T>,
}

impl<T> Default for Objects<T> {
    fn default() -> Self {
        Self { next: 0, live: HashMap::new() }
    }
}

impl<T: Copy> Objects<T> {
    /// `None` once the id space is exhausted.
    fn insert(&mut self, object: T) -> Option<u32> {
        self.next = self.next.checked_add(1)?;
        self.live.insert(self.next, object);
        Some(self.next)
    }

    fn get(&self, id: u32) -> Option<T> {
        self.live.get(&id).copied()
    }

    fn remove(&mut self, id: u32) -> Option<T> {
        self.live.remove(&id)
    }

    fn len(&self) -> usize {
        self.live.len()
    }
}

/// A GL (or WebGL / GLES) context driven through `glow`.
///
/// Creates and binds a vertex array object on 3.0+ contexts, which core
/// profiles need before any attribute call. Feedback is reported on desktop
/// 3.0+ only.
pub struct GlowContext<G: HasContext = glow::Context> {
    gl: G,
    target: ContextTarget,
    version: String,
    feedback: bool,
    vao: Option<G::VertexArray>,

    buffers: Objects<G::Buffer>,
    shaders: Objects<G::Shader>,
    programs: Objects<G::Program>,
    current: Option<G::Program>,
}

impl<G: HasContext> GlowContext<G> {
    pub fn new(gl: G, target: ContextTarget) -> Self {
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        let major = gl.version().major;
        let feedback = target == ContextTarget::Desktop && major >= 3;

        let vao = if major >= 3 {
            match unsafe { gl.create_vertex_array() } {
                Ok(vao) => {
                    unsafe { gl.bind_vertex_array(Some(vao)) };
                    Some(vao)
                }
                Err(e) => {
                    log::warn!("vertex array creation failed: {e}");
                    None
                }
            }
        } else {
            None
        };

        log::info!("GL context: {version} ({target:?}), feedback {}", if feedback { "on" } else { "off" });

        Self {
            gl,
            target,
            version,
            feedback,
            vao,
            buffers: Objects::default(),
            shaders: Objects::default(),
            programs: Objects::default(),
            current: None,
        }
    }

    #[inline]
    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Binds `buffer` to `ARRAY_BUFFER`. False for unknown handles.
    fn bind_array(&self, buffer: BufferHandle) -> bool {
        let Some(b) = self.buffers.get(buffer.get()) else {
            log::warn!("unknown buffer {buffer:?}");
            return false;
        };
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(b)) };
        true
    }
}

impl<G: HasContext> GraphicsContext for GlowContext<G> {
    fn version_string(&self) -> String {
        self.version.clone()
    }

    fn target(&self) -> ContextTarget {
        self.target
    }

    fn supports_feedback(&self) -> bool {
        self.feedback
    }

    fn create_buffer(&mut self) -> Option<BufferHandle> {
        let buffer = match unsafe { self.gl.create_buffer() } {
            Ok(b) => b,
            Err(e) => {
                log::warn!("glGenBuffers failed: {e}");
                return None;
            }
        };
        match self.buffers.insert(buffer).and_then(BufferHandle::new) {
            Some(h) => Some(h),
            None => {
                unsafe { self.gl.delete_buffer(buffer) };
                None
            }
        }
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.remove(buffer.get()) {
            Some(b) => unsafe { self.gl.delete_buffer(b) },
            None => log::warn!("delete of unknown buffer {buffer:?}"),
        }
    }

    fn invalidate_buffer(&mut self, buffer: BufferHandle) {
        if self.bind_array(buffer) {
            unsafe { self.gl.buffer_data_size(glow::ARRAY_BUFFER, 0, glow::STATIC_DRAW) };
        }
    }

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) {
        if self.bind_array(buffer) {
            unsafe { self.gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW) };
        }
    }

    fn reserve_buffer(&mut self, buffer: BufferHandle, size: usize) {
        if self.bind_array(buffer) {
            unsafe { self.gl.buffer_data_size(glow::ARRAY_BUFFER, gl_int(size), glow::STATIC_READ) };
        }
    }

    fn read_buffer(&mut self, buffer: BufferHandle, offset: usize, out: &mut [u8]) {
        // glGetBufferSubData waits for the writes that feed it.
        if self.bind_array(buffer) {
            unsafe { self.gl.get_buffer_sub_data(glow::ARRAY_BUFFER, gl_int(offset), out) };
        }
    }

    fn enable_attrib(&mut self, slot: AttribSlot) {
        unsafe { self.gl.enable_vertex_attrib_array(slot.location()) };
    }

    fn disable_attrib(&mut self, slot: AttribSlot) {
        unsafe { self.gl.disable_vertex_attrib_array(slot.location()) };
    }

    fn attrib_pointer(&mut self, slot: AttribSlot, buffer: BufferHandle, p: AttribPointer) {
        if !self.bind_array(buffer) {
            return;
        }
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                slot.location(),
                gl_int(p.components),
                scalar_type(p.scalar),
                p.normalized,
                gl_int(p.stride),
                gl_int(p.offset),
            );
        }
    }

    fn attrib_constant(&mut self, slot: AttribSlot, [x, y, z, w]: [f32; 4]) {
        unsafe { self.gl.vertex_attrib_4_f32(slot.location(), x, y, z, w) };
    }

    fn draw_arrays(&mut self, kind: PrimitiveKind, first: usize, count: usize) {
        unsafe { self.gl.draw_arrays(primitive_mode(kind), gl_int(first), gl_int(count)) };
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        let shader = unsafe {
            let shader = self.gl.create_shader(shader_type(stage))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            shader
        };

        match self.shaders.insert(shader).and_then(ShaderHandle::new) {
            Some(h) => Ok(h),
            None => {
                unsafe { self.gl.delete_shader(shader) };
                Err("shader id overflow".to_owned())
            }
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        if let Some(s) = self.shaders.remove(shader.get()) {
            unsafe { self.gl.delete_shader(s) };
        }
    }

    fn create_program(&mut self) -> Option<ProgramHandle> {
        let program = match unsafe { self.gl.create_program() } {
            Ok(p) => p,
            Err(e) => {
                log::warn!("glCreateProgram failed: {e}");
                return None;
            }
        };
        match self.programs.insert(program).and_then(ProgramHandle::new) {
            Some(h) => Some(h),
            None => {
                unsafe { self.gl.delete_program(program) };
                None
            }
        }
    }

    fn bind_attrib_location(&mut self, program: ProgramHandle, slot: AttribSlot) {
        if let Some(p) = self.programs.get(program.get()) {
            unsafe { self.gl.bind_attrib_location(p, slot.location(), slot.name()) };
        }
    }

    fn feedback_varyings(&mut self, program: ProgramHandle, names: &[&str]) {
        if let Some(p) = self.programs.get(program.get()) {
            unsafe { self.gl.transform_feedback_varyings(p, names, glow::INTERLEAVED_ATTRIBS) };
        }
    }

    fn link_program(&mut self, program: ProgramHandle, shaders: &[ShaderHandle]) -> Result<(), String> {
        let p = self.programs.get(program.get()).ok_or("unknown program")?;
        let attached = shaders
            .iter()
            .map(|s| self.shaders.get(s.get()).ok_or_else(|| format!("attached shader {s:?} does not exist")))
            .collect::<Result<Vec<_>, _>>()?;

        unsafe {
            for &s in &attached {
                self.gl.attach_shader(p, s);
            }
            self.gl.link_program(p);
            for &s in &attached {
                self.gl.detach_shader(p, s);
            }
            if self.gl.get_program_link_status(p) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(p))
            }
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        let Some(p) = self.programs.remove(program.get()) else { return };
        if self.current == Some(p) {
            self.current = None;
        }
        unsafe { self.gl.delete_program(p) };
    }

    fn use_program(&mut self, program: ProgramHandle) {
        let Some(p) = self.programs.get(program.get()) else {
            log::warn!("use of unknown program {program:?}");
            return;
        };
        unsafe { self.gl.use_program(Some(p)) };
        self.current = Some(p);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(p) = self.current else { return };
        let Some(loc) = (unsafe { self.gl.get_uniform_location(p, name) }) else { return };
        let loc = Some(&loc);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(loc, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, v),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32_slice(loc, &v),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32_slice(loc, &v),
                UniformValue::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(loc, false, &m),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(loc, false, &m),
            }
        }
    }

    fn begin_feedback(&mut self, buffer: BufferHandle, kind: PrimitiveKind) {
        let Some(b) = self.buffers.get(buffer.get()) else {
            log::warn!("feedback into unknown buffer {buffer:?}");
            return;
        };
        unsafe {
            self.gl.bind_buffer_base(glow::TRANSFORM_FEEDBACK_BUFFER, 0, Some(b));
            self.gl.begin_transform_feedback(primitive_mode(kind));
        }
    }

    fn end_feedback(&mut self) {
        unsafe {
            self.gl.end_transform_feedback();
            self.gl.bind_buffer_base(glow::TRANSFORM_FEEDBACK_BUFFER, 0, None);
        }
    }
}

impl<G: HasContext> Drop for GlowContext<G> {
    fn drop(&mut self) {
        if !self.buffers.live.is_empty() {
            log::debug!("{} GL buffers still live at context drop", self.buffers.len());
        }
        if let Some(vao) = self.vao.take() {
            unsafe { self.gl.delete_vertex_array(vao) };
        }
    }
}
