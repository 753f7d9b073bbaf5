use std::fmt;
use std::num::NonZeroU32;

use meshprint_geom::{Attribute, BufferHandle, PrimitiveKind, ScalarType};

/// Which API family the context belongs to. Selects the shader dialect.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ContextTarget {
    /// Desktop OpenGL (2.0 and later).
    Desktop,
    /// WebGL / OpenGL ES. Always uses the minimal dialect; no capture.
    Web,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Compiled shader object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderHandle(NonZeroU32);

/// Linked (or linking) program object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramHandle(NonZeroU32);

macro_rules! raw_handle {
    ($ty:ident) => {
        impl $ty {
            #[inline]
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            #[inline]
            pub fn get(self) -> u32 {
                self.0.get()
            }
        }
    };
}

raw_handle!(ShaderHandle);
raw_handle!(ProgramHandle);

/// Fixed vertex attribute locations shared by every program.
///
/// Programs bind these names before linking, so switching programs never
/// requires re-specifying attribute state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum AttribSlot {
    Vertex = 0,
    TextVertex = 1,
    Normal = 2,
    Color = 3,
    TexCoord0 = 4,
    TexCoord1 = 5,
}

impl AttribSlot {
    pub const ALL: [AttribSlot; 6] = [
        AttribSlot::Vertex,
        AttribSlot::TextVertex,
        AttribSlot::Normal,
        AttribSlot::Color,
        AttribSlot::TexCoord0,
        AttribSlot::TexCoord1,
    ];

    #[inline]
    pub const fn location(self) -> u32 {
        self as u32
    }

    /// Slot a layout attribute is bound to.
    pub const fn for_attribute(attribute: Attribute) -> Self {
        match attribute {
            Attribute::Position => AttribSlot::Vertex,
            Attribute::Normal => AttribSlot::Normal,
            Attribute::Color => AttribSlot::Color,
            Attribute::TexCoord => AttribSlot::TexCoord0,
        }
    }

    /// Attribute name in shader source.
    pub const fn name(self) -> &'static str {
        match self {
            AttribSlot::Vertex => "vertex",
            AttribSlot::TextVertex => "textVertex",
            AttribSlot::Normal => "normal",
            AttribSlot::Color => "color",
            AttribSlot::TexCoord0 => "texCoord0",
            AttribSlot::TexCoord1 => "texCoord1",
        }
    }
}

/// How an enabled attribute reads from a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttribPointer {
    pub components: usize,
    pub scalar: ScalarType,
    pub normalized: bool,
    pub stride: usize,
    pub offset: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat3([f32; 9]),
    /// Column-major.
    Mat4([f32; 16]),
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Int(v as i32)
    }
}

/// The device API surface the engine needs.
///
/// Calls are synchronous and issued from the thread that owns the context.
/// Handles returned by one context are meaningless to another.
pub trait GraphicsContext {
    // ── queries ──────────────────────────────────────────────────────────

    /// Raw version string as reported by the driver, e.g. `"4.6.0 NVIDIA"`.
    fn version_string(&self) -> String;
    fn target(&self) -> ContextTarget;
    /// True when vertex-stage output can be captured into a buffer.
    fn supports_feedback(&self) -> bool;

    // ── buffers ──────────────────────────────────────────────────────────

    fn create_buffer(&mut self) -> Option<BufferHandle>;
    fn delete_buffer(&mut self, buffer: BufferHandle);
    /// Orphans the current storage so in-flight draws keep the old copy.
    fn invalidate_buffer(&mut self, buffer: BufferHandle);
    /// Replaces the storage with `data`.
    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]);
    /// Replaces the storage with `size` uninitialised bytes.
    fn reserve_buffer(&mut self, buffer: BufferHandle, size: usize);
    /// Blocks until pending writes to `buffer` are done, then copies
    /// `out.len()` bytes starting at `offset`.
    fn read_buffer(&mut self, buffer: BufferHandle, offset: usize, out: &mut [u8]);

    // ── vertex attributes ────────────────────────────────────────────────

    fn enable_attrib(&mut self, slot: AttribSlot);
    fn disable_attrib(&mut self, slot: AttribSlot);
    fn attrib_pointer(&mut self, slot: AttribSlot, buffer: BufferHandle, pointer: AttribPointer);
    /// Value read by a disabled attribute.
    fn attrib_constant(&mut self, slot: AttribSlot, value: [f32; 4]);

    fn draw_arrays(&mut self, kind: PrimitiveKind, first: usize, count: usize);

    // ── programs ─────────────────────────────────────────────────────────

    /// Compiles one stage. On failure the shader object is released and the
    /// compiler's info log is returned.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;
    fn delete_shader(&mut self, shader: ShaderHandle);

    fn create_program(&mut self) -> Option<ProgramHandle>;
    fn bind_attrib_location(&mut self, program: ProgramHandle, slot: AttribSlot);
    /// Interleaved capture of the named vertex outputs, in order.
    fn feedback_varyings(&mut self, program: ProgramHandle, names: &[&str]);
    /// Attaches `shaders` and links. On failure the info log is returned; the
    /// program object still exists.
    fn link_program(&mut self, program: ProgramHandle, shaders: &[ShaderHandle]) -> Result<(), String>;
    fn delete_program(&mut self, program: ProgramHandle);
    fn use_program(&mut self, program: ProgramHandle);
    /// Sets a uniform on the bound program. Unknown names are ignored.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    // ── feedback ─────────────────────────────────────────────────────────

    /// Routes vertex outputs of subsequent draws of `kind` into `buffer`.
    fn begin_feedback(&mut self, buffer: BufferHandle, kind: PrimitiveKind);
    fn end_feedback(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_have_fixed_locations() {
        let locs: Vec<u32> = AttribSlot::ALL.iter().map(|s| s.location()).collect();
        assert_eq!(locs, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(AttribSlot::Vertex.name(), "vertex");
        assert_eq!(AttribSlot::TexCoord0.name(), "texCoord0");
    }

    #[test]
    fn bool_uniforms_are_ints() {
        assert_eq!(UniformValue::from(true), UniformValue::Int(1));
        assert_eq!(UniformValue::from(false), UniformValue::Int(0));
    }
}
