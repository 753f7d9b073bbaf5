//! Device access.
//!
//! This module is responsible for:
//! - the [`GraphicsContext`] seam every GPU call goes through
//! - moving CPU geometry into device buffers and drawing it ([`BufferManager`])
//! - the OpenGL context over `glow` ([`GlowContext`])
//! - a CPU context standing in for a GL driver in tests ([`HeadlessContext`])
//! - the wgpu vertex layouts and buffers for wgpu hosts

mod buffers;
mod context;
mod glow_context;
mod headless;
mod wgpu_buffers;

pub use buffers::BufferManager;
pub use context::{
    AttribPointer, AttribSlot, ContextTarget, GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage,
    UniformValue,
};
pub use glow_context::{primitive_mode, scalar_type, shader_type, GlowContext};
pub use headless::{AttribState, DrawCall, HeadlessContext, ProgramInfo};
pub use wgpu_buffers::{primitive_topology, vertex_buffer_layout, WgpuBuffers};
