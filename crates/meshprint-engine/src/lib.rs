//! meshprint engine crate.
//!
//! Builds version-portable shader programs, uploads and draws the CPU geometry
//! of `meshprint-geom`, and captures what is drawn as clipped device-space
//! primitives for vector export. Every GPU call goes through the
//! [`device::GraphicsContext`] trait.

pub mod capture;
pub mod coords;
pub mod device;
pub mod logging;
pub mod render;
pub mod shader;
pub mod text;

pub use capture::CaptureBuffer;
pub use coords::Viewport;
pub use device::{BufferManager, GlowContext, GraphicsContext, HeadlessContext};
pub use render::{Frame, Renderer, RendererInit};
