//! Rendering front end.
//!
//! A [`Renderer`] owns the graphics context, the shader programs and the
//! buffer manager. Everything that used to be global render state (bound
//! program, clip plane, static color, lights) lives in a [`RenderState`] held
//! by a [`Frame`], which scopes it to one frame or export.

mod frame;
mod renderer;
mod state;

pub use frame::Frame;
pub use renderer::{Renderer, RendererInit};
pub use state::{Light, Material, RenderState};
