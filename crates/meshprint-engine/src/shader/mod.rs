//! Shader program builder.
//!
//! Picks a GLSL dialect for the context, stitches sources from named
//! fragments and links programs with fixed attribute locations.

mod error;
mod format;
mod program;
mod sources;
mod version;

pub use error::{ShaderError, VersionError};
pub use format::{
    format_shader, CLIP_FRAGMENT_PLACEHOLDER, CLIP_VERTEX_PLACEHOLDER, LIGHTING_PLACEHOLDER,
};
pub use program::{compile_stage, link_program, ShaderPrograms, FEEDBACK_VARYINGS};
pub use sources::ShaderSources;
pub use version::{parse_gl_version, GlslVersion};
