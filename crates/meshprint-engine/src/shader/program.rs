use crate::device::{AttribSlot, GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage};

use super::error::ShaderError;
use super::format::format_shader;
use super::sources::ShaderSources;
use super::version::GlslVersion;

/// Vertex outputs recorded by the capture program, interleaved in this order.
pub const FEEDBACK_VARYINGS: [&str; 3] = ["gl_Position", "fColor", "fClipCoord"];

/// Programs built for one context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShaderPrograms {
    pub version: GlslVersion,
    pub default: ProgramHandle,
    /// `None` when capture is unsupported, not requested, or failed to build.
    pub print: Option<ProgramHandle>,
}

impl ShaderPrograms {
    /// Detects the dialect and builds the default program and, if requested
    /// and supported, the capture program.
    ///
    /// A default program failure is returned; a capture program failure is
    /// logged and leaves capture disabled.
    pub fn build<C>(ctx: &mut C, sources: &ShaderSources, enable_feedback: bool) -> Result<Self, ShaderError>
    where
        C: GraphicsContext + ?Sized,
    {
        let target = ctx.target();
        let version = GlslVersion::detect(&ctx.version_string(), target)?;
        log::info!("using GLSL {} ({target:?})", version.number());

        let default = build_program(
            ctx,
            "default",
            &sources.default_vertex,
            &sources.default_fragment,
            &[],
            version,
            sources,
        )?;

        let print = if !enable_feedback {
            None
        } else if target == crate::device::ContextTarget::Web || !ctx.supports_feedback() {
            log::warn!("transform feedback unavailable; vector capture disabled");
            None
        } else {
            match build_program(
                ctx,
                "print",
                &sources.print_vertex,
                &sources.print_fragment,
                &FEEDBACK_VARYINGS,
                version,
                sources,
            ) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("vector capture disabled: {e}");
                    None
                }
            }
        };

        Ok(Self { version, default, print })
    }

    /// Deletes every program. Handles must not be used afterwards.
    pub fn release<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.delete_program(self.default);
        if let Some(p) = self.print {
            ctx.delete_program(p);
        }
    }
}

/// Formats and compiles one stage. The compiler log is logged in full on
/// failure.
pub fn compile_stage<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    stage: ShaderStage,
    source: &str,
    version: GlslVersion,
    snippets: &ShaderSources,
) -> Result<ShaderHandle, ShaderError> {
    let formatted = format_shader(source, stage, version, ctx.target(), snippets);
    ctx.compile_shader(stage, &formatted).map_err(|log| {
        log::error!("failed to compile {stage} shader:\n{log}");
        ShaderError::Compile { stage, log }
    })
}

/// Links `shaders` into a new program with the fixed attribute locations.
///
/// The shader objects are released whether or not linking succeeds. A failed
/// program is deleted.
pub fn link_program<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    name: &'static str,
    shaders: &[ShaderHandle],
    varyings: &[&str],
) -> Result<ProgramHandle, ShaderError> {
    let Some(program) = ctx.create_program() else {
        for &s in shaders {
            ctx.delete_shader(s);
        }
        return Err(ShaderError::Allocation("program"));
    };

    for slot in AttribSlot::ALL {
        ctx.bind_attrib_location(program, slot);
    }
    if !varyings.is_empty() {
        ctx.feedback_varyings(program, varyings);
    }

    let linked = ctx.link_program(program, shaders);
    for &s in shaders {
        ctx.delete_shader(s);
    }

    match linked {
        Ok(()) => {
            log::debug!("linked {name} program {program:?}");
            Ok(program)
        }
        Err(log) => {
            log::error!("failed to link the {name} program:\n{log}");
            ctx.delete_program(program);
            Err(ShaderError::Link { program: name, log })
        }
    }
}

fn build_program<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    name: &'static str,
    vertex: &str,
    fragment: &str,
    varyings: &[&str],
    version: GlslVersion,
    snippets: &ShaderSources,
) -> Result<ProgramHandle, ShaderError> {
    let vs = compile_stage(ctx, ShaderStage::Vertex, vertex, version, snippets)?;
    let fs = match compile_stage(ctx, ShaderStage::Fragment, fragment, version, snippets) {
        Ok(fs) => fs,
        Err(e) => {
            ctx.delete_shader(vs);
            return Err(e);
        }
    };
    link_program(ctx, name, &[vs, fs], varyings)
}
