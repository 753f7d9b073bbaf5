use anyhow::Context as _;
use meshprint_geom::Drawable;

use crate::coords::Viewport;
use crate::device::{BufferManager, GraphicsContext};
use crate::shader::{ShaderPrograms, ShaderSources};
use crate::text::GlyphMetrics;

use super::frame::Frame;

/// Initialization parameters for the renderer.
#[derive(Debug, Clone)]
pub struct RendererInit {
    /// Shader text. Defaults to the built-in GLSL.
    pub sources: ShaderSources,

    /// Build the capture program when the context supports feedback.
    pub enable_feedback: bool,

    /// Number of point-light slots. Must match the light array declared by
    /// the lighting snippet (3 in the built-in one).
    pub max_lights: usize,
}

impl Default for RendererInit {
    fn default() -> Self {
        Self { sources: ShaderSources::default(), enable_feedback: true, max_lights: 3 }
    }
}

/// Owns a graphics context together with the programs and buffers built on it.
///
/// Per-frame state lives in a [`Frame`] from [`begin_frame`](Self::begin_frame).
pub struct Renderer<C: GraphicsContext> {
    pub(super) ctx: C,
    pub(super) programs: ShaderPrograms,
    pub(super) buffers: BufferManager,
    pub(super) max_lights: usize,
    glyphs: Option<Box<dyn GlyphMetrics>>,
}

impl<C: GraphicsContext> Renderer<C> {
    /// Builds the shader programs and binds the default one.
    ///
    /// Fails when the version string can't be parsed or the default program
    /// doesn't build. A capture program failure only disables capture.
    pub fn new(mut ctx: C, init: RendererInit) -> anyhow::Result<Self> {
        let programs = ShaderPrograms::build(&mut ctx, &init.sources, init.enable_feedback)
            .context("failed to build shader programs")?;
        ctx.use_program(programs.default);

        log::info!(
            "renderer ready: GLSL {}, capture {}",
            programs.version.number(),
            if programs.print.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            ctx,
            programs,
            buffers: BufferManager::new(),
            max_lights: init.max_lights,
            glyphs: None,
        })
    }

    #[inline]
    pub fn context(&self) -> &C {
        &self.ctx
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    #[inline]
    pub fn programs(&self) -> &ShaderPrograms {
        &self.programs
    }

    pub fn supports_capture(&self) -> bool {
        self.programs.print.is_some()
    }

    /// Glyph metrics used to lay out text on upload. Without them text is
    /// skipped.
    pub fn set_glyph_metrics(&mut self, metrics: impl GlyphMetrics + 'static) {
        self.glyphs = Some(Box::new(metrics));
    }

    /// Uploads every non-empty buffer of `drawable` and its text.
    pub fn upload(&mut self, drawable: &mut Drawable) {
        for buf in drawable.buffers_mut() {
            self.buffers.upload(&mut self.ctx, buf);
        }

        let text = drawable.text_mut();
        match self.glyphs.as_deref() {
            Some(metrics) => {
                self.buffers.upload_text(&mut self.ctx, text, metrics);
            }
            None if !text.is_empty() => {
                log::warn!("no glyph metrics set; {} text entries not uploaded", text.len());
            }
            None => {}
        }
    }

    /// Deletes device buffers of dropped drawables.
    pub fn collect_garbage(&mut self) {
        self.buffers.collect_garbage(&mut self.ctx);
    }

    /// Starts a frame (or export) over `viewport` with default render state.
    pub fn begin_frame(&mut self, viewport: Viewport) -> Frame<'_, C> {
        Frame::new(self, viewport)
    }
}

impl<C: GraphicsContext> Drop for Renderer<C> {
    fn drop(&mut self) {
        self.programs.release(&mut self.ctx);
        self.buffers.release(&mut self.ctx);
    }
}
