//! Glyph metrics and text quad expansion.

mod font_atlas;
mod glyph;

pub use font_atlas::{ascii_charset, FontAtlas, FontLoadError};
pub use glyph::{expand_text, measure_text, Glyph, GlyphMetrics, TextVertex};

#[cfg(test)]
pub(crate) use glyph::tests::FixedMetrics;
