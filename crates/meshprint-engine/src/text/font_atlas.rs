use std::collections::HashMap;

use super::glyph::{Glyph, GlyphMetrics};

/// Error returned when font bytes can't be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// Empty pixels between glyphs, left of the first one and below the tallest.
/// Glyphs start at the top row, where the text quads sample from.
const GLYPH_PADDING: usize = 1;

/// Printable ASCII, the default character set.
pub fn ascii_charset() -> impl Iterator<Item = char> {
    ' '..='~'
}

/// A rasterized glyph before packing.
#[derive(Debug, Clone)]
struct RasterGlyph {
    c: char,
    metrics: fontdue::Metrics,
    coverage: Vec<u8>,
}

/// Single-row glyph atlas rasterized with `fontdue`.
///
/// Holds an 8-bit coverage bitmap for upload to the text alpha texture and the
/// per-character metrics the text expansion needs.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    px: f32,
    width: usize,
    height: usize,
    bitmap: Vec<u8>,
    glyphs: HashMap<char, Glyph>,
}

impl FontAtlas {
    /// Parses a TrueType/OpenType font and rasterizes `charset` at `px`.
    pub fn from_bytes(
        bytes: &[u8],
        px: f32,
        charset: impl IntoIterator<Item = char>,
    ) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        Ok(Self::from_font(&font, px, charset))
    }

    pub fn from_font(font: &fontdue::Font, px: f32, charset: impl IntoIterator<Item = char>) -> Self {
        let rasters = charset
            .into_iter()
            .map(|c| {
                let (metrics, coverage) = font.rasterize(c, px);
                RasterGlyph { c, metrics, coverage }
            })
            .collect();
        Self::pack(px, rasters)
    }

    fn pack(px: f32, rasters: Vec<RasterGlyph>) -> Self {
        let width = GLYPH_PADDING
            + rasters.iter().map(|g| g.metrics.width + GLYPH_PADDING).sum::<usize>();
        let height = rasters.iter().map(|g| g.metrics.height).max().unwrap_or(0) + GLYPH_PADDING;

        let mut bitmap = vec![0u8; width * height];
        let mut glyphs = HashMap::with_capacity(rasters.len());
        let mut cursor = GLYPH_PADDING;

        for g in &rasters {
            let m = &g.metrics;
            for row in 0..m.height {
                let src = &g.coverage[row * m.width..(row + 1) * m.width];
                let dst = row * width + cursor;
                bitmap[dst..dst + m.width].copy_from_slice(src);
            }
            glyphs.insert(
                g.c,
                Glyph {
                    adv_x: m.advance_width,
                    adv_y: m.advance_height,
                    bear_x: m.xmin as f32,
                    bear_y: (m.ymin + m.height as i32) as f32,
                    w: m.width as f32,
                    h: m.height as f32,
                    tex_x: cursor as f32 / width as f32,
                },
            );
            cursor += m.width + GLYPH_PADDING;
        }

        log::debug!("glyph atlas: {} glyphs at {px}px, {width}x{height}", glyphs.len());
        Self { px, width, height, bitmap, glyphs }
    }

    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.px
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major coverage, `width * height` bytes.
    #[inline]
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }
}

impl GlyphMetrics for FontAtlas {
    /// Unknown characters render as nothing and don't advance the pen.
    fn glyph(&self, c: char) -> Glyph {
        self.glyphs.get(&c).copied().unwrap_or_default()
    }

    fn atlas_size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }
}
