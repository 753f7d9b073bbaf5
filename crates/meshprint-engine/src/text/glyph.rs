use bytemuck::{Pod, Zeroable};
use meshprint_geom::TextEntry;

/// Placement of one character in the glyph atlas.
///
/// Distances are in pixels, y up. `tex_x` is already normalized to the atlas
/// width; the glyph occupies the atlas from the top row down `h` pixels.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Glyph {
    pub adv_x: f32,
    pub adv_y: f32,
    /// Pen to left edge of the bitmap.
    pub bear_x: f32,
    /// Baseline to top edge of the bitmap.
    pub bear_y: f32,
    pub w: f32,
    pub h: f32,
    pub tex_x: f32,
}

/// Per-character metrics lookup. Implemented by [`FontAtlas`](super::FontAtlas);
/// hosts with their own atlas implement it directly.
pub trait GlyphMetrics {
    fn glyph(&self, c: char) -> Glyph;
    /// Atlas `(width, height)` in pixels.
    fn atlas_size(&self) -> (f32, f32);
}

/// One vertex of a glyph quad (32 bytes).
///
/// Every vertex of a string carries the string's 3-D anchor; the shader adds
/// the pixel offset after projection so text stays screen-aligned.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
pub struct TextVertex {
    pub anchor: [f32; 3],
    pub offset: [f32; 2],
    pub texcoord: [f32; 2],
    pub _pad: f32,
}

impl TextVertex {
    pub const STRIDE: usize = size_of::<TextVertex>();
    pub const OFFSET_OFFSET: usize = 12;
    pub const TEXCOORD_OFFSET: usize = 20;
}

/// Walks the pen over `text`, calling `visit(left, top, glyph)` for every
/// glyph with area. The pen advances for every character.
fn place_glyphs(text: &str, metrics: &dyn GlyphMetrics, mut visit: impl FnMut(f32, f32, &Glyph)) {
    let (mut x, mut y) = (0.0f32, 0.0f32);
    for c in text.chars() {
        let g = metrics.glyph(c);
        let (left, top) = (x + g.bear_x, y + g.bear_y);
        x += g.adv_x;
        y += g.adv_y;
        if g.w != 0.0 && g.h != 0.0 {
            visit(left, top, &g);
        }
    }
}

/// Expands strings into 6 vertices per visible glyph.
///
/// Glyphs with zero width or height (spaces) produce no quad.
pub fn expand_text(entries: &[TextEntry], metrics: &dyn GlyphMetrics) -> Vec<TextVertex> {
    let (tex_w, tex_h) = metrics.atlas_size();
    let mut out = Vec::new();

    for e in entries {
        place_glyphs(&e.text, metrics, |left, top, g| {
            let right = left + g.w;
            let bottom = top - g.h;
            let (u0, u1, v1) = (g.tex_x, g.tex_x + g.w / tex_w, g.h / tex_h);
            let vtx = |ox: f32, oy: f32, u: f32, v: f32| TextVertex {
                anchor: e.anchor,
                offset: [ox, oy],
                texcoord: [u, v],
                _pad: 0.0,
            };
            out.extend([
                vtx(left, top, u0, 0.0),
                vtx(right, top, u1, 0.0),
                vtx(left, bottom, u0, v1),
                vtx(right, top, u1, 0.0),
                vtx(left, bottom, u0, v1),
                vtx(right, bottom, u1, v1),
            ]);
        });
    }
    out
}

/// Pixel `[width, height]` of the box around the glyph quads of `text`.
/// Zero for strings with nothing visible.
pub fn measure_text(text: &str, metrics: &dyn GlyphMetrics) -> [f32; 2] {
    let mut bounds: Option<[f32; 4]> = None;
    place_glyphs(text, metrics, |left, top, g| {
        let [x0, y0, x1, y1] = bounds.get_or_insert([left, top - g.h, left + g.w, top]);
        *x0 = x0.min(left);
        *y0 = y0.min(top - g.h);
        *x1 = x1.max(left + g.w);
        *y1 = y1.max(top);
    });
    bounds.map_or([0.0, 0.0], |[x0, y0, x1, y1]| [x1 - x0, y1 - y0])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Monospace metrics: every glyph 8×10 with advance 10, spaces empty.
    pub(crate) struct FixedMetrics;

    impl GlyphMetrics for FixedMetrics {
        fn glyph(&self, c: char) -> Glyph {
            let (w, h) = if c == ' ' { (0.0, 0.0) } else { (8.0, 10.0) };
            Glyph { adv_x: 10.0, adv_y: 0.0, bear_x: 1.0, bear_y: 9.0, w, h, tex_x: 0.25 }
        }

        fn atlas_size(&self) -> (f32, f32) {
            (64.0, 20.0)
        }
    }

    fn entry(text: &str) -> TextEntry {
        TextEntry { anchor: [1.0, 2.0, 3.0], text: text.into() }
    }

    #[test]
    fn stride_is_32_bytes() {
        assert_eq!(TextVertex::STRIDE, 32);
    }

    #[test]
    fn six_vertices_per_visible_glyph() {
        let v = expand_text(&[entry("ab c")], &FixedMetrics);
        assert_eq!(v.len(), 3 * 6);
        assert!(v.iter().all(|t| t.anchor == [1.0, 2.0, 3.0]));
    }

    #[test]
    fn pen_advances_over_skipped_glyphs() {
        let v = expand_text(&[entry("a c")], &FixedMetrics);
        // Second visible glyph starts two advances in.
        assert_eq!(v[6].offset, [21.0, 9.0]);
    }

    #[test]
    fn quad_corners_and_texcoords() {
        let v = expand_text(&[entry("a")], &FixedMetrics);
        let corners: Vec<[f32; 2]> = v.iter().map(|t| t.offset).collect();
        assert_eq!(
            corners,
            vec![[1.0, 9.0], [9.0, 9.0], [1.0, -1.0], [9.0, 9.0], [1.0, -1.0], [9.0, -1.0]]
        );
        assert_eq!(v[5].texcoord, [0.25 + 8.0 / 64.0, 10.0 / 20.0]);
        assert_eq!(v[0].texcoord, [0.25, 0.0]);
    }

    #[test]
    fn measures_the_quad_box() {
        // Three glyphs: left edge 1, right edge 2 * 10 + 1 + 8.
        assert_eq!(measure_text("abc", &FixedMetrics), [28.0, 10.0]);
        // Trailing spaces add no area.
        assert_eq!(measure_text("a  ", &FixedMetrics), [8.0, 10.0]);
        assert_eq!(measure_text("   ", &FixedMetrics), [0.0, 0.0]);
        assert_eq!(measure_text("", &FixedMetrics), [0.0, 0.0]);
    }

    #[test]
    fn each_string_restarts_the_pen() {
        let v = expand_text(&[entry("a"), entry("b")], &FixedMetrics);
        assert_eq!(v[0].offset, v[6].offset);
    }
}
