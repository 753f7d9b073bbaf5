/// Viewport size in device pixels.
///
/// Captured vertices are remapped from NDC into this space with the origin at
/// the bottom-left corner (`x_device = x_ndc * w/2 + w/2`, same for y).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    #[inline]
    pub fn half_extent(self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }

    /// NDC `[-1, 1]` to device pixels.
    #[inline]
    pub fn ndc_to_device(self, x: f32, y: f32) -> (f32, f32) {
        let (hw, hh) = self.half_extent();
        (x * hw + hw, y * hh + hh)
    }
}
