use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// One transform-feedback record (36 bytes, interleaved).
///
/// Layout matches the capture program's varyings: `gl_Position`, `fColor`,
/// `fClipCoord`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
pub struct ClipVertex {
    /// Homogeneous clip-space position.
    pub position: [f32; 4],
    pub color: [f32; 4],
    /// Signed eye-space distance to the clip plane; `>= 0` is visible.
    pub clip_distance: f32,
}

impl ClipVertex {
    pub const SIZE: usize = size_of::<ClipVertex>();

    #[inline]
    pub fn new(position: [f32; 4], color: [f32; 4], clip_distance: f32) -> Self {
        Self { position, color, clip_distance }
    }

    #[inline]
    pub fn pos(&self) -> Vec4 {
        Vec4::from_array(self.position)
    }

    #[inline]
    pub fn rgba(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.clip_distance >= 0.0
    }

    /// Perspective-correct interpolation weight.
    #[inline]
    pub(crate) fn weight(&self) -> f32 {
        self.clip_distance / self.position[3]
    }
}

/// A captured vertex in device space.
///
/// `position.xy` are viewport pixels (origin bottom-left), `position.z` is NDC
/// depth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FeedbackVertex {
    pub position: Vec3,
    pub color: Vec4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_36_bytes() {
        assert_eq!(ClipVertex::SIZE, 36);
    }

    #[test]
    fn zero_distance_is_visible() {
        assert!(ClipVertex::new([0.0, 0.0, 0.0, 1.0], [1.0; 4], 0.0).is_visible());
        assert!(!ClipVertex::new([0.0, 0.0, 0.0, 1.0], [1.0; 4], -1e-6).is_visible());
    }
}
