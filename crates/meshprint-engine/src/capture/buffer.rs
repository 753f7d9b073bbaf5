use super::vertex::FeedbackVertex;

/// Result of a capture: flat triangle and line lists in device space.
///
/// Lives for one export; a collaborator serializes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureBuffer {
    /// Three vertices per triangle.
    pub triangles: Vec<FeedbackVertex>,
    /// Two vertices per segment.
    pub lines: Vec<FeedbackVertex>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.lines.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len() / 2
    }

    pub fn clear(&mut self) {
        self.triangles.clear();
        self.lines.clear();
    }
}
