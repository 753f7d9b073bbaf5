use crate::handle::{BufferHandle, DeviceSlot};

/// A string anchored at a 3-D point in object space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    pub anchor: [f32; 3],
    pub text: String,
}

/// Text records of a drawable.
///
/// Strings stay as text on the CPU side; the device manager expands them into
/// glyph quads at upload time using a glyph-metrics provider.
#[derive(Debug, Default)]
pub struct TextBuffer {
    entries: Vec<TextEntry>,
    /// Pixel size of each entry, as of the last upload.
    extents: Vec<[f32; 2]>,
    device: Option<DeviceSlot>,
    device_count: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_text(&mut self, anchor: [f32; 3], text: impl Into<String>) {
        self.entries.push(TextEntry { anchor, text: text.into() });
    }

    #[inline]
    pub fn entries(&self) -> &[TextEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upper bound on the number of glyphs to expand.
    pub fn char_count(&self) -> usize {
        self.entries.iter().map(|e| e.text.chars().count()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.extents.clear();
        self.device_count = 0;
    }

    /// Pixel `[width, height]` of the first entry reading `text`. `None` for
    /// unknown strings and entries added since the last upload.
    pub fn object_size(&self, text: &str) -> Option<[f32; 2]> {
        self.entries
            .iter()
            .zip(&self.extents)
            .find(|(e, _)| e.text == text)
            .map(|(_, &size)| size)
    }

    /// Records per-entry sizes, in entry order.
    pub fn set_extents(&mut self, extents: Vec<[f32; 2]>) {
        debug_assert_eq!(extents.len(), self.entries.len());
        self.extents = extents;
    }

    #[inline]
    pub fn device_handle(&self) -> Option<BufferHandle> {
        self.device.as_ref().map(DeviceSlot::handle)
    }

    /// Number of glyph vertices in the last upload.
    #[inline]
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    pub fn attach_device(&mut self, slot: DeviceSlot) {
        self.device = Some(slot);
        self.device_count = 0;
    }

    pub fn mark_uploaded(&mut self, vertices: usize) {
        self.device_count = vertices;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_chars_not_bytes() {
        let mut t = TextBuffer::new();
        t.add_text([0.0; 3], "x=1");
        t.add_text([1.0, 0.0, 0.0], "µm");
        assert_eq!(t.len(), 2);
        assert_eq!(t.char_count(), 5);
    }

    #[test]
    fn object_size_follows_the_last_upload() {
        let mut t = TextBuffer::new();
        t.add_text([0.0; 3], "x");
        assert_eq!(t.object_size("x"), None);

        t.set_extents(vec![[8.0, 10.0]]);
        t.add_text([0.0; 3], "yy");
        assert_eq!(t.object_size("x"), Some([8.0, 10.0]));
        assert_eq!(t.object_size("yy"), None);
        assert_eq!(t.object_size("z"), None);

        t.clear();
        assert_eq!(t.object_size("x"), None);
    }

    #[test]
    fn clear_forgets_upload() {
        let mut t = TextBuffer::new();
        t.add_text([0.0; 3], "a");
        t.mark_uploaded(6);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.device_count(), 0);
    }
}
