use bytemuck::{Pod, Zeroable};

use crate::color::{pack_color, Rgba};
use crate::layout::{ColorKind, VertexLayout};

// ── packed records ───────────────────────────────────────────────────────
//
// One `#[repr(C)]` struct per layout. The byte image of each struct is exactly
// the record stored in a buffer of that layout.

/// `Position`: 16 bytes (`pos: 3×f32`, pad).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub _pad: u32,
}

/// `PositionColor`: 16 bytes (`pos: 3×f32`, `color: 4×u8`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexColor {
    pub position: [f32; 3],
    pub color: [u8; 4],
}

/// `PositionTexCoord`: 16 bytes (`pos: 3×f32`, `tex: f32`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexTex {
    pub position: [f32; 3],
    pub texcoord: f32,
}

/// `PositionNormal`: 24 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexNorm {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// `PositionNormalColor`: 32 bytes (`pos`, `normal`, `color: 4×u8`, pad).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexNormColor {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 4],
    pub _pad: u32,
}

/// `PositionNormalTexCoord`: 32 bytes (`pos`, `normal`, `tex: f32`, pad).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexNormTex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: f32,
    pub _pad: u32,
}

// ── unpacked record ──────────────────────────────────────────────────────

/// Per-vertex color source. Color and ramp coordinate are mutually exclusive.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum ColorSource {
    #[default]
    None,
    Rgba(Rgba),
    /// 1-D color-ramp index.
    TexCoord(f32),
}

impl ColorSource {
    #[inline]
    pub fn kind(&self) -> ColorKind {
        match self {
            ColorSource::None => ColorKind::None,
            ColorSource::Rgba(_) => ColorKind::Rgba,
            ColorSource::TexCoord(_) => ColorKind::TexCoord,
        }
    }
}

/// A vertex before packing.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    pub color: ColorSource,
}

impl VertexRecord {
    #[inline]
    pub fn new(position: [f32; 3]) -> Self {
        Self { position, ..Self::default() }
    }

    #[inline]
    pub fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = Some(normal);
        self
    }

    #[inline]
    pub fn with_color(mut self, rgba: Rgba) -> Self {
        self.color = ColorSource::Rgba(rgba);
        self
    }

    #[inline]
    pub fn with_texcoord(mut self, t: f32) -> Self {
        self.color = ColorSource::TexCoord(t);
        self
    }

    /// The only layout this vertex can be stored in.
    #[inline]
    pub fn layout(&self) -> VertexLayout {
        VertexLayout::for_attributes(self.normal.is_some(), self.color.kind())
    }

    /// Appends the packed record to `out`. Returns `false` (and writes nothing)
    /// if the vertex's attributes don't match `layout`.
    pub fn write_packed(&self, layout: VertexLayout, out: &mut Vec<u8>) -> bool {
        let position = self.position;
        match (layout, self.normal, self.color) {
            (VertexLayout::Position, None, ColorSource::None) => {
                out.extend_from_slice(bytemuck::bytes_of(&Vertex { position, _pad: 0 }));
            }
            (VertexLayout::PositionColor, None, ColorSource::Rgba(c)) => {
                let color = pack_color(c);
                out.extend_from_slice(bytemuck::bytes_of(&VertexColor { position, color }));
            }
            (VertexLayout::PositionTexCoord, None, ColorSource::TexCoord(texcoord)) => {
                out.extend_from_slice(bytemuck::bytes_of(&VertexTex { position, texcoord }));
            }
            (VertexLayout::PositionNormal, Some(normal), ColorSource::None) => {
                out.extend_from_slice(bytemuck::bytes_of(&VertexNorm { position, normal }));
            }
            (VertexLayout::PositionNormalColor, Some(normal), ColorSource::Rgba(c)) => {
                let v = VertexNormColor { position, normal, color: pack_color(c), _pad: 0 };
                out.extend_from_slice(bytemuck::bytes_of(&v));
            }
            (VertexLayout::PositionNormalTexCoord, Some(normal), ColorSource::TexCoord(texcoord)) => {
                let v = VertexNormTex { position, normal, texcoord, _pad: 0 };
                out.extend_from_slice(bytemuck::bytes_of(&v));
            }
            _ => return false,
        }
        true
    }
}
