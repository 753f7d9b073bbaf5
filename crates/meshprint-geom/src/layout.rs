//! Vertex layout registry.
//!
//! A [`VertexLayout`] is chosen once per buffer and fixes which attributes every
//! vertex carries, where they sit in the record and how the GPU reads them.
//! Strides are padded so that all layouts are multiples of 16 bytes:
//!
//! | layout                   | position | normal | color/texcoord | pad | stride |
//! |--------------------------|----------|--------|----------------|-----|--------|
//! | `Position`               | 0        | –      | –              | 12  | 16     |
//! | `PositionColor`          | 0        | –      | 12 (4×u8)      | –   | 16     |
//! | `PositionTexCoord`       | 0        | –      | 12 (f32)       | –   | 16     |
//! | `PositionNormal`         | 0        | 12     | –              | –   | 24     |
//! | `PositionNormalColor`    | 0        | 12     | 24 (4×u8)      | 28  | 32     |
//! | `PositionNormalTexCoord` | 0        | 12     | 24 (f32)       | 28  | 32     |
//!
//! Line layouts carry no normal; a pad slot is added whenever "is a line"
//! disagrees with "carries a color or texcoord".

use crate::color::{Rgba, WHITE};

/// Attribute kinds a vertex may carry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Attribute {
    Position,
    Normal,
    Color,
    TexCoord,
}

/// Component type of an attribute as stored in the buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScalarType {
    Float,
    UnsignedByte,
}

impl ScalarType {
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            ScalarType::Float => 4,
            ScalarType::UnsignedByte => 1,
        }
    }
}

/// Placement of one attribute inside a vertex record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeBinding {
    pub attribute: Attribute,
    /// Byte offset from the start of the record.
    pub offset: usize,
    pub components: usize,
    pub scalar: ScalarType,
    /// Integer data is read back as `[0, 1]` floats.
    pub normalized: bool,
}

impl AttributeBinding {
    const fn float(attribute: Attribute, offset: usize, components: usize) -> Self {
        Self { attribute, offset, components, scalar: ScalarType::Float, normalized: false }
    }

    const fn packed_color(offset: usize) -> Self {
        Self {
            attribute: Attribute::Color,
            offset,
            components: 4,
            scalar: ScalarType::UnsignedByte,
            normalized: true,
        }
    }

    /// Size of the attribute data in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.components * self.scalar.size()
    }
}

/// Value the device supplies for the color slot when a layout has no color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ColorDefault {
    /// The layout carries its own color.
    Attribute,
    /// Use the frame's static color.
    Static,
    /// Fixed constant (ramp-colored layouts modulate against white).
    Constant(Rgba),
}

/// Default-value policy for attributes absent from a layout.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayoutDefaults {
    /// `Some` when the layout has no normal.
    pub normal: Option<[f32; 3]>,
    pub color: ColorDefault,
}

/// Normal used for layouts without one.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Which per-vertex color source a record uses. At most one is ever present.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ColorKind {
    None,
    Rgba,
    TexCoord,
}

/// The fixed set of attribute layouts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum VertexLayout {
    Position,
    PositionColor,
    PositionTexCoord,
    PositionNormal,
    PositionNormalColor,
    PositionNormalTexCoord,
}

const POS: AttributeBinding = AttributeBinding::float(Attribute::Position, 0, 3);
const NORM: AttributeBinding = AttributeBinding::float(Attribute::Normal, 12, 3);

const ATTRS_POSITION: [AttributeBinding; 1] = [POS];
const ATTRS_POSITION_COLOR: [AttributeBinding; 2] = [POS, AttributeBinding::packed_color(12)];
const ATTRS_POSITION_TEX: [AttributeBinding; 2] =
    [POS, AttributeBinding::float(Attribute::TexCoord, 12, 1)];
const ATTRS_POSITION_NORMAL: [AttributeBinding; 2] = [POS, NORM];
const ATTRS_POSITION_NORMAL_COLOR: [AttributeBinding; 3] =
    [POS, NORM, AttributeBinding::packed_color(24)];
const ATTRS_POSITION_NORMAL_TEX: [AttributeBinding; 3] =
    [POS, NORM, AttributeBinding::float(Attribute::TexCoord, 24, 1)];

impl VertexLayout {
    pub const ALL: [VertexLayout; 6] = [
        VertexLayout::Position,
        VertexLayout::PositionColor,
        VertexLayout::PositionTexCoord,
        VertexLayout::PositionNormal,
        VertexLayout::PositionNormalColor,
        VertexLayout::PositionNormalTexCoord,
    ];

    /// Resolves the layout for a vertex that does or doesn't carry a normal and
    /// the given color source.
    pub const fn for_attributes(has_normal: bool, color: ColorKind) -> Self {
        match (has_normal, color) {
            (false, ColorKind::None) => VertexLayout::Position,
            (false, ColorKind::Rgba) => VertexLayout::PositionColor,
            (false, ColorKind::TexCoord) => VertexLayout::PositionTexCoord,
            (true, ColorKind::None) => VertexLayout::PositionNormal,
            (true, ColorKind::Rgba) => VertexLayout::PositionNormalColor,
            (true, ColorKind::TexCoord) => VertexLayout::PositionNormalTexCoord,
        }
    }

    /// Attribute bindings in record order.
    pub const fn attributes(self) -> &'static [AttributeBinding] {
        match self {
            VertexLayout::Position => &ATTRS_POSITION,
            VertexLayout::PositionColor => &ATTRS_POSITION_COLOR,
            VertexLayout::PositionTexCoord => &ATTRS_POSITION_TEX,
            VertexLayout::PositionNormal => &ATTRS_POSITION_NORMAL,
            VertexLayout::PositionNormalColor => &ATTRS_POSITION_NORMAL_COLOR,
            VertexLayout::PositionNormalTexCoord => &ATTRS_POSITION_NORMAL_TEX,
        }
    }

    /// Bytes per vertex record, padding included.
    pub const fn stride(self) -> usize {
        match self {
            VertexLayout::Position
            | VertexLayout::PositionColor
            | VertexLayout::PositionTexCoord => 16,
            VertexLayout::PositionNormal => 24,
            VertexLayout::PositionNormalColor | VertexLayout::PositionNormalTexCoord => 32,
        }
    }

    /// Bytes of trailing padding in each record.
    pub fn padding(self) -> usize {
        let used: usize = self.attributes().iter().map(AttributeBinding::size).sum();
        self.stride() - used
    }

    pub fn binding(self, attribute: Attribute) -> Option<AttributeBinding> {
        self.attributes().iter().copied().find(|b| b.attribute == attribute)
    }

    #[inline]
    pub fn has(self, attribute: Attribute) -> bool {
        self.binding(attribute).is_some()
    }

    #[inline]
    pub const fn has_normal(self) -> bool {
        matches!(
            self,
            VertexLayout::PositionNormal
                | VertexLayout::PositionNormalColor
                | VertexLayout::PositionNormalTexCoord
        )
    }

    pub const fn color_kind(self) -> ColorKind {
        match self {
            VertexLayout::Position | VertexLayout::PositionNormal => ColorKind::None,
            VertexLayout::PositionColor | VertexLayout::PositionNormalColor => ColorKind::Rgba,
            VertexLayout::PositionTexCoord | VertexLayout::PositionNormalTexCoord => {
                ColorKind::TexCoord
            }
        }
    }

    /// True if the color slot is byte-packed and read back normalized.
    #[inline]
    pub const fn packs_color(self) -> bool {
        matches!(self.color_kind(), ColorKind::Rgba)
    }

    /// What the device must supply for attributes this layout lacks.
    pub const fn defaults(self) -> LayoutDefaults {
        let normal = if self.has_normal() { None } else { Some(DEFAULT_NORMAL) };
        let color = match self.color_kind() {
            ColorKind::Rgba => ColorDefault::Attribute,
            ColorKind::TexCoord => ColorDefault::Constant(WHITE),
            ColorKind::None => ColorDefault::Static,
        };
        LayoutDefaults { normal, color }
    }
}

/// The builder's padding rule: a pad slot is needed whenever the primitive's
/// line-ness disagrees with whether the vertex carries a color or texcoord.
#[inline]
pub const fn needs_pad_slot(is_line: bool, has_color_or_tex: bool) -> bool {
    is_line != has_color_or_tex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_fit_inside_stride() {
        for layout in VertexLayout::ALL {
            for b in layout.attributes() {
                assert!(b.offset + b.size() <= layout.stride(), "{layout:?} {b:?}");
            }
        }
    }

    #[test]
    fn attributes_do_not_overlap() {
        for layout in VertexLayout::ALL {
            let attrs = layout.attributes();
            for (i, a) in attrs.iter().enumerate() {
                for b in &attrs[i + 1..] {
                    assert!(a.offset + a.size() <= b.offset, "{layout:?}: {a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn pad_rule_matches_strides() {
        for layout in VertexLayout::ALL {
            let is_line = !layout.has_normal();
            let has_attr = layout.color_kind() != ColorKind::None;
            let pad = needs_pad_slot(is_line, has_attr);
            assert_eq!(layout.padding() == 4 || layout.padding() == 12, pad, "{layout:?}");
        }
        assert_eq!(VertexLayout::PositionNormal.padding(), 0);
        assert_eq!(VertexLayout::PositionColor.padding(), 0);
        assert_eq!(VertexLayout::PositionNormalColor.padding(), 4);
    }

    #[test]
    fn position_only_reserves_color_sized_slot() {
        // 12 bytes of position + one 4-byte slot the size of a packed color.
        assert_eq!(VertexLayout::Position.stride(), VertexLayout::PositionColor.stride());
    }

    #[test]
    fn for_attributes_round_trips() {
        for layout in VertexLayout::ALL {
            assert_eq!(
                VertexLayout::for_attributes(layout.has_normal(), layout.color_kind()),
                layout
            );
        }
    }

    #[test]
    fn color_is_packed_and_normalized() {
        let b = VertexLayout::PositionNormalColor.binding(Attribute::Color).unwrap();
        assert_eq!(b.offset, 24);
        assert_eq!(b.scalar, ScalarType::UnsignedByte);
        assert!(b.normalized);
        assert!(VertexLayout::PositionColor.packs_color());
        assert!(!VertexLayout::PositionTexCoord.packs_color());
    }

    #[test]
    fn defaults_follow_missing_attributes() {
        assert_eq!(VertexLayout::Position.defaults().normal, Some(DEFAULT_NORMAL));
        assert_eq!(VertexLayout::PositionNormal.defaults().normal, None);
        assert_eq!(VertexLayout::PositionNormal.defaults().color, ColorDefault::Static);
        assert_eq!(
            VertexLayout::PositionTexCoord.defaults().color,
            ColorDefault::Constant(WHITE)
        );
        assert_eq!(VertexLayout::PositionNormalColor.defaults().color, ColorDefault::Attribute);
    }
}
