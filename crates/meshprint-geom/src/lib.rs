//! CPU-side geometry for meshprint.
//!
//! Packs heterogeneous vertex attributes into fixed-stride records keyed by
//! [`VertexLayout`] and primitive kind. Nothing in this crate talks to a GPU;
//! device handles are only owned here and released through a [`ReleaseQueue`].

pub mod buffer;
pub mod builder;
pub mod color;
pub mod drawable;
pub mod handle;
pub mod layout;
pub mod text;
pub mod vertex;

pub use buffer::{GeometryBuffer, PrimitiveKind};
pub use builder::{Builder, Topology};
pub use color::{pack_color, unpack_color, Rgba};
pub use drawable::Drawable;
pub use handle::{BufferHandle, DeviceSlot, ReleaseQueue};
pub use layout::{Attribute, AttributeBinding, ColorDefault, ScalarType, VertexLayout};
pub use text::{TextBuffer, TextEntry};
pub use vertex::{ColorSource, VertexRecord};
