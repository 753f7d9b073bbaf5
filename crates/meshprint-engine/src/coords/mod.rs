//! Device-space coordinates.
//!
//! Captured geometry is reported in viewport pixels with the origin at the
//! bottom-left corner, +X right, +Y up.

mod viewport;

pub use viewport::Viewport;
