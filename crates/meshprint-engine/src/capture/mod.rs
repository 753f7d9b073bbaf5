//! Vector-exact capture.
//!
//! A draw is re-issued with the capture program bound and transform feedback
//! routed into a host-readable buffer. The records are read back and clipped
//! analytically against the active clip plane, producing device-space
//! primitives with interpolated color.

mod buffer;
mod clip;
mod vertex;

pub use buffer::CaptureBuffer;
pub use clip::{clip_lines, clip_triangles};
pub use vertex::{ClipVertex, FeedbackVertex};
