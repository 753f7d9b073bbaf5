//! Analytic clipping of captured primitives against one plane.
//!
//! Works on homogeneous clip-space positions. The intersection of an edge
//! `(p, q)` with the plane is `P_p·d_q − P_q·d_p`, correct up to a scale that
//! the perspective divide removes. Colors use the perspective-correct weights
//! `w = d / clip_w`.

use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::coords::Viewport;

use super::vertex::{ClipVertex, FeedbackVertex};

/// Perspective divide followed by the NDC to device remap.
#[inline]
fn to_device(pos: Vec4, viewport: Viewport) -> Vec3 {
    let ndc = pos.xyz() / pos.w;
    let (x, y) = viewport.ndc_to_device(ndc.x, ndc.y);
    Vec3::new(x, y, ndc.z)
}

#[inline]
fn post_transform(v: &ClipVertex, viewport: Viewport) -> FeedbackVertex {
    FeedbackVertex { position: to_device(v.pos(), viewport), color: v.rgba() }
}

/// Point where edge `near`–`far` crosses the plane, as seen from a triangle.
fn triangle_edge_cut(near: &ClipVertex, far: &ClipVertex, viewport: Viewport) -> FeedbackVertex {
    let pos = near.pos() * far.clip_distance - far.pos() * near.clip_distance;
    let (w_near, w_far) = (near.weight(), far.weight());
    let color = (near.rgba() * w_far - far.rgba() * w_near) / (w_far - w_near);
    FeedbackVertex { position: to_device(pos, viewport), color }
}

/// Clips a flat triangle list.
///
/// With `clip_enabled == false` every triangle is emitted as is. Otherwise:
/// all visible, emitted; all hidden, dropped; one hidden, the remaining quad
/// is emitted as two triangles; two hidden, one smaller triangle. Winding is
/// preserved in every case. A trailing partial triangle is ignored.
pub fn clip_triangles(
    verts: &[ClipVertex],
    viewport: Viewport,
    clip_enabled: bool,
    out: &mut Vec<FeedbackVertex>,
) {
    for tri in verts.chunks_exact(3) {
        let visible = tri.iter().filter(|v| v.is_visible()).count();
        if !clip_enabled || visible == 3 {
            out.extend(tri.iter().map(|v| post_transform(v, viewport)));
            continue;
        }
        if visible == 0 {
            continue;
        }

        // Rotate so that a and b share a side and c is alone on the other.
        for i in 0..3 {
            let (a, b, c) = (&tri[i], &tri[(i + 1) % 3], &tri[(i + 2) % 3]);
            if a.is_visible() != b.is_visible() {
                continue;
            }
            let n0 = triangle_edge_cut(a, c, viewport); // on a–c
            let n1 = triangle_edge_cut(b, c, viewport); // on b–c

            if c.is_visible() {
                out.extend([post_transform(c, viewport), n0, n1]);
            } else {
                let (pa, pb) = (post_transform(a, viewport), post_transform(b, viewport));
                out.extend([pa, pb, n1, pa, n1, n0]);
            }
            break;
        }
    }
}

/// Clips a flat segment list.
///
/// A crossing segment is replaced by `[intersection, visible endpoint]`. A
/// trailing lone vertex is ignored.
pub fn clip_lines(
    verts: &[ClipVertex],
    viewport: Viewport,
    clip_enabled: bool,
    out: &mut Vec<FeedbackVertex>,
) {
    for seg in verts.chunks_exact(2) {
        let (p, q) = (&seg[0], &seg[1]);
        if !clip_enabled || (p.is_visible() && q.is_visible()) {
            out.extend([post_transform(p, viewport), post_transform(q, viewport)]);
            continue;
        }
        if !p.is_visible() && !q.is_visible() {
            continue;
        }

        let (inside, outside) = if p.is_visible() { (p, q) } else { (q, p) };
        let pos = inside.pos() * outside.clip_distance - outside.pos() * inside.clip_distance;
        let (w_in, w_out) = (inside.weight(), outside.weight());
        let color = (inside.rgba() * w_out - outside.rgba() * w_in) / (w_out - w_in);

        out.push(FeedbackVertex { position: to_device(pos, viewport), color });
        out.push(post_transform(inside, viewport));
    }
}
