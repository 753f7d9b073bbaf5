/// Straight-alpha RGBA color with `f32` channels, nominally in `[0, 1]`.
pub type Rgba = [f32; 4];

/// Opaque white, used as the color default for ramp-colored layouts.
pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

/// Packs one channel into a byte.
///
/// `1.0` and above map to `255`; everything else is `floor(v * 256)` truncated
/// to 8 bits. Negative values and NaN saturate to `0`.
#[inline]
pub fn pack_channel(v: f32) -> u8 {
    if v >= 1.0 {
        255
    } else {
        // f64 multiply keeps the rounding identical to the reference packer.
        (v as f64 * 256.0) as u8
    }
}

/// Packs a color into 4 bytes (R, G, B, A order in memory).
///
/// The result occupies one 4-byte slot in a vertex record and is read back by
/// the GPU as normalized unsigned bytes.
#[inline]
pub fn pack_color(rgba: Rgba) -> [u8; 4] {
    [
        pack_channel(rgba[0]),
        pack_channel(rgba[1]),
        pack_channel(rgba[2]),
        pack_channel(rgba[3]),
    ]
}

/// Inverse of [`pack_color`] as the GPU sees it (normalized bytes).
#[inline]
pub fn unpack_color(packed: [u8; 4]) -> Rgba {
    [
        packed[0] as f32 / 255.0,
        packed[1] as f32 / 255.0,
        packed[2] as f32 / 255.0,
        packed[3] as f32 / 255.0,
    ]
}
