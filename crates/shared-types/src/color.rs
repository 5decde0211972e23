//! RGBA colors as used by the renderable groups

use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
///
/// A per-item color with zero alpha means "no override": the group falls back
/// to its shared color for that item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Unpack a `0xRRGGBBAA` integer.
    pub const fn from_packed(packed: u32) -> Self {
        Self(packed.to_be_bytes())
    }

    pub const fn to_packed(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    pub fn is_transparent(&self) -> bool {
        self.0[3] == 0
    }

    /// Normalized float channels for uniform buffers.
    pub fn to_f32_array(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

impl From<u32> for Rgba {
    fn from(packed: u32) -> Self {
        Self::from_packed(packed)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(c: [u8; 4]) -> Self {
        Self(c)
    }
}
