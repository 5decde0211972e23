//! Texture atlases used by the renderable groups
//!
//! Builders here are pure CPU code producing bitmaps plus UV lookup tables.
//! Uploading happens in [`gpu`], deduplication in [`cache`].

pub mod cache;
pub mod dash_texture;
pub mod gpu;
pub mod marker_atlas;
pub mod markers;

pub use cache::{MarkerAtlasState, TextureCache};
pub use dash_texture::{DashEntry, DashTexture, DashTextureBuilder};
pub use gpu::GpuTexture;
pub use marker_atlas::{build_marker_atlas, request_marker_atlas, AtlasPoll, MarkerAtlas, PendingMarkerAtlas};
pub use markers::{MarkerShape, MarkerSpec};

/// Normalized texture box, `(u1, v1)` top-left and `(u2, v2)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UvRect {
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect {
        u1: 0.0,
        v1: 0.0,
        u2: 1.0,
        v2: 1.0,
    };

    pub fn to_array(self) -> [f32; 4] {
        [self.u1, self.v1, self.u2, self.v2]
    }
}
