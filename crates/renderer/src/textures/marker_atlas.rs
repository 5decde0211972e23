//! Marker atlas: rasterized glyphs shelf-packed into one RGBA texture.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use futures::channel::oneshot;

use super::dash_texture::round_up;
use super::markers::{rasterize_marker, MarkerBitmap, MarkerSpec};
use super::UvRect;

/// Atlas widths tried by the packer, narrowest first.
pub const ATLAS_CANDIDATE_WIDTHS: [u32; 5] = [128, 256, 512, 1024, 2048];

/// Packed RGBA8 atlas with the UV box of every named glyph
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerAtlas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub entries: BTreeMap<String, UvRect>,
}

impl MarkerAtlas {
    pub fn uv(&self, name: &str) -> Option<UvRect> {
        self.entries.get(name).copied()
    }
}

/// Result of shelf packing at a fixed width.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfLayout {
    pub width: u32,
    pub height: u32,
    /// Top-left corner per input item, in input order.
    pub positions: Vec<(u32, u32)>,
}

impl ShelfLayout {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Pack `sizes` into shelves at a fixed `width`.
///
/// Items are placed tallest first, left to right, opening a new shelf when
/// the next item would overflow the width. Returns `None` if any item is
/// wider than `width`.
pub fn pack_shelves(sizes: &[(u32, u32)], width: u32) -> Option<ShelfLayout> {
    if sizes.iter().any(|&(w, _)| w > width) {
        return None;
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| sizes[b].1.cmp(&sizes[a].1));

    let mut positions = vec![(0, 0); sizes.len()];
    let mut shelf_top = 0;
    let mut shelf_height = 0;
    let mut cursor = 0;

    for i in order {
        let (w, h) = sizes[i];
        if cursor + w > width {
            shelf_top += shelf_height;
            shelf_height = 0;
            cursor = 0;
        }
        positions[i] = (cursor, shelf_top);
        cursor += w;
        shelf_height = shelf_height.max(h);
    }

    Some(ShelfLayout {
        width,
        height: round_up((shelf_top + shelf_height).max(1), 32),
        positions,
    })
}

/// Try every candidate width and keep the layout with the smallest area.
pub fn best_layout(sizes: &[(u32, u32)]) -> Option<ShelfLayout> {
    ATLAS_CANDIDATE_WIDTHS
        .iter()
        .filter_map(|&w| pack_shelves(sizes, w))
        .min_by_key(|layout| layout.area())
}

/// Content key for a set of named marker specs.
pub fn marker_cache_key(markers: &[(String, MarkerSpec)]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    "markers".hash(&mut hasher);
    for (name, spec) in markers {
        name.hash(&mut hasher);
        spec.shape.hash(&mut hasher);
        spec.size.to_bits().hash(&mut hasher);
        spec.border_width.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Rasterize and pack every marker. Glyphs too large for the widest
/// candidate are skipped with a warning.
pub fn build_marker_atlas(markers: &[(String, MarkerSpec)]) -> MarkerAtlas {
    let max_width = ATLAS_CANDIDATE_WIDTHS[ATLAS_CANDIDATE_WIDTHS.len() - 1];
    let bitmaps: Vec<(&String, MarkerBitmap)> = markers
        .iter()
        .filter_map(|(name, spec)| {
            let bitmap = rasterize_marker(spec);
            if bitmap.width > max_width {
                log::warn!(
                    "[MarkerAtlas] Marker {} is {}px wide, larger than the atlas limit",
                    name,
                    bitmap.width
                );
                None
            } else {
                Some((name, bitmap))
            }
        })
        .collect();

    let sizes: Vec<(u32, u32)> = bitmaps.iter().map(|(_, b)| (b.width, b.height)).collect();
    let layout = best_layout(&sizes).unwrap_or(ShelfLayout {
        width: ATLAS_CANDIDATE_WIDTHS[0],
        height: 32,
        positions: vec![],
    });

    let mut pixels = vec![0u8; (layout.width * layout.height * 4) as usize];
    let mut entries = BTreeMap::new();
    for ((name, bitmap), &(x, y)) in bitmaps.iter().zip(&layout.positions) {
        let row_bytes = (bitmap.width * 4) as usize;
        for row in 0..bitmap.height {
            let src = (row * bitmap.width * 4) as usize;
            let dst = (((y + row) * layout.width + x) * 4) as usize;
            pixels[dst..dst + row_bytes].copy_from_slice(&bitmap.pixels[src..src + row_bytes]);
        }
        entries.insert(
            (*name).clone(),
            UvRect {
                u1: x as f32 / layout.width as f32,
                v1: y as f32 / layout.height as f32,
                u2: (x + bitmap.width) as f32 / layout.width as f32,
                v2: (y + bitmap.height) as f32 / layout.height as f32,
            },
        );
    }

    log::debug!(
        "[MarkerAtlas] Packed {} marker(s) into {}x{}",
        entries.len(),
        layout.width,
        layout.height
    );

    MarkerAtlas {
        width: layout.width,
        height: layout.height,
        pixels,
        entries,
    }
}

/// Outcome of polling a pending atlas.
#[derive(Debug)]
pub enum AtlasPoll {
    Pending,
    Ready(MarkerAtlas),
    Cancelled,
}

/// Receiving half of an asynchronous atlas build. Dropping it cancels the
/// build if it has not started yet.
#[derive(Debug)]
pub struct PendingMarkerAtlas {
    key: u64,
    receiver: oneshot::Receiver<MarkerAtlas>,
}

impl PendingMarkerAtlas {
    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn poll(&mut self) -> AtlasPoll {
        match self.receiver.try_recv() {
            Ok(Some(atlas)) => AtlasPoll::Ready(atlas),
            Ok(None) => AtlasPoll::Pending,
            Err(oneshot::Canceled) => AtlasPoll::Cancelled,
        }
    }
}

/// Split an atlas build into a one-shot future (to be driven by an
/// executor) and the handle that receives its result.
pub fn request_marker_atlas(
    markers: Vec<(String, MarkerSpec)>,
) -> (impl std::future::Future<Output = ()>, PendingMarkerAtlas) {
    let (sender, receiver) = oneshot::channel();
    let key = marker_cache_key(&markers);
    let task = async move {
        if sender.is_canceled() {
            log::debug!("[MarkerAtlas] Build cancelled before it started");
            return;
        }
        let atlas = build_marker_atlas(&markers);
        if sender.send(atlas).is_err() {
            log::debug!("[MarkerAtlas] Receiver dropped, discarding atlas");
        }
    };
    (task, PendingMarkerAtlas { key, receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::markers::MarkerShape;

    fn overlaps(a: ((u32, u32), (u32, u32)), b: ((u32, u32), (u32, u32))) -> bool {
        let ((ax, ay), (aw, ah)) = a;
        let ((bx, by), (bw, bh)) = b;
        ax < bx + bw && bx < ax + aw && ay < by + bh && by < ay + ah
    }

    #[test]
    fn test_shelf_packing_advances_cursor() {
        let sizes = [(30, 20), (30, 40), (30, 10), (30, 40), (30, 25)];
        let layout = pack_shelves(&sizes, 128).unwrap();
        for i in 0..sizes.len() {
            for j in i + 1..sizes.len() {
                assert!(
                    !overlaps((layout.positions[i], sizes[i]), (layout.positions[j], sizes[j])),
                    "items {} and {} overlap",
                    i,
                    j
                );
            }
            let (x, y) = layout.positions[i];
            assert!(x + sizes[i].0 <= layout.width);
            assert!(y + sizes[i].1 <= layout.height);
        }
        // Tallest items share the first shelf.
        assert_eq!(layout.positions[1], (0, 0));
        assert_eq!(layout.positions[3], (30, 0));
        assert_eq!(layout.height % 32, 0);
    }

    #[test]
    fn test_too_wide_item_rejects_width() {
        assert!(pack_shelves(&[(200, 10)], 128).is_none());
        let layout = best_layout(&[(200, 10)]).unwrap();
        assert_eq!(layout.width, 256);
    }

    #[test]
    fn test_best_layout_minimizes_area() {
        let sizes = vec![(22, 22); 40];
        let layout = best_layout(&sizes).unwrap();
        for &w in &ATLAS_CANDIDATE_WIDTHS {
            if let Some(other) = pack_shelves(&sizes, w) {
                assert!(layout.area() <= other.area());
            }
        }
    }

    #[test]
    fn test_atlas_entries_point_at_glyphs() {
        let markers = vec![
            ("dot".to_string(), MarkerSpec::new(MarkerShape::Circle, 10.0, 1.0)),
            ("big".to_string(), MarkerSpec::new(MarkerShape::Box, 40.0, 2.0)),
        ];
        let atlas = build_marker_atlas(&markers);
        assert_eq!(atlas.width, 128);
        let big = atlas.uv("big").unwrap();
        assert_eq!((big.u1, big.v1), (0.0, 0.0));

        // Center texel of the big box is filled.
        let cx = ((big.u1 + big.u2) * 0.5 * atlas.width as f32) as u32;
        let cy = ((big.v1 + big.v2) * 0.5 * atlas.height as f32) as u32;
        let i = ((cy * atlas.width + cx) * 4) as usize;
        assert_eq!(atlas.pixels[i + 1], 255);
    }

    #[test]
    fn test_async_request_resolves() {
        let markers = vec![("o".to_string(), MarkerSpec::new(MarkerShape::Circle, 8.0, 1.0))];
        let (task, mut pending) = request_marker_atlas(markers.clone());
        assert!(matches!(pending.poll(), AtlasPoll::Pending));
        futures::executor::block_on(task);
        match pending.poll() {
            AtlasPoll::Ready(atlas) => assert!(atlas.uv("o").is_some()),
            other => panic!("unexpected poll result {:?}", other),
        }
        assert_eq!(pending.key(), marker_cache_key(&markers));
    }

    #[test]
    fn test_dropped_request_is_cancelled() {
        let markers = vec![("o".to_string(), MarkerSpec::new(MarkerShape::Circle, 8.0, 1.0))];
        let (task, pending) = request_marker_atlas(markers);
        drop(pending);
        // Completes without producing anything.
        futures::executor::block_on(task);
    }
}
