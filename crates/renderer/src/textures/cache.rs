//! Content-keyed texture cache and the local executor that drives
//! asynchronous marker atlas builds between frames.

use std::collections::HashMap;
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;

use super::marker_atlas::{marker_cache_key, request_marker_atlas, PendingMarkerAtlas};
use super::{DashTexture, DashTextureBuilder, GpuTexture, MarkerAtlas, MarkerSpec};

/// Answer to a marker atlas lookup.
pub enum MarkerAtlasState {
    Ready(Rc<MarkerAtlas>),
    Pending(PendingMarkerAtlas),
}

/// Shares generated textures between groups with identical styling.
///
/// CPU bitmaps and their GPU uploads are both keyed by the hash of the
/// builder input, so a second chart with the same dash patterns or marker
/// styles reuses the first one's texture.
pub struct TextureCache {
    pool: LocalPool,
    dash: HashMap<u64, Rc<DashTexture>>,
    markers: HashMap<u64, Rc<MarkerAtlas>>,
    gpu: HashMap<u64, Rc<GpuTexture>>,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            pool: LocalPool::new(),
            dash: HashMap::new(),
            markers: HashMap::new(),
            gpu: HashMap::new(),
        }
    }

    pub fn dash_texture(&mut self, builder: &DashTextureBuilder) -> (u64, Rc<DashTexture>) {
        let key = builder.cache_key();
        let texture = self
            .dash
            .entry(key)
            .or_insert_with(|| Rc::new(builder.build()))
            .clone();
        (key, texture)
    }

    /// Cached atlas if one exists, otherwise a pending handle whose build
    /// runs on the next [`TextureCache::run_pending`].
    pub fn marker_atlas(&mut self, markers: Vec<(String, MarkerSpec)>) -> MarkerAtlasState {
        let key = marker_cache_key(&markers);
        if let Some(atlas) = self.markers.get(&key) {
            return MarkerAtlasState::Ready(atlas.clone());
        }
        let (task, pending) = request_marker_atlas(markers);
        if let Err(e) = self.pool.spawner().spawn_local(task) {
            log::error!("[TextureCache] Failed to spawn marker atlas build: {:?}", e);
        }
        MarkerAtlasState::Pending(pending)
    }

    /// Record a finished atlas so later requests with the same key hit the cache.
    pub fn store_marker_atlas(&mut self, key: u64, atlas: MarkerAtlas) -> Rc<MarkerAtlas> {
        self.markers
            .entry(key)
            .or_insert_with(|| Rc::new(atlas))
            .clone()
    }

    /// Drive queued atlas builds until none can make progress.
    pub fn run_pending(&mut self) {
        self.pool.run_until_stalled();
    }

    /// GPU texture for `key`, uploading it on first use.
    pub fn gpu_texture<F>(&mut self, key: u64, upload: F) -> Option<Rc<GpuTexture>>
    where
        F: FnOnce() -> chart_canvas_shared::ChartCanvasResult<GpuTexture>,
    {
        if let Some(texture) = self.gpu.get(&key) {
            return Some(texture.clone());
        }
        match upload() {
            Ok(texture) => {
                let texture = Rc::new(texture);
                self.gpu.insert(key, texture.clone());
                Some(texture)
            }
            Err(e) => {
                log::error!("[TextureCache] Texture upload failed: {}", e);
                None
            }
        }
    }

    /// Drop GPU textures no group holds anymore, then the CPU bitmaps that
    /// neither a group nor a surviving GPU texture still refers to.
    pub fn evict_unused(&mut self) {
        let before = (self.gpu.len(), self.dash.len() + self.markers.len());
        self.gpu.retain(|_, texture| Rc::strong_count(texture) > 1);

        let gpu = &self.gpu;
        self.dash
            .retain(|key, texture| Rc::strong_count(texture) > 1 || gpu.contains_key(key));
        self.markers
            .retain(|key, atlas| Rc::strong_count(atlas) > 1 || gpu.contains_key(key));

        let after = (self.gpu.len(), self.dash.len() + self.markers.len());
        if after != before {
            log::debug!(
                "[TextureCache] Evicted {} GPU texture(s) and {} CPU bitmap(s)",
                before.0 - after.0,
                before.1 - after.1
            );
        }
    }
}
