//! Dash pattern texture: every pattern compiled into one horizontal band of
//! a single-channel alpha texture.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use super::UvRect;

/// Texel rows reserved for each pattern.
pub const DASH_ROW_HEIGHT: u32 = 8;
/// Minimum width and height of the dash texture.
pub const MIN_DASH_TEXTURE_SIZE: u32 = 128;
/// Widest dash texture that will be generated.
pub const MAX_DASH_TEXTURE_WIDTH: u32 = 4096;

/// Placement of one pattern inside the texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashEntry {
    /// Sum of all runs, in pixels. One texture row spans exactly this length.
    pub pattern_length: f32,
    pub uv: UvRect,
}

impl DashEntry {
    /// Texture v coordinate through the middle of the pattern's band.
    pub fn row_v(&self) -> f32 {
        (self.uv.v1 + self.uv.v2) * 0.5
    }
}

/// Single-channel alpha bitmap holding every compiled pattern
#[derive(Debug, Clone, PartialEq)]
pub struct DashTexture {
    pub width: u32,
    pub height: u32,
    /// Row-major, one byte per texel, 255 inside a dash.
    pub pixels: Vec<u8>,
    pub entries: BTreeMap<String, DashEntry>,
}

impl DashTexture {
    pub fn entry(&self, key: &str) -> Option<&DashEntry> {
        self.entries.get(key)
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Collects named patterns and compiles them into a [`DashTexture`].
#[derive(Debug, Clone, Default)]
pub struct DashTextureBuilder {
    patterns: BTreeMap<String, Vec<f32>>,
}

impl DashTextureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern of alternating fill/blank run lengths in pixels.
    pub fn with_pattern(mut self, key: impl Into<String>, runs: &[f32]) -> Self {
        self.add_pattern(key, runs);
        self
    }

    pub fn add_pattern(&mut self, key: impl Into<String>, runs: &[f32]) {
        self.patterns.insert(key.into(), runs.to_vec());
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Content key: identical pattern sets share one texture.
    pub fn cache_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        "dash".hash(&mut hasher);
        for (key, runs) in &self.patterns {
            key.hash(&mut hasher);
            runs.len().hash(&mut hasher);
            for r in runs {
                r.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    pub fn build(&self) -> DashTexture {
        let valid: Vec<(&String, &Vec<f32>, f32)> = self
            .patterns
            .iter()
            .filter_map(|(key, runs)| {
                let total: f32 = runs.iter().sum();
                if runs.is_empty() || runs.iter().any(|r| !(*r >= 0.0)) || !(total > 0.0) {
                    log::warn!("[DashTextureBuilder] Skipping invalid dash pattern {}: {:?}", key, runs);
                    None
                } else {
                    Some((key, runs, total))
                }
            })
            .collect();

        let longest = valid.iter().map(|(_, _, t)| *t).fold(0.0f32, f32::max);
        let width = (longest.ceil() as u32)
            .max(MIN_DASH_TEXTURE_SIZE)
            .next_power_of_two()
            .min(MAX_DASH_TEXTURE_WIDTH);
        let height = round_up(
            (valid.len() as u32 * DASH_ROW_HEIGHT).max(MIN_DASH_TEXTURE_SIZE),
            32,
        );

        let mut pixels = vec![0u8; (width * height) as usize];
        let mut entries = BTreeMap::new();

        for (band, (key, runs, total)) in valid.into_iter().enumerate() {
            let top = band as u32 * DASH_ROW_HEIGHT;
            let mut row = vec![0u8; width as usize];
            let mut cumulative = 0.0f32;
            for (i, run) in runs.iter().enumerate() {
                let start = ((cumulative / total) * width as f32).floor() as usize;
                cumulative += run;
                let end = (((cumulative / total) * width as f32).floor() as usize).min(width as usize);
                if i % 2 == 0 {
                    row[start..end].fill(255);
                }
            }
            for y in top..top + DASH_ROW_HEIGHT {
                let offset = (y * width) as usize;
                pixels[offset..offset + width as usize].copy_from_slice(&row);
            }

            entries.insert(
                key.clone(),
                DashEntry {
                    pattern_length: total,
                    uv: UvRect {
                        u1: 0.0,
                        v1: top as f32 / height as f32,
                        u2: 1.0,
                        v2: (top + DASH_ROW_HEIGHT) as f32 / height as f32,
                    },
                },
            );
        }

        log::debug!(
            "[DashTextureBuilder] Built {}x{} dash texture with {} pattern(s)",
            width,
            height,
            entries.len()
        );

        DashTexture {
            width,
            height,
            pixels,
            entries,
        }
    }
}

pub(crate) fn round_up(value: u32, multiple: u32) -> u32 {
    value.div_ceil(multiple) * multiple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_dash_pattern() {
        let texture = DashTextureBuilder::new().with_pattern("a", &[5.0, 5.0]).build();
        let entry = texture.entry("a").unwrap();
        assert_eq!(entry.pattern_length, 10.0);
        assert_eq!(texture.width, 128);
        assert_eq!(texture.height, 128);

        for y in 0..DASH_ROW_HEIGHT {
            for x in 0..64 {
                assert_eq!(texture.alpha_at(x, y), 255);
            }
            for x in 64..128 {
                assert_eq!(texture.alpha_at(x, y), 0);
            }
        }
        assert!(entry.row_v() > 0.0 && entry.row_v() < 8.0 / 128.0);
    }

    #[test]
    fn test_bands_and_width_growth() {
        let texture = DashTextureBuilder::new()
            .with_pattern("long", &[200.0, 50.0, 10.0, 40.0])
            .with_pattern("short", &[1.0, 3.0])
            .build();
        assert_eq!(texture.width, 512);
        let long = texture.entry("long").unwrap();
        let short = texture.entry("short").unwrap();
        assert_eq!(long.pattern_length, 300.0);
        assert!(long.uv.v2 <= short.uv.v1);

        // "short" sits in the second band: first quarter opaque.
        let y = DASH_ROW_HEIGHT + 1;
        assert_eq!(texture.alpha_at(0, y), 255);
        assert_eq!(texture.alpha_at(127, y), 255);
        assert_eq!(texture.alpha_at(128, y), 0);
    }

    #[test]
    fn test_height_rounding() {
        let mut builder = DashTextureBuilder::new();
        for i in 0..20 {
            builder.add_pattern(format!("p{i}"), &[2.0, 2.0]);
        }
        let texture = builder.build();
        assert_eq!(texture.height, 160);
        assert_eq!(texture.height % 32, 0);
    }

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let texture = DashTextureBuilder::new()
            .with_pattern("empty", &[])
            .with_pattern("zero", &[0.0, 0.0])
            .with_pattern("ok", &[3.0, 1.0])
            .build();
        assert!(texture.entry("empty").is_none());
        assert!(texture.entry("zero").is_none());
        assert!(texture.entry("ok").is_some());
    }

    #[test]
    fn test_cache_key_tracks_content() {
        let a = DashTextureBuilder::new().with_pattern("a", &[5.0, 5.0]);
        let b = DashTextureBuilder::new().with_pattern("a", &[5.0, 5.0]);
        let c = DashTextureBuilder::new().with_pattern("a", &[5.0, 6.0]);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }
}
