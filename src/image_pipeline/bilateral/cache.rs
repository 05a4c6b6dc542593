//! Result cache for filtered base layers.
//!
//! Keyed by a fingerprint of the input image and the filter parameters,
//! bounded by entry count and approximate memory, least-recently-used out.

use std::collections::HashMap;

use crate::image_pipeline::common::image::LinearImage;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const FINGERPRINT_SAMPLES: usize = 4096;

#[inline]
fn fnv1a(hash: &mut u64, bytes: &[u8]) {
    for &b in bytes {
        *hash ^= b as u64;
        *hash = hash.wrapping_mul(FNV_PRIME);
    }
}

/// Hash dimensions, parameter bits and a strided sample of all three planes.
/// Sampling keeps fingerprinting cheap on large frames; a stride collision
/// would need two images identical at every sampled site.
pub fn fingerprint(image: &LinearImage, spatial_sigma: f32, range_sigma: f32) -> u64 {
    let mut hash = FNV_OFFSET;
    fnv1a(&mut hash, &(image.width as u64).to_le_bytes());
    fnv1a(&mut hash, &(image.height as u64).to_le_bytes());
    fnv1a(&mut hash, &spatial_sigma.to_bits().to_le_bytes());
    fnv1a(&mut hash, &range_sigma.to_bits().to_le_bytes());

    let n = image.pixel_count();
    let stride = (n / FINGERPRINT_SAMPLES).max(1);
    for plane in [&image.r, &image.g, &image.b] {
        let mut i = 0;
        while i < n {
            fnv1a(&mut hash, &plane[i].to_bits().to_le_bytes());
            i += stride;
        }
    }
    hash
}

struct CacheEntry {
    image: LinearImage,
    bytes: usize,
    last_used: u64,
}

pub struct FilterCache {
    entries: HashMap<u64, CacheEntry>,
    max_entries: usize,
    max_bytes: usize,
    current_bytes: usize,
    tick: u64,
}

impl FilterCache {
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            max_bytes,
            current_bytes: 0,
            tick: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: u64) -> Option<LinearImage> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(&key).map(|entry| {
            entry.last_used = tick;
            entry.image.clone()
        })
    }

    pub fn insert(&mut self, key: u64, image: LinearImage) {
        let bytes = image.byte_size();
        if self.max_entries == 0 || bytes > self.max_bytes {
            return;
        }
        self.tick += 1;
        if let Some(old) = self.entries.insert(
            key,
            CacheEntry {
                image,
                bytes,
                last_used: self.tick,
            },
        ) {
            self.current_bytes -= old.bytes;
        }
        self.current_bytes += bytes;
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.max_entries || self.current_bytes > self.max_bytes {
            let Some((&oldest, _)) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
            else {
                return;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.current_bytes -= entry.bytes;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_bytes = 0;
    }
}
