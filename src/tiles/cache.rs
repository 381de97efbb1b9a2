use super::loader::{TileLoader, TileResponse};
use crate::core::geo::TileCoord;
use crossbeam_channel::Receiver;
use egui::{TextureHandle, TextureId, TextureOptions};
use fxhash::FxHashSet;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Failed downloads are retried this many times per session
const MAX_ATTEMPTS: u8 = 2;

/// Failure counts kept per cached texture slot; the least recently failed
/// tiles are forgotten first
const FAILURES_PER_SLOT: usize = 4;

/// Texture cache in front of a [`TileLoader`]. Lives on the UI thread.
pub struct TileLayer {
    loader: TileLoader,
    responses: Receiver<TileResponse>,
    textures: LruCache<TileCoord, TextureHandle>,
    pending: FxHashSet<TileCoord>,
    attempts: LruCache<TileCoord, u8>,
}

impl TileLayer {
    pub fn new(loader: TileLoader, responses: Receiver<TileResponse>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let failures = NonZeroUsize::new(capacity.get() * FAILURES_PER_SLOT).unwrap_or(NonZeroUsize::MIN);
        Self {
            loader,
            responses,
            textures: LruCache::new(capacity),
            pending: FxHashSet::default(),
            attempts: LruCache::new(failures),
        }
    }

    pub fn attribution(&self) -> &str {
        self.loader.source().attribution()
    }

    /// Uploads every tile that arrived since the last frame. Returns
    /// whether anything new became drawable.
    pub fn poll(&mut self, ctx: &egui::Context) -> bool {
        let mut uploaded = false;
        while let Ok(TileResponse { coord, result }) = self.responses.try_recv() {
            self.pending.remove(&coord);
            match result {
                Ok(image) => {
                    let name = format!("tile_{}_{}_{}", coord.z, coord.x, coord.y);
                    let texture = ctx.load_texture(name, image, TextureOptions::LINEAR);
                    self.textures.put(coord, texture);
                    self.attempts.pop(&coord);
                    uploaded = true;
                }
                Err(_) => match self.attempts.get_mut(&coord) {
                    Some(count) => *count += 1,
                    None => {
                        self.attempts.put(coord, 1);
                    }
                },
            }
        }
        uploaded
    }

    /// Texture for `coord`, requesting it if it is neither cached, in
    /// flight, nor given up on
    pub fn texture_or_request(&mut self, coord: TileCoord) -> Option<TextureId> {
        if let Some(texture) = self.textures.get(&coord) {
            return Some(texture.id());
        }

        let attempts = self.attempts.peek(&coord).copied().unwrap_or(0);
        if attempts < MAX_ATTEMPTS && self.pending.insert(coord) {
            self.loader.fetch(coord);
        }
        None
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn cached_count(&self) -> usize {
        self.textures.len()
    }
}
