use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use spoofcheck_core::{CapturedImage, DetectedSpoof, DetectionError, SpoofDetector};
use tokio::sync::{Mutex, OnceCell};

/// SHA-256 over orientation, dimensions, colour type and raw pixels.
pub type CacheKey = [u8; 32];

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Compute the cache key identifying an image's content.
pub fn cache_key(image: &CapturedImage) -> CacheKey {
    let pixels = image.pixels();
    let mut hasher = Sha256::new();
    hasher.update([image.orientation().to_exif()]);
    hasher.update(pixels.width().to_le_bytes());
    hasher.update(pixels.height().to_le_bytes());
    hasher.update(format!("{:?}", pixels.color()).as_bytes());
    hasher.update(pixels.as_bytes());

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}

type Slot = Arc<OnceCell<Vec<DetectedSpoof>>>;

struct Slots {
    by_key: HashMap<CacheKey, Slot>,
    order: VecDeque<CacheKey>,
}

/// Memoizes another detector's results by image content.
///
/// At most one call to the inner detector is in flight per key: concurrent
/// callers with the same image wait for the first call and share its result.
/// Failures are not cached. Past `capacity` the oldest completed entry is
/// evicted; entries still in flight are never evicted.
pub struct CachedDetector<D> {
    inner: D,
    capacity: usize,
    slots: Mutex<Slots>,
}

impl<D: SpoofDetector> CachedDetector<D> {
    pub fn new(inner: D) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: D, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            slots: Mutex::new(Slots {
                by_key: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Number of keys currently tracked (completed or in flight).
    pub async fn len(&self) -> usize {
        self.slots.lock().await.by_key.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut slots = self.slots.lock().await;
        slots.by_key.clear();
        slots.order.clear();
    }

    async fn slot(&self, key: CacheKey) -> Slot {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.by_key.get(&key) {
            return Arc::clone(slot);
        }

        // Only completed entries are evicted; in-flight slots may push the
        // map past capacity until they settle.
        while slots.by_key.len() >= self.capacity {
            let Some(pos) = slots.order.iter().position(|k| {
                slots
                    .by_key
                    .get(k)
                    .map_or(true, |slot| slot.initialized())
            }) else {
                break;
            };
            if let Some(oldest) = slots.order.remove(pos) {
                slots.by_key.remove(&oldest);
            }
        }

        let slot: Slot = Arc::new(OnceCell::new());
        slots.by_key.insert(key, Arc::clone(&slot));
        slots.order.push_back(key);
        slot
    }

    /// Drop `key` if it still maps to `slot`.
    async fn forget(&self, key: &CacheKey, slot: &Slot) {
        let mut slots = self.slots.lock().await;
        let same = slots
            .by_key
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot));
        if same {
            slots.by_key.remove(key);
            slots.order.retain(|k| k != key);
        }
    }
}

impl<D: SpoofDetector> SpoofDetector for CachedDetector<D> {
    async fn detect_spoof_devices(
        &self,
        image: &CapturedImage,
    ) -> Result<Vec<DetectedSpoof>, DetectionError> {
        let key = cache_key(image);
        let slot = self.slot(key).await;
        if let Some(hit) = slot.get() {
            tracing::debug!(detections = hit.len(), "spoof detection cache hit");
            return Ok(hit.clone());
        }

        match slot
            .get_or_try_init(|| self.inner.detect_spoof_devices(image))
            .await
        {
            Ok(detections) => Ok(detections.clone()),
            Err(e) => {
                self.forget(&key, &slot).await;
                Err(e)
            }
        }
    }
}
