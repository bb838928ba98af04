// Annotation id allocation shared by every open project

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static PROCESS_IDS: OnceLock<IdAllocator> = OnceLock::new();

/// Monotonic id source. Clones share the same counter, so handing a clone to
/// each `AnnotationStore` keeps ids unique across all of them.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    /// A fresh counter whose first id is 1.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The counter shared by the whole process.
    pub fn process() -> Self {
        PROCESS_IDS.get_or_init(IdAllocator::new).clone()
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Make sure no later `next_id` returns `id` or anything below it.
    pub fn reserve_through(&self, id: u64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::Relaxed);
    }

    /// The id the next call to `next_id` would return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
