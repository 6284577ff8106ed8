//! Pluggable memory context (spec.md §4.H).
//!
//! `knot_pkt_t` and friends in the original carry an `mm_ctx_t` by value so
//! packet-scoped buffers can come from an arena instead of the global heap.
//! Rust's global allocator already covers the common case, so
//! `MemoryContext` is a thin, cloneable indirection over "give me a buffer of
//! this size" rather than a raw `alloc`/`free` pair — enough to let a caller
//! swap in an arena-backed context for packet-scoped allocations without the
//! core depending on `std::alloc::Allocator` (still unstable).

use std::sync::Arc;

/// Trait object backing a [`MemoryContext`]. Implementors hand out wire
/// buffers for packets and RR vectors for zone loading.
pub trait BufferSource: Send + Sync {
    /// Returns a zero-filled buffer of exactly `size` bytes.
    fn alloc(&self, size: usize) -> Vec<u8>;
}

#[derive(Clone, Default)]
struct GlobalHeap;

impl BufferSource for GlobalHeap {
    fn alloc(&self, size: usize) -> Vec<u8> {
        vec![0u8; size]
    }
}

/// Copied into the owning object (`Packet`, `Zone`) so its lifetime is
/// decoupled from whoever constructed it.
#[derive(Clone)]
pub struct MemoryContext {
    source: Arc<dyn BufferSource>,
}

impl MemoryContext {
    pub fn new(source: Arc<dyn BufferSource>) -> Self {
        MemoryContext { source }
    }

    /// The default context: buffers come from the global allocator.
    pub fn global() -> Self {
        MemoryContext {
            source: Arc::new(GlobalHeap),
        }
    }

    pub fn alloc(&self, size: usize) -> Vec<u8> {
        self.source.alloc(size)
    }
}

impl Default for MemoryContext {
    fn default() -> Self {
        MemoryContext::global()
    }
}

impl std::fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContext").finish_non_exhaustive()
    }
}
