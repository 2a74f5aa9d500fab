//! Per-actor permission cache
//!
//! Flattened permission sets are cached per actor for a fixed TTL. Entries
//! are filled lazily on the first check after a miss and expire lazily: an
//! expired entry is evicted by the read that notices it, there is no
//! background sweep.
//!
//! ```text
//! Absent ──fill──> Valid(until = filled_at + ttl)
//! Valid  ──invalidate / expiry at read──> Absent
//! ```
//!
//! Fills are guarded by a generation counter. A fill takes a [`FillTicket`]
//! before reading storage and is only inserted if no invalidation happened in
//! between, so a clear-all can never be undone by a miss that was already in
//! flight.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use platform_rbac::ActorId;

use crate::graph::ActorGrants;

#[derive(Debug)]
struct CacheEntry {
    grants: Arc<ActorGrants>,
    filled_at: Instant,
}

/// Snapshot of the cache generation taken before a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(u64);

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from a valid entry
    pub hits: u64,
    /// Lookups that found no valid entry
    pub misses: u64,
    /// Entries currently stored, expired or not
    pub entries: usize,
}

/// Process-wide TTL cache of flattened permission sets.
///
/// Constructed once per engine and shared by reference.
#[derive(Debug)]
pub struct PermissionCache {
    entries: DashMap<ActorId, CacheEntry>,
    ttl: Duration,
    generation: RwLock<u64>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PermissionCache {
    /// Create an empty cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            generation: RwLock::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a valid entry, evicting it if it has expired.
    pub fn get(&self, actor_id: ActorId) -> Option<Arc<ActorGrants>> {
        let lookup = self
            .entries
            .get(&actor_id)
            .map(|entry| (entry.filled_at.elapsed() < self.ttl, entry.grants.clone()));

        match lookup {
            Some((true, grants)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(grants);
            }
            Some((false, _)) => {
                self.entries
                    .remove_if(&actor_id, |_, entry| entry.filled_at.elapsed() >= self.ttl);
            }
            None => {}
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Take a ticket before reading storage for a fill.
    pub fn ticket(&self) -> FillTicket {
        FillTicket(*self.generation.read())
    }

    /// Insert a completed permission set.
    ///
    /// # Returns
    ///
    /// `false` if an invalidation happened since `ticket` was taken; the set
    /// is then discarded.
    pub fn insert(&self, ticket: FillTicket, grants: Arc<ActorGrants>) -> bool {
        let generation = self.generation.read();
        if *generation != ticket.0 {
            return false;
        }
        self.entries.insert(
            grants.actor_id,
            CacheEntry {
                grants,
                filled_at: Instant::now(),
            },
        );
        true
    }

    /// Drop one actor's entry.
    pub fn invalidate(&self, actor_id: ActorId) {
        let mut generation = self.generation.write();
        *generation += 1;
        self.entries.remove(&actor_id);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut generation = self.generation.write();
        *generation += 1;
        self.entries.clear();
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
