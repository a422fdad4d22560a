// Copyright (c) 2025 - Cowboy AI, Inc.
//! Aggregate id allocation

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of new aggregate ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Time-ordered UUID v7 ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}

/// Deterministic ids `prefix + 1`, `prefix + 2`, ... for tests
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    prefix: u128,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids in the high bits' namespace `prefix`
    pub fn with_prefix(prefix: u64) -> Self {
        Self {
            prefix: u128::from(prefix) << 64,
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Uuid::from_u128(self.prefix | u128::from(n))
    }
}
