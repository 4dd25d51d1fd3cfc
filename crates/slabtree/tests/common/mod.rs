//! Shared helpers for slabtree integration tests

#![allow(dead_code)]

use slabtree::{Arena, ArenaConfig};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Small arena so exhaustion paths are reachable
pub fn test_arena() -> Arena {
    init_tracing();
    Arena::new(ArenaConfig::testing()).expect("testing preset is valid")
}

/// Free slot count of every pool, in `ArenaStats` order
pub fn free_counts(arena: &Arena) -> Vec<usize> {
    arena.stats().pools.iter().map(|p| p.free_slots).collect()
}

/// Assert that every slot checked out since `before` has been returned
pub fn assert_conserved(arena: &Arena, before: &[usize]) {
    assert_eq!(free_counts(arena), before, "arena slots leaked");
}
