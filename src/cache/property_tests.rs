//! Property-Based Tests for the Cache Module
//!
//! Uses proptest to verify counter accounting, round-trip and removal
//! properties across arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::cache::{Cache, Value};
use crate::config::Config;

// == Test Configuration ==
fn test_config() -> Config {
    Config {
        // Budget far above anything the generated ops can reach, so eviction
        // never interferes with the accounting properties.
        max_memory_bytes: 64 * 1024 * 1024,
        shard_count: 8,
        default_ttl: Duration::ZERO,
        cleanup_interval: Duration::from_secs(3600),
    }
}

/// Runs a closure against a fresh cache on a private runtime, then closes it.
fn with_cache(f: impl FnOnce(&Cache)) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let _guard = rt.enter();

    let cache = Cache::new(test_config()).unwrap();
    f(&cache);
    rt.block_on(cache.close()).unwrap();
}

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,32}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,128}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // For any sequence of operations, the hit/miss counters match the number
    // of gets that found or missed a key, and the entry count matches the
    // model's surviving keys.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        with_cache(|cache| {
            let mut model: HashMap<String, String> = HashMap::new();
            let mut expected_hits: u64 = 0;
            let mut expected_misses: u64 = 0;

            for op in &ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key, value.as_str(), None).unwrap();
                        model.insert(key.clone(), value.clone());
                    }
                    CacheOp::Get { key } => {
                        let result = cache.get(key);
                        if model.contains_key(key) {
                            expected_hits += 1;
                            assert!(result.is_some());
                        } else {
                            expected_misses += 1;
                            assert!(result.is_none());
                        }
                    }
                    CacheOp::Delete { key } => {
                        let deleted = cache.delete(key);
                        assert_eq!(deleted, model.remove(key).is_some());
                    }
                }
            }

            let stats = cache.stats();
            assert_eq!(stats.hit_count, expected_hits);
            assert_eq!(stats.miss_count, expected_misses);
            assert_eq!(stats.total_entries as usize, model.len());
        });
    }

    // For any sequence of operations, at quiescence every shard's size
    // counter equals the sum of its entries' sizes and the global counter
    // equals the sum over shards.
    #[test]
    fn prop_size_accounting(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        with_cache(|cache| {
            for op in &ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key, value.as_str(), None).unwrap();
                    }
                    CacheOp::Get { key } => {
                        cache.get(key);
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(key);
                    }
                }
            }

            let recomputed = cache.recomputed_shard_sizes();
            let shard_stats = cache.shard_stats();
            for (stats, expected) in shard_stats.iter().zip(&recomputed) {
                assert_eq!(stats.size, *expected, "shard {} size drift", stats.shard_id);
            }

            let total = cache.inner.total_size.load(Ordering::Relaxed);
            assert_eq!(total, recomputed.iter().sum::<i64>());
            assert!(total >= 0);
        });
    }

    // Storing a pair and reading it back returns the stored value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        with_cache(|cache| {
            cache.set(&key, value.as_str(), None).unwrap();
            assert_eq!(cache.get(&key), Some(Value::from(value.as_str())));
        });
    }

    // Storing V1 then V2 under the same key yields V2, accounted once.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        first in value_strategy(),
        second in value_strategy()
    ) {
        with_cache(|cache| {
            cache.set(&key, first.as_str(), None).unwrap();
            cache.set(&key, second.as_str(), None).unwrap();

            assert_eq!(cache.get(&key), Some(Value::from(second.as_str())));
            assert_eq!(cache.stats().total_entries, 1);
        });
    }

    // After a delete, the key is gone and a second delete reports false.
    #[test]
    fn prop_delete_removes_entry(key in key_strategy(), value in value_strategy()) {
        with_cache(|cache| {
            cache.set(&key, value.as_str(), None).unwrap();

            assert!(cache.delete(&key));
            assert_eq!(cache.get(&key), None);
            assert!(!cache.delete(&key));
            assert_eq!(cache.stats().total_size, 0);
        });
    }

    // The reported hit ratio is hits / (hits + misses), or 0.0 with no
    // operations.
    #[test]
    fn prop_hit_ratio(hits in 0u32..50, misses in 0u32..50) {
        with_cache(|cache| {
            cache.set("present", "value", None).unwrap();

            for _ in 0..hits {
                cache.get("present");
            }
            for _ in 0..misses {
                cache.get("absent");
            }

            let stats = cache.stats();
            let expected = if hits + misses == 0 {
                0.0
            } else {
                f64::from(hits) / f64::from(hits + misses)
            };
            assert!((stats.hit_ratio - expected).abs() < 1e-9);
        });
    }
}
