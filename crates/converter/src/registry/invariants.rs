use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use transit_types::Value;

use super::test_fixtures::{CountingBulk, Zoo, counting, returning};
use crate::converter::{Converted, Converter};
use crate::error::ConvertError;
use crate::fallback::ToStringFallback;
use crate::statistics::StatisticsSnapshot;

/// Invariant: a registration replaces a cached miss marker for its pair.
pub(crate) fn inv_miss_marker_replaced_by_registration() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let rex = zoo.dog("rex");

	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), None);
	assert_eq!(registry.miss_count(), 1);

	let tag = zoo.tag("t-1");
	registry.register(&zoo.dog, &zoo.tag, returning(tag.clone())).unwrap();
	assert_eq!(registry.miss_count(), 0);
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), Some(tag));
}

#[cfg_attr(test, test)]
pub(crate) fn test_miss_marker_replaced_by_registration() {
	inv_miss_marker_replaced_by_registration();
}

/// Invariant: the to-string fallback MUST NOT be promoted, even when asked to.
pub(crate) fn inv_to_string_never_promoted() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	registry.register_fallback(Arc::new(ToStringFallback::new(&zoo.types)), true);

	let out = registry
		.convert(zoo.types.string(), None, Some(&zoo.dog("rex")))
		.unwrap();
	assert_eq!(out.as_ref().and_then(Value::as_str), Some("rex"));
	assert!(registry.list_all_pairs().is_empty());
	assert!(registry.lookup(&zoo.dog, zoo.types.string()).unwrap().is_none());
}

#[cfg_attr(test, test)]
pub(crate) fn test_to_string_never_promoted() {
	inv_to_string_never_promoted();
}

/// Invariant: concurrent fallback registrations MUST all land in the chain.
pub(crate) fn inv_fallback_chain_no_lost_updates() {
	const THREADS: usize = 8;
	const PER_THREAD: usize = 50;

	let zoo = Zoo::new();
	let registry = zoo.registry();
	let before = registry.fallback_count();

	thread::scope(|s| {
		for _ in 0..THREADS {
			s.spawn(|| {
				for _ in 0..PER_THREAD {
					registry.register_fallback(returning(Value::Int(0)), false);
				}
			});
		}
	});

	assert_eq!(registry.fallback_count(), before + THREADS * PER_THREAD);
}

#[cfg_attr(test, test)]
pub(crate) fn test_fallback_chain_no_lost_updates() {
	inv_fallback_chain_no_lost_updates();
}

/// Invariant: racing promotions of one pair converge on the same converter and never
/// displace a registered one.
pub(crate) fn inv_concurrent_promotion_idempotent() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let tag = zoo.tag("promoted");
	let fallback = returning(tag.clone());
	registry.register_fallback(fallback.clone(), true);

	let registered = returning(zoo.tag("registered"));
	registry.register(&zoo.tag, zoo.types.string(), registered.clone()).unwrap();

	thread::scope(|s| {
		for _ in 0..8 {
			s.spawn(|| {
				let rex = zoo.dog("rex");
				for _ in 0..20 {
					assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), Some(tag.clone()));
				}
			});
		}
	});

	let promoted = registry.lookup(&zoo.dog, &zoo.tag).unwrap().unwrap();
	assert!(Arc::ptr_eq(&promoted, &fallback));
	let kept = registry.lookup(&zoo.tag, zoo.types.string()).unwrap().unwrap();
	assert!(Arc::ptr_eq(&kept, &registered));
	assert_eq!(registry.list_all_pairs().len(), 2);
}

#[cfg_attr(test, test)]
pub(crate) fn test_concurrent_promotion_idempotent() {
	inv_concurrent_promotion_idempotent();
}

/// Invariant: a definite miss MUST stop the fallback chain.
pub(crate) fn inv_definite_miss_stops_chain() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let later = Arc::new(AtomicUsize::new(0));
	registry.register_fallback(counting(later.clone(), Converted::Value(zoo.tag("late"))), true);
	registry.register_fallback(counting(Arc::new(AtomicUsize::new(0)), Converted::Miss), false);

	let rex = zoo.dog("rex");
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), None);
	assert!(matches!(
		registry.mandatory_convert(&zoo.tag, None, Some(&rex)),
		Err(ConvertError::NoConversionAvailable { .. })
	));
	assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[cfg_attr(test, test)]
pub(crate) fn test_definite_miss_stops_chain() {
	inv_definite_miss_stops_chain();
}

/// Invariant: the hierarchy search runs once per pair; later calls are served by the cache.
pub(crate) fn inv_search_result_cached() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let bulk = Arc::new(CountingBulk::default());
	registry.add_bulk(bulk.clone());

	let calls = Arc::new(AtomicUsize::new(0));
	let converter: Arc<dyn Converter> = counting(calls.clone(), Converted::Value(zoo.tag("from-animal")));
	registry.register(&zoo.animal, &zoo.tag, converter).unwrap();

	let rex = zoo.dog("rex");
	registry.convert(&zoo.tag, None, Some(&rex)).unwrap();
	let searched = bulk.lookups();
	assert!(searched > 0);
	registry.convert(&zoo.tag, None, Some(&rex)).unwrap();
	assert_eq!(bulk.lookups(), searched);
	assert_eq!(calls.load(Ordering::SeqCst), 2);

	// Misses are remembered the same way.
	registry.convert(&zoo.opaque, None, Some(&rex)).unwrap();
	let searched = bulk.lookups();
	registry.convert(&zoo.opaque, None, Some(&rex)).unwrap();
	assert_eq!(bulk.lookups(), searched);

	assert_eq!(
		registry.statistics().snapshot(),
		StatisticsSnapshot {
			noop: 0,
			attempt: 4,
			hit: 2,
			miss: 2,
			failure: 0,
		}
	);
}

#[cfg_attr(test, test)]
pub(crate) fn test_search_result_cached() {
	inv_search_result_cached();
}
