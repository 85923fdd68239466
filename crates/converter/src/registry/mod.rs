//! Type converter registry.
//!
//! # Role
//!
//! Owns the direct-mapping cache, the fallback chain and the bulk converter sets, and runs
//! the conversion algorithm over them. One registry exists per engine instance; handles are
//! cheap clones of a shared [`Arc`].
//!
//! # Lifecycle
//!
//! [`RegistryBuilder::build`] installs the core bulk set and the to-string fallback.
//! [`TypeConverterRegistry::start`] runs the configured loaders (or defers them to the first
//! conversion in lazy mode). [`TypeConverterRegistry::stop`] clears the cache and the
//! statistics and re-arms the loaders.
//!
//! # Invariants
//!
//! - A pair holds at most one entry: a converter, a miss marker, or nothing.
//!   - Enforced in: [`cache::DirectCache`] (one `DashMap` slot per pair).
//!   - Tested by: [`invariants::test_miss_marker_replaced_by_registration`]
//!   - Failure symptom: a stale miss hides a freshly registered converter.
//!
//! - Registrations are replaced or removed one pair at a time; only derived entries are
//!   purged with the converter they came from.
//!   - Enforced in: [`TypeConverterRegistry::register_pair`],
//!     [`TypeConverterRegistry::unregister`] ([`cache::DirectCache::purge_derived`]).
//!   - Tested by: `tests::unregister_keeps_other_registrations_of_a_shared_converter`,
//!     `tests::override_drops_entries_derived_from_the_replaced_converter`
//!   - Failure symptom: subtypes keep running a replaced converter, or unrelated pairs
//!     vanish with it.
//!
//! - The to-string fallback never enters the direct cache.
//!   - Enforced in: [`TypeConverterRegistry::register_fallback`] (promotion clamped by
//!     [`Converter::promotable`]).
//!   - Tested by: [`invariants::test_to_string_never_promoted`]
//!   - Failure symptom: every type pair resolves to the to-string converter.
//!
//! - Concurrent fallback registrations are never lost.
//!   - Enforced in: [`crate::chain::CowList::update`] (CAS loop).
//!   - Tested by: [`invariants::test_fallback_chain_no_lost_updates`]
//!   - Failure symptom: fallbacks silently missing after parallel start-up.
//!
//! - Racing promotions of one pair are interchangeable.
//!   - Enforced in: [`cache::DirectCache::insert_derived`].
//!   - Tested by: [`invariants::test_concurrent_promotion_idempotent`]
//!   - Failure symptom: a registered converter replaced by a fallback.
//!
//! - A definite miss ends the search.
//!   - Enforced in: `dispatch` fallback loop.
//!   - Tested by: [`invariants::test_definite_miss_stops_chain`]
//!   - Failure symptom: later fallbacks run for values they must not see.
//!
//! - The hierarchy search runs once per pair.
//!   - Enforced in: `dispatch` (derived converters and misses are cached).
//!   - Tested by: [`invariants::test_search_result_cached`]
//!   - Failure symptom: every conversion pays for a full hierarchy walk.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};
use transit_types::{TypeRef, TypeSystem};

use crate::bulk::{BulkConverters, CoreBulkConverters, Order};
use crate::chain::CowList;
use crate::config::{DuplicatePolicy, LogLevel, RegistryConfig, log_at};
use crate::converter::{Context, Converter};
use crate::enums::EnumConverter;
use crate::error::{LoaderError, RegistryError};
use crate::fallback::{Fallback, ToStringFallback};
use crate::loader::ConverterLoader;
use crate::pair::TypePair;
use crate::statistics::Statistics;

mod cache;
mod dispatch;
mod gate;
mod lookup;

use cache::{DirectCache, Origin, Slot};
use gate::LoadGate;

#[cfg(any(test, doc))]
pub(crate) mod invariants;

#[cfg(any(test, doc))]
pub(crate) mod test_fixtures;

#[cfg(test)]
mod tests;

pub(crate) struct Inner {
	types: Arc<TypeSystem>,
	cache: DirectCache,
	fallbacks: CowList<Fallback>,
	bulk: CowList<Arc<dyn BulkConverters>>,
	enums: EnumConverter,
	stats: Statistics,
	policy: DuplicatePolicy,
	log_level: LogLevel,
	lazy: bool,
	loaders: Vec<Arc<dyn ConverterLoader>>,
	gate: LoadGate,
	context: Option<Arc<Context>>,
	started: AtomicBool,
}

/// Shared handle to a type converter registry.
#[derive(Clone)]
pub struct TypeConverterRegistry {
	inner: Arc<Inner>,
}

/// Non-owning registry handle, handed to [`crate::RegistryAware`] converters.
#[derive(Clone, Default)]
pub struct WeakRegistry {
	inner: Weak<Inner>,
}

impl WeakRegistry {
	pub fn upgrade(&self) -> Option<TypeConverterRegistry> {
		self.inner.upgrade().map(|inner| TypeConverterRegistry { inner })
	}
}

impl fmt::Debug for WeakRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakRegistry")
			.field("alive", &(self.inner.strong_count() > 0))
			.finish()
	}
}

impl fmt::Debug for TypeConverterRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeConverterRegistry")
			.field("mappings", &self.inner.cache.converter_count())
			.field("misses", &self.inner.cache.miss_count())
			.field("fallbacks", &self.inner.fallbacks.len())
			.field("bulk", &self.inner.bulk.len())
			.field("policy", &self.inner.policy)
			.finish_non_exhaustive()
	}
}

/// Configures and builds a [`TypeConverterRegistry`].
pub struct RegistryBuilder {
	types: Arc<TypeSystem>,
	config: RegistryConfig,
	loaders: Vec<Arc<dyn ConverterLoader>>,
	bulk: Vec<Arc<dyn BulkConverters>>,
	context: Option<Arc<Context>>,
	parent: Option<TypeConverterRegistry>,
	core: bool,
}

impl RegistryBuilder {
	pub fn new(types: Arc<TypeSystem>) -> Self {
		Self {
			types,
			config: RegistryConfig::default(),
			loaders: Vec::new(),
			bulk: Vec::new(),
			context: None,
			parent: None,
			core: true,
		}
	}

	pub fn config(mut self, config: RegistryConfig) -> Self {
		self.config = config;
		self
	}

	pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.config.duplicate_policy = policy;
		self
	}

	pub fn duplicate_log_level(mut self, level: LogLevel) -> Self {
		self.config.duplicate_log_level = level;
		self
	}

	pub fn statistics(mut self, enabled: bool) -> Self {
		self.config.statistics = enabled;
		self
	}

	pub fn lazy_loading(mut self, lazy: bool) -> Self {
		self.config.lazy_loading = lazy;
		self
	}

	pub fn loader(mut self, loader: impl ConverterLoader + 'static) -> Self {
		self.loaders.push(Arc::new(loader));
		self
	}

	pub fn bulk(mut self, set: impl BulkConverters + 'static) -> Self {
		self.bulk.push(Arc::new(set));
		self
	}

	/// Context handed to [`crate::ContextAware`] converters at registration.
	pub fn engine_context(mut self, context: Arc<Context>) -> Self {
		self.context = Some(context);
		self
	}

	/// Starts from a copy of `parent`: its types, converters, bulk sets, fallbacks and
	/// duplicate policy.
	pub fn inherit(mut self, parent: &TypeConverterRegistry) -> Self {
		self.types = parent.inner.types.clone();
		self.config.duplicate_policy = parent.inner.policy;
		self.parent = Some(parent.clone());
		self
	}

	/// Skips the core bulk set and the to-string fallback.
	pub fn without_core_converters(mut self) -> Self {
		self.core = false;
		self
	}

	pub fn build(self) -> TypeConverterRegistry {
		let registry = TypeConverterRegistry {
			inner: Arc::new(Inner {
				types: self.types,
				cache: DirectCache::new(),
				fallbacks: CowList::new(),
				bulk: CowList::new(),
				enums: EnumConverter,
				stats: Statistics::new(self.config.statistics),
				policy: self.config.duplicate_policy,
				log_level: self.config.duplicate_log_level,
				lazy: self.config.lazy_loading,
				loaders: self.loaders,
				gate: LoadGate::default(),
				context: self.context,
				started: AtomicBool::new(false),
			}),
		};
		let inner = &registry.inner;

		if let Some(parent) = &self.parent {
			for (pair, converter) in parent.inner.cache.registrations() {
				inner.cache.insert_registered(pair, converter);
			}
			inner.bulk.replace_all(parent.inner.bulk.load().to_vec());
			inner.fallbacks.replace_all(parent.inner.fallbacks.load().to_vec());
		} else if self.core {
			registry.add_bulk(Arc::new(CoreBulkConverters::new(&inner.types)));
			registry.register_fallback(Arc::new(ToStringFallback::new(&inner.types)), false);
		}
		for set in self.bulk {
			registry.add_bulk(set);
		}
		registry
	}
}

impl TypeConverterRegistry {
	pub fn builder(types: Arc<TypeSystem>) -> RegistryBuilder {
		RegistryBuilder::new(types)
	}

	pub fn types(&self) -> &Arc<TypeSystem> {
		&self.inner.types
	}

	pub fn downgrade(&self) -> WeakRegistry {
		WeakRegistry {
			inner: Arc::downgrade(&self.inner),
		}
	}

	pub fn statistics(&self) -> &Statistics {
		&self.inner.stats
	}

	pub fn duplicate_policy(&self) -> DuplicatePolicy {
		self.inner.policy
	}

	/// Registers `converter` for `from -> to`.
	pub fn register(&self, from: &TypeRef, to: &TypeRef, converter: Arc<dyn Converter>) -> Result<(), RegistryError> {
		self.register_pair(TypePair::new(from.clone(), to.clone()), converter)
	}

	/// Registers `converter` for `pair`, applying the duplicate policy when the pair
	/// already holds a different registration. Miss markers and derived entries are
	/// always replaced.
	pub fn register_pair(&self, pair: TypePair, converter: Arc<dyn Converter>) -> Result<(), RegistryError> {
		let inner = &self.inner;
		self.wire(&converter);

		let replaced = match inner.cache.entry(pair.clone()) {
			Entry::Vacant(v) => {
				v.insert(inner.cache.registered_slot(converter));
				None
			}
			Entry::Occupied(mut o) => match o.get().clone() {
				Slot::Miss
				| Slot::Converter {
					origin: Origin::Derived,
					..
				} => {
					o.insert(inner.cache.registered_slot(converter));
					None
				}
				Slot::Converter { converter: existing, .. } if Arc::ptr_eq(&existing, &converter) => None,
				Slot::Converter { converter: existing, .. } => match inner.policy {
					DuplicatePolicy::Override => {
						log_at!(
							inner.log_level,
							pair = %pair,
							existing = ?existing,
							replacement = ?converter,
							"overriding type converter"
						);
						o.insert(inner.cache.registered_slot(converter));
						Some(existing)
					}
					DuplicatePolicy::Ignore => {
						log_at!(
							inner.log_level,
							pair = %pair,
							existing = ?existing,
							ignored = ?converter,
							"ignoring duplicate type converter"
						);
						None
					}
					DuplicatePolicy::Fail => {
						let (from, to) = pair.into_parts();
						return Err(RegistryError::ConverterAlreadyExists { from, to });
					}
				},
			},
		};

		if let Some(old) = replaced {
			inner.cache.purge_derived(&old);
		}
		inner.cache.purge_misses();
		Ok(())
	}

	/// Removes the converter held for `from -> to`, along with the entries the search
	/// derived from it. Other registrations of the same converter stay. Returns false when
	/// the pair held no converter.
	pub fn unregister(&self, from: &TypeRef, to: &TypeRef) -> bool {
		let pair = TypePair::new(from.clone(), to.clone());
		match self.inner.cache.remove(&pair) {
			Some(Slot::Converter { converter, .. }) => {
				self.inner.cache.purge_derived(&converter);
				debug!(pair = %pair, "unregistered type converter");
				true
			}
			Some(Slot::Miss) | None => false,
		}
	}

	/// Adds a fallback at the head of the chain.
	///
	/// `can_promote` is ignored for converters that are not [`Converter::promotable`].
	pub fn register_fallback(&self, converter: Arc<dyn Converter>, can_promote: bool) {
		let can_promote = if can_promote && !converter.promotable() {
			warn!(converter = ?converter, "fallback type converter cannot be promoted");
			false
		} else {
			can_promote
		};
		self.wire(&converter);
		self.inner.fallbacks.push_front(Fallback { converter, can_promote });
	}

	/// Adds a bulk converter set. [`Order::Highest`] sets go first; adding the same set
	/// twice is a no-op.
	pub fn add_bulk(&self, set: Arc<dyn BulkConverters>) {
		let order = set.order();
		self.inner.bulk.update(|sets| {
			if sets.iter().any(|s| Arc::ptr_eq(s, &set)) {
				return false;
			}
			match order {
				Order::Highest => sets.insert(0, set.clone()),
				Order::Normal => sets.push(set.clone()),
			}
			true
		});
	}

	fn wire(&self, converter: &Arc<dyn Converter>) {
		if let Some(aware) = converter.registry_aware() {
			aware.set_registry(self.downgrade());
		}
		if let Some(aware) = converter.context_aware()
			&& let Some(context) = &self.inner.context
		{
			aware.set_context(context.clone());
		}
	}

	/// Runs the configured loaders, unless lazy loading defers them to the first
	/// conversion. Calling it again is a no-op. The registry stays stopped when a loader
	/// fails.
	pub fn start(&self) -> Result<(), RegistryError> {
		if !self.inner.lazy {
			self.inner.gate.run(|| self.run_loaders())?;
		}
		self.inner.started.store(true, Ordering::Release);
		Ok(())
	}

	/// Logs the utilization summary, then clears the cache and the statistics. The next
	/// start runs the loaders again.
	///
	/// Fallbacks and bulk sets are kept.
	pub fn stop(&self) {
		let inner = &self.inner;
		if inner.stats.is_enabled() {
			info!(
				"type converter registry {} mappings[total={}, misses={}]",
				inner.stats,
				self.size(),
				inner.cache.miss_count()
			);
		}
		inner.cache.clear();
		inner.stats.reset();
		inner.gate.reset();
		inner.started.store(false, Ordering::Release);
	}

	pub fn is_started(&self) -> bool {
		self.inner.started.load(Ordering::Acquire)
	}

	/// Whether the configured loaders have completed.
	pub fn is_loaded(&self) -> bool {
		self.inner.gate.is_loaded()
	}

	/// Runs an additional loader now.
	pub fn load(&self, loader: &dyn ConverterLoader) -> Result<(), RegistryError> {
		debug!(loader = loader.name(), "loading type converters");
		loader
			.load(self)
			.map_err(|source| LoaderError::new(loader.name(), source))?;
		Ok(())
	}

	fn run_loaders(&self) -> Result<(), LoaderError> {
		for loader in &self.inner.loaders {
			debug!(loader = loader.name(), "loading type converters");
			loader
				.load(self)
				.map_err(|source| LoaderError::new(loader.name(), source))?;
		}
		Ok(())
	}

	pub(crate) fn ensure_loaded(&self) -> Result<(), LoaderError> {
		if self.inner.lazy {
			self.inner.gate.run(|| self.run_loaders())
		} else {
			Ok(())
		}
	}

	/// Number of direct mappings, counting every conversion of every bulk set.
	pub fn size(&self) -> usize {
		let bulk: usize = self.inner.bulk.load().iter().map(|set| set.len()).sum();
		self.inner.cache.converter_count() + bulk
	}

	/// Every pair with a converter in the direct cache, oldest first.
	pub fn list_all_pairs(&self) -> Vec<TypePair> {
		self.inner.cache.pairs()
	}

	pub fn miss_count(&self) -> usize {
		self.inner.cache.miss_count()
	}

	pub fn fallback_count(&self) -> usize {
		self.inner.fallbacks.len()
	}

	pub fn bulk_count(&self) -> usize {
		self.inner.bulk.len()
	}
}
