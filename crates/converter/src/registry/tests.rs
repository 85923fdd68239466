use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::rstest;
use transit_types::{Primitive, TypeRef, Value};

use super::test_fixtures::{Zoo, counting, returning};
use super::{RegistryBuilder, TypeConverterRegistry};
use crate::bulk::{BulkConverters, Order};
use crate::config::DuplicatePolicy;
use crate::converter::{Context, Converted, Converter, converter_fn};
use crate::error::{ConvertError, ConverterError, RegistryError, TypeConversionError};
use crate::pair::TypePair;
use crate::statistics::StatisticsSnapshot;

fn with_policy(zoo: &Zoo, policy: DuplicatePolicy) -> TypeConverterRegistry {
	RegistryBuilder::new(zoo.types.clone()).duplicate_policy(policy).build()
}

#[rstest]
#[case(DuplicatePolicy::Override, "second")]
#[case(DuplicatePolicy::Ignore, "first")]
fn duplicate_policy_picks_winner(#[case] policy: DuplicatePolicy, #[case] expected: &'static str) {
	let zoo = Zoo::new();
	let registry = with_policy(&zoo, policy);
	let first = zoo.tag("first");
	let second = zoo.tag("second");
	registry.register(&zoo.dog, &zoo.tag, returning(first.clone())).unwrap();
	registry.register(&zoo.dog, &zoo.tag, returning(second.clone())).unwrap();

	let out = registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap();
	let winner = if expected == "first" { first } else { second };
	assert_eq!(out, Some(winner));
}

#[test]
fn fail_policy_rejects_duplicates() {
	let zoo = Zoo::new();
	let registry = with_policy(&zoo, DuplicatePolicy::Fail);
	let converter = returning(zoo.tag("first"));
	registry.register(&zoo.dog, &zoo.tag, converter.clone()).unwrap();

	// Registering the very same converter again is not a duplicate.
	registry.register(&zoo.dog, &zoo.tag, converter).unwrap();

	let err = registry
		.register(&zoo.dog, &zoo.tag, returning(zoo.tag("second")))
		.unwrap_err();
	assert!(matches!(err, RegistryError::ConverterAlreadyExists { .. }));
	assert_eq!(err.to_string(), "type converter to: Tag from: Dog already exists");
}

#[test]
fn fail_policy_still_replaces_miss_markers() {
	let zoo = Zoo::new();
	let registry = with_policy(&zoo, DuplicatePolicy::Fail);
	registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap();
	assert_eq!(registry.miss_count(), 1);
	registry.register(&zoo.dog, &zoo.tag, returning(zoo.tag("t"))).unwrap();
	assert_eq!(registry.miss_count(), 0);
}

#[test]
fn unregister_drops_derived_entries() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	registry.register(&zoo.animal, &zoo.tag, returning(zoo.tag("t"))).unwrap();
	let rex = zoo.dog("rex");

	assert!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap().is_some());
	assert_eq!(
		registry.list_all_pairs(),
		vec![
			TypePair::new(zoo.animal.clone(), zoo.tag.clone()),
			TypePair::new(zoo.dog.clone(), zoo.tag.clone()),
		]
	);

	assert!(registry.unregister(&zoo.animal, &zoo.tag));
	assert!(registry.list_all_pairs().is_empty());
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), None);
	assert!(!registry.unregister(&zoo.animal, &zoo.tag));
	// Only a miss marker is left for the pair.
	assert!(!registry.unregister(&zoo.dog, &zoo.tag));
}

#[test]
fn unregister_keeps_other_registrations_of_a_shared_converter() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let tag = zoo.tag("shared");
	let shared = returning(tag.clone());
	registry.register(&zoo.dog, &zoo.tag, shared.clone()).unwrap();
	registry.register(&zoo.animal, &zoo.tag, shared).unwrap();

	assert!(registry.unregister(&zoo.dog, &zoo.tag));
	assert_eq!(
		registry.list_all_pairs(),
		vec![TypePair::new(zoo.animal.clone(), zoo.tag.clone())]
	);
	assert_eq!(registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), Some(tag));
}

#[test]
fn override_drops_entries_derived_from_the_replaced_converter() {
	let zoo = Zoo::new();
	let registry = with_policy(&zoo, DuplicatePolicy::Override);
	let old = zoo.tag("old");
	let new = zoo.tag("new");
	let rex = zoo.dog("rex");
	registry.register(&zoo.animal, &zoo.tag, returning(old.clone())).unwrap();
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), Some(old));

	registry.register(&zoo.animal, &zoo.tag, returning(new.clone())).unwrap();
	assert_eq!(
		registry.list_all_pairs(),
		vec![TypePair::new(zoo.animal.clone(), zoo.tag.clone())]
	);
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), Some(new));
}

#[rstest]
#[case(DuplicatePolicy::Override)]
#[case(DuplicatePolicy::Ignore)]
#[case(DuplicatePolicy::Fail)]
fn registration_replaces_derived_entries(#[case] policy: DuplicatePolicy) {
	let zoo = Zoo::new();
	let registry = with_policy(&zoo, policy);
	let general = zoo.tag("general");
	let specific = zoo.tag("specific");
	let rex = zoo.dog("rex");
	registry.register(&zoo.animal, &zoo.tag, returning(general.clone())).unwrap();
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), Some(general));

	registry.register(&zoo.dog, &zoo.tag, returning(specific.clone())).unwrap();
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), Some(specific));
}

#[test]
fn assignable_scan_prefers_earliest_registration() {
	let zoo = Zoo::new();
	let special = zoo.types.declare_class("SpecialTag", Some(&zoo.tag), &[]).unwrap();
	let other = zoo.types.declare_class("OtherTag", Some(&zoo.tag), &[]).unwrap();
	let by_animal = zoo.tag("by-animal");
	let by_name = zoo.tag("by-name");

	let registry = zoo.registry();
	registry.register(&zoo.animal, &special, returning(by_animal.clone())).unwrap();
	registry.register(&zoo.named, &other, returning(by_name.clone())).unwrap();
	assert_eq!(registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), Some(by_animal.clone()));

	let registry = zoo.registry();
	registry.register(&zoo.named, &other, returning(by_name.clone())).unwrap();
	registry.register(&zoo.animal, &special, returning(by_animal)).unwrap();
	assert_eq!(registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), Some(by_name));
}

#[test]
fn interfaces_win_over_supertypes_and_root() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let via_root = zoo.tag("root");
	let via_animal = zoo.tag("animal");
	let via_named = zoo.tag("named");
	registry.register(zoo.types.object(), &zoo.tag, returning(via_root.clone())).unwrap();
	registry.register(&zoo.animal, &zoo.tag, returning(via_animal)).unwrap();
	registry.register(&zoo.named, &zoo.tag, returning(via_named.clone())).unwrap();
	assert_eq!(registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), Some(via_named));

	let cat = zoo.types.declare_class("Cat", None, &[]).unwrap();
	let tom = Value::Object(transit_types::ObjectValue::new(cat, super::test_fixtures::Payload("tom")));
	assert_eq!(registry.convert(&zoo.tag, None, Some(&tom)).unwrap(), Some(via_root));
}

#[test]
fn primitive_targets_use_boxed_registrations() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let integer = zoo.types.boxed_of(Primitive::Int).clone();
	registry.register(&zoo.dog, &integer, returning(Value::Int(7))).unwrap();

	let out = registry
		.convert(zoo.types.primitive(Primitive::Int), None, Some(&zoo.dog("rex")))
		.unwrap();
	assert_eq!(out, Some(Value::Int(7)));
	assert_eq!(registry.list_all_pairs(), vec![TypePair::new(zoo.dog.clone(), integer)]);
}

#[test]
fn null_input_yields_primitive_defaults() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	for p in Primitive::ALL {
		let out = registry.convert(zoo.types.primitive(p), None, None).unwrap();
		assert_eq!(out, Some(Value::zero(p)));
	}
	assert_eq!(registry.convert(zoo.types.string(), None, None).unwrap(), None);
	assert!(matches!(
		registry.mandatory_convert(zoo.types.string(), None, None),
		Err(ConvertError::NoConversionAvailable { .. })
	));
	assert_eq!(registry.statistics().snapshot().noop, 10);
}

#[test]
fn same_instance_is_returned_untouched() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let calls = Arc::new(AtomicUsize::new(0));
	registry
		.register(&zoo.dog, &zoo.animal, counting(calls.clone(), Converted::Null))
		.unwrap();

	let rex = zoo.dog("rex");
	assert_eq!(registry.convert(&zoo.animal, None, Some(&rex)).unwrap(), Some(rex.clone()));
	assert_eq!(registry.convert(&zoo.named, None, Some(&rex)).unwrap(), Some(rex));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
	assert_eq!(registry.statistics().snapshot().noop, 2);
}

#[test]
fn legitimate_null_skips_fallbacks() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let fallback_calls = Arc::new(AtomicUsize::new(0));
	registry.register_fallback(counting(fallback_calls.clone(), Converted::Value(zoo.tag("fb"))), false);
	let nullable = converter_fn("nullable", |_, _, _| Ok(Converted::Null)).allow_null();
	registry.register(&zoo.dog, &zoo.tag, Arc::new(nullable)).unwrap();

	let rex = zoo.dog("rex");
	assert_eq!(registry.convert(&zoo.tag, None, Some(&rex)).unwrap(), None);
	assert_eq!(registry.mandatory_convert(&zoo.tag, None, Some(&rex)).unwrap(), None);
	assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn plain_null_continues_to_fallbacks() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let rescued = zoo.tag("fb");
	registry.register_fallback(returning(rescued.clone()), false);
	registry
		.register(&zoo.dog, &zoo.tag, counting(Arc::new(AtomicUsize::new(0)), Converted::Null))
		.unwrap();

	assert_eq!(registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), Some(rescued));
}

fn failing(error: fn(&TypeRef) -> ConverterError) -> Arc<dyn Converter> {
	Arc::new(converter_fn("failing", move |to, _, _| Err(error(to))))
}

#[test]
fn converter_failures_are_wrapped() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	registry
		.register(&zoo.dog, &zoo.tag, failing(|_| ConverterError::msg("boom")))
		.unwrap();

	let err = registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap_err();
	assert!(matches!(err, ConvertError::ConversionFailed(_)));
	assert_eq!(
		err.to_string(),
		"error during type conversion from type: Dog to the required type: Tag with value rex due to boom"
	);
	assert_eq!(registry.statistics().snapshot().failure, 1);
}

#[test]
fn conversion_errors_for_the_same_target_are_kept() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	registry
		.register(&zoo.dog, &zoo.tag, failing(|to| TypeConversionError::new(None, None, to, None).into()))
		.unwrap();

	match registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap_err() {
		ConvertError::ConversionFailed(e) => {
			assert_eq!(e.value, "null");
			assert!(e.from.is_none());
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn execution_errors_are_not_wrapped() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	registry
		.register(&zoo.dog, &zoo.tag, failing(|_| ConverterError::execution("future cancelled")))
		.unwrap();

	match registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap_err() {
		ConvertError::Execution { to, source } => {
			assert_eq!(to, zoo.tag);
			assert_eq!(source.to_string(), "future cancelled");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn try_convert_swallows_failures() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	registry
		.register(&zoo.dog, &zoo.tag, failing(|_| ConverterError::msg("boom")))
		.unwrap();

	assert_eq!(registry.try_convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), None);
	assert_eq!(
		registry.try_convert(zoo.types.primitive(Primitive::Boolean), None, Some(&Value::from("maybe"))).unwrap(),
		None
	);
	assert_eq!(registry.statistics().snapshot().failure, 1);
}

#[derive(Debug)]
struct FixedBulk {
	order: Order,
	from: TypeRef,
	to: TypeRef,
	out: Value,
}

impl BulkConverters for FixedBulk {
	fn convert(
		&self,
		from: &TypeRef,
		to: &TypeRef,
		_ctx: Option<&Context>,
		_value: &Value,
	) -> Result<Option<Value>, ConverterError> {
		Ok((*from == self.from && *to == self.to).then(|| self.out.clone()))
	}

	fn lookup(&self, _from: &TypeRef, _to: &TypeRef) -> Option<Arc<dyn Converter>> {
		None
	}

	fn len(&self) -> usize {
		1
	}

	fn order(&self) -> Order {
		self.order
	}
}

#[test]
fn highest_bulk_sets_run_first() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let normal: Arc<dyn BulkConverters> = Arc::new(FixedBulk {
		order: Order::Normal,
		from: zoo.dog.clone(),
		to: zoo.tag.clone(),
		out: zoo.tag("normal"),
	});
	let highest_out = zoo.tag("highest");
	let highest: Arc<dyn BulkConverters> = Arc::new(FixedBulk {
		order: Order::Highest,
		from: zoo.dog.clone(),
		to: zoo.tag.clone(),
		out: highest_out.clone(),
	});
	let before = registry.bulk_count();
	registry.add_bulk(normal.clone());
	registry.add_bulk(highest);
	registry.add_bulk(normal);
	assert_eq!(registry.bulk_count(), before + 2);

	assert_eq!(registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), Some(highest_out));
	assert!(registry.list_all_pairs().is_empty());
}

#[test]
fn size_counts_bulk_conversions() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	let core = registry.size();
	assert_eq!(core, 46);
	registry.register(&zoo.dog, &zoo.tag, returning(zoo.tag("t"))).unwrap();
	assert_eq!(registry.size(), core + 1);

	let bare = RegistryBuilder::new(zoo.types.clone()).without_core_converters().build();
	assert_eq!(bare.size(), 0);
	assert_eq!(bare.fallback_count(), 0);
}

#[test]
fn stop_clears_cache_and_statistics() {
	let zoo = Zoo::new();
	let registry = zoo.registry();
	registry.register(&zoo.dog, &zoo.tag, returning(zoo.tag("t"))).unwrap();
	registry.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap();
	registry.convert(&zoo.opaque, None, Some(&zoo.dog("rex"))).unwrap();
	registry.start().unwrap();
	assert!(registry.is_started());

	registry.stop();
	assert!(!registry.is_started());
	assert!(registry.list_all_pairs().is_empty());
	assert_eq!(registry.miss_count(), 0);
	assert_eq!(registry.statistics().snapshot(), StatisticsSnapshot::default());
	assert!(registry.statistics().is_enabled());
	assert_eq!(registry.fallback_count(), 1);
}

#[test]
fn inherit_copies_mappings_and_fallbacks() {
	let zoo = Zoo::new();
	let parent = with_policy(&zoo, DuplicatePolicy::Ignore);
	let tag = zoo.tag("t");
	parent.register(&zoo.dog, &zoo.tag, returning(tag.clone())).unwrap();
	parent.register_fallback(returning(Value::Int(1)), false);

	let child = RegistryBuilder::new(zoo.types.clone()).inherit(&parent).build();
	assert_eq!(child.duplicate_policy(), DuplicatePolicy::Ignore);
	assert_eq!(child.fallback_count(), parent.fallback_count());
	assert_eq!(child.bulk_count(), parent.bulk_count());
	assert_eq!(child.list_all_pairs(), parent.list_all_pairs());
	assert_eq!(child.convert(&zoo.tag, None, Some(&zoo.dog("rex"))).unwrap(), Some(tag));

	// The copy is independent of its parent.
	child.unregister(&zoo.dog, &zoo.tag);
	assert_eq!(parent.list_all_pairs().len(), 1);
}
