use std::sync::OnceLock;

use super::*;
use crate::binding::{BindingEntry, BindingTable};
use crate::expr::Accessor;
use crate::reflect::Reflect;
use crate::resolve::resolve;

/// Stands in for a type compiled into another crate.
#[derive(Debug, Clone, Default)]
struct VendorRecord {
	created: u64,
}

impl Reflect for VendorRecord {
	fn type_info() -> &'static TypeInfo {
		static INFO: OnceLock<TypeInfo> = OnceLock::new();
		INFO.get_or_init(|| {
			TypeInfo::builder::<Self>("VendorRecord", "vendor::records", "/opt/vendor")
				.field::<u64>("created", |this| &this.created, |this| &mut this.created)
				.implements::<dyn std::fmt::Display>()
				.build()
		})
	}
}

#[derive(Debug, Clone, Default, bindmap::Reflect)]
#[reflect(implements(std::fmt::Debug))]
struct Invoice {
	#[reflect(base)]
	record: VendorRecord,
	total: u64,
}

#[derive(Debug, Clone, Default, bindmap::Reflect)]
struct Plain {
	total: u64,
}

#[derive(Debug, Clone, Default, bindmap::Reflect)]
struct Summary {
	amount: u64,
	created: u64,
}

#[test]
fn base_less_type_contributes_only_its_interfaces() {
	assert!(parent_references(Plain::type_info()).is_empty());
	assert!(parent_references(VendorRecord::type_info()).iter().all(|r| r.types().is_empty()));
	let keys = parent_references(VendorRecord::type_info())
		.iter()
		.map(|r| r.module().key().to_string())
		.collect::<Vec<_>>();
	assert_eq!(keys, ["core"]);
}

#[test]
fn ancestors_contribute_their_module_and_interfaces() {
	let refs = parent_references(Invoice::type_info());
	let keys = refs.iter().map(|r| r.module().key()).collect::<Vec<_>>();
	assert_eq!(keys, ["core", "vendor", "core"]);

	let vendor = &refs[1];
	assert_eq!(vendor.module().location(), Some("/opt/vendor"));
	assert_eq!(vendor.types().len(), 1);
	assert_eq!(vendor.types()[0].path(), "vendor::records::VendorRecord");
}

#[test]
fn reference_set_merges_by_module_key() {
	let set = [
		ModuleReference::of_type(Invoice::type_info()),
		ModuleReference::of_type(Plain::type_info()),
		ModuleReference::engine(),
	]
	.into_iter()
	.collect::<ReferenceSet>();

	assert_eq!(set.len(), 1);
	let engine = set.get("bindmap").expect("engine module");
	assert_eq!(engine.types().len(), 2);
	assert!(set.has_trait(MAPPING_TRAIT));
	assert!(set.find_type(Plain::type_info().path()).is_some());
}

#[test]
fn merge_keeps_a_known_location() {
	let mut set = ReferenceSet::new();
	set.insert(ModuleReference::new(ModuleInfo::new("vendor", None)).with_trait("vendor::Audit"));
	set.insert(ModuleReference::of_type(VendorRecord::type_info()));

	let vendor = set.get("vendor").expect("vendor module");
	assert_eq!(vendor.module().location(), Some("/opt/vendor"));
	assert_eq!(vendor.traits(), ["vendor::Audit".to_string()]);
	assert_eq!(vendor.types().len(), 1);
}

#[test]
fn resolve_references_covers_roots_parents_host_and_engine() {
	let mut table = BindingTable::new();
	table.push(BindingEntry::new(
		resolve(&Accessor::parse("|s| s.created", Invoice::type_info())),
		resolve(&Accessor::parse("|d| d.created", Summary::type_info())),
	));
	table.push(BindingEntry::new(
		resolve(&Accessor::parse("|s| s.total", Invoice::type_info())),
		resolve(&Accessor::parse("|d| d.amount", Summary::type_info())),
	));
	let spec = table.snapshot(Invoice::type_info(), Summary::type_info());

	let set = resolve_references(&spec, &[]);
	assert_eq!(set.keys().collect::<Vec<_>>(), ["bindmap", "core", "std", "vendor"]);
	assert!(set.find_type(Invoice::type_info().path()).is_some());
	assert!(set.find_type(Summary::type_info().path()).is_some());
	assert!(set.find_type("vendor::records::VendorRecord").is_some());
	assert!(set.has_trait("core::fmt::Debug"));
	assert!(set.has_trait("core::fmt::Display"));
	assert!(set.has_trait("std::default::Default"));
}

#[test]
fn unresolved_sides_contribute_nothing() {
	let mut table = BindingTable::new();
	table.push(BindingEntry::new(
		resolve(&Accessor::parse("|s| s.missing", Invoice::type_info())),
		resolve(&Accessor::parse("|d| d.amount", Summary::type_info())),
	));
	let spec = table.snapshot(Invoice::type_info(), Summary::type_info());

	let set = resolve_references(&spec, &[]);
	assert!(!set.contains("vendor"));
	assert!(set.find_type(Invoice::type_info().path()).is_none());
	assert!(set.find_type(Summary::type_info().path()).is_some());
}

#[test]
fn engine_and_std_are_always_referenced() {
	let spec = BindingTable::new().snapshot(Plain::type_info(), Summary::type_info());
	let set = resolve_references(&spec, &[]);
	assert_eq!(set.keys().collect::<Vec<_>>(), ["bindmap", "std"]);
}
