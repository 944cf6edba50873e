//! Module references a generated unit must be compiled against.

use std::collections::BTreeMap;

use crate::binding::MappingSpec;
use crate::reflect::{ModuleInfo, TypeInfo};

#[cfg(test)]
mod tests;

/// Path of the mapping contract trait the generated unit implements.
pub const MAPPING_TRAIT: &str = "bindmap::Mapping";

/// A compiled module and the items it makes visible to generated code.
#[derive(Debug, Clone)]
pub struct ModuleReference {
	module: ModuleInfo,
	types: Vec<&'static TypeInfo>,
	traits: Vec<String>,
}

impl ModuleReference {
	pub fn new(module: ModuleInfo) -> Self {
		Self {
			module,
			types: Vec::new(),
			traits: Vec::new(),
		}
	}

	/// The module defining `ty`, exporting it.
	pub fn of_type(ty: &'static TypeInfo) -> Self {
		Self::new(ty.module().clone()).with_type(ty)
	}

	/// The mapping engine itself.
	pub fn engine() -> Self {
		Self::new(ModuleInfo::new(
			env!("CARGO_PKG_NAME"),
			Some(env!("CARGO_MANIFEST_DIR").to_string()),
		))
		.with_trait(MAPPING_TRAIT)
	}

	/// The standard library traits generated code relies on.
	pub fn std_library() -> Self {
		Self::new(ModuleInfo::new("std", None))
			.with_trait("std::clone::Clone")
			.with_trait("std::default::Default")
	}

	pub fn with_type(mut self, ty: &'static TypeInfo) -> Self {
		if !self.types.iter().any(|known| known.type_id() == ty.type_id()) {
			self.types.push(ty);
		}
		self
	}

	pub fn with_trait(mut self, path: impl Into<String>) -> Self {
		let path = path.into();
		if !self.traits.contains(&path) {
			self.traits.push(path);
		}
		self
	}

	pub fn module(&self) -> &ModuleInfo {
		&self.module
	}

	pub fn types(&self) -> &[&'static TypeInfo] {
		&self.types
	}

	pub fn traits(&self) -> &[String] {
		&self.traits
	}

	fn merge(&mut self, other: ModuleReference) {
		if self.module.location().is_none() && other.module.location().is_some() {
			self.module = other.module;
		}
		for ty in other.types {
			if !self.types.iter().any(|known| known.type_id() == ty.type_id()) {
				self.types.push(ty);
			}
		}
		for path in other.traits {
			if !self.traits.contains(&path) {
				self.traits.push(path);
			}
		}
	}
}

/// Module references deduplicated by module key.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
	modules: BTreeMap<String, ModuleReference>,
}

impl ReferenceSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `reference`, merging its exports into an existing entry for the same module.
	pub fn insert(&mut self, reference: ModuleReference) {
		match self.modules.get_mut(reference.module.key()) {
			Some(existing) => existing.merge(reference),
			None => {
				self.modules.insert(reference.module.key().to_string(), reference);
			}
		}
	}

	pub fn contains(&self, key: &str) -> bool {
		self.modules.contains_key(key)
	}

	pub fn get(&self, key: &str) -> Option<&ModuleReference> {
		self.modules.get(key)
	}

	pub fn len(&self) -> usize {
		self.modules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.modules.is_empty()
	}

	/// Module keys in sorted order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.modules.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = &ModuleReference> {
		self.modules.values()
	}

	/// Finds an exported type by fully-qualified path.
	pub fn find_type(&self, path: &str) -> Option<&'static TypeInfo> {
		self.modules
			.values()
			.flat_map(|reference| reference.types.iter().copied())
			.find(|ty| ty.path() == path)
	}

	/// Whether some referenced module exports trait `path`.
	pub fn has_trait(&self, path: &str) -> bool {
		self.modules
			.values()
			.any(|reference| reference.traits.iter().any(|known| known == path))
	}
}

impl Extend<ModuleReference> for ReferenceSet {
	fn extend<I: IntoIterator<Item = ModuleReference>>(&mut self, iter: I) {
		for reference in iter {
			self.insert(reference);
		}
	}
}

impl FromIterator<ModuleReference> for ReferenceSet {
	fn from_iter<I: IntoIterator<Item = ModuleReference>>(iter: I) -> Self {
		let mut set = Self::new();
		set.extend(iter);
		set
	}
}

/// References contributed by the interfaces and ancestors of `ty`.
///
/// A type without a base contributes its interfaces only; the chain ends there.
pub fn parent_references(ty: &'static TypeInfo) -> Vec<ModuleReference> {
	let interfaces = ty
		.interfaces()
		.iter()
		.map(|interface| ModuleReference::new(interface.module().clone()).with_trait(interface.path()));
	let ancestors = ty.ancestors().flat_map(|ancestor| {
		std::iter::once(ModuleReference::of_type(ancestor)).chain(
			ancestor
				.interfaces()
				.iter()
				.map(|interface| ModuleReference::new(interface.module().clone()).with_trait(interface.path())),
		)
	});
	interfaces.chain(ancestors).collect()
}

/// Collects the modules needed to compile code referencing every root type in `spec`.
///
/// `host` carries the modules the calling program already references; the
/// engine's own references are always added.
pub fn resolve_references(spec: &MappingSpec, host: &[ModuleReference]) -> ReferenceSet {
	let mut set = ReferenceSet::new();

	for path in spec.member_paths() {
		let root = path.root_type();
		set.insert(ModuleReference::of_type(root));
		set.extend(parent_references(root));
	}

	set.extend(host.iter().cloned());
	set.insert(ModuleReference::engine());
	set.insert(ModuleReference::std_library());

	tracing::debug!(
		source = spec.source().path(),
		destination = spec.destination().path(),
		modules = ?set.keys().collect::<Vec<_>>(),
		"resolved module references"
	);
	set
}
