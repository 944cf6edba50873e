//! Memoization of compiled units.

use std::any::TypeId;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::binding::MappingSpec;
use crate::compiler::{self, Assembly, CompileError};
use crate::deps::ReferenceSet;

/// Shared cache of compiled assemblies, keyed by the types a unit maps, its
/// module references and its generated source.
///
/// Identical mapping specifications render identical source, so they share
/// one compiled unit. Source text alone is not an identity: distinct types
/// can render under the same path. Cloning the cache shares its storage.
#[derive(Debug, Clone, Default)]
pub struct UnitCache {
	units: Arc<Mutex<FxHashMap<UnitKey, Arc<Assembly>>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct UnitKey {
	types: Vec<TypeId>,
	modules: Vec<String>,
	source: String,
}

impl UnitKey {
	fn new(spec: &MappingSpec, source: &str, references: &ReferenceSet) -> Self {
		let mut types = vec![spec.source().type_id(), spec.destination().type_id()];
		types.extend(spec.member_paths().map(|path| path.root_type().type_id()));
		Self {
			types,
			modules: references.keys().map(str::to_string).collect(),
			source: source.to_string(),
		}
	}
}

impl UnitCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.units.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.units.lock().is_empty()
	}

	pub fn clear(&self) {
		self.units.lock().clear();
	}

	/// Returns the cached unit for `source` rendered from `spec`, compiling and storing it on a miss.
	///
	/// Failed compilations are not cached.
	pub fn get_or_compile(
		&self,
		spec: &MappingSpec,
		source: &str,
		references: &ReferenceSet,
	) -> Result<Arc<Assembly>, CompileError> {
		let key = UnitKey::new(spec, source, references);
		if let Some(unit) = self.units.lock().get(&key) {
			tracing::debug!("mapping unit cache hit");
			return Ok(Arc::clone(unit));
		}

		tracing::debug!("mapping unit cache miss");
		let unit = Arc::new(compiler::compile(source, references)?);
		let mut units = self.units.lock();
		Ok(Arc::clone(units.entry(key).or_insert(unit)))
	}
}
