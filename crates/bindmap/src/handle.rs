//! The caller-facing mapping contract and its compiled implementation.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::codegen::GENERATED_TYPE_NAME;
use crate::compiler::{Assembly, LoadedType};
use crate::error::BuildError;
use crate::reflect::Reflect;

/// Maps one `S` to a freshly constructed `D`.
pub trait Mapping<S, D> {
	fn map(&self, source: &S) -> D;
}

/// A mapping backed by a compiled unit.
///
/// Holds only immutable state, so one handle can serve concurrent callers.
pub struct CompiledMapping<S, D> {
	assembly: Arc<Assembly>,
	index: usize,
	_marker: PhantomData<fn(&S) -> D>,
}

impl<S: Reflect, D: Reflect> CompiledMapping<S, D> {
	/// Locates the generated type in `assembly` and checks it maps `S` to `D`.
	pub(crate) fn load(assembly: Arc<Assembly>) -> Result<Self, BuildError> {
		let Some(index) = assembly.types().iter().position(|ty| ty.name() == GENERATED_TYPE_NAME) else {
			return Err(BuildError::MissingGeneratedType {
				name: GENERATED_TYPE_NAME.to_string(),
			});
		};

		let loaded = &assembly.types()[index];
		if loaded.source().type_id() != TypeId::of::<S>() || loaded.destination().type_id() != TypeId::of::<D>() {
			return Err(BuildError::ContractMismatch {
				expected: format!("{} -> {}", S::type_info().path(), D::type_info().path()),
				found: format!("{} -> {}", loaded.source().path(), loaded.destination().path()),
			});
		}

		Ok(Self {
			assembly,
			index,
			_marker: PhantomData,
		})
	}
}

impl<S, D> CompiledMapping<S, D> {
	fn unit(&self) -> &LoadedType {
		&self.assembly.types()[self.index]
	}

	/// Number of member assignments performed per call.
	pub fn assignments(&self) -> usize {
		self.unit().steps().len()
	}

	/// Whether both handles run the same compiled unit.
	pub fn shares_unit_with(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.assembly, &other.assembly)
	}
}

impl<S: 'static, D: Default + 'static> Mapping<S, D> for CompiledMapping<S, D> {
	fn map(&self, source: &S) -> D {
		let mut destination = D::default();
		let applied = self.unit().invoke(source, &mut destination);
		debug_assert!(applied, "type-checked mapping unit failed to apply");
		destination
	}
}

impl<S, D> Clone for CompiledMapping<S, D> {
	fn clone(&self) -> Self {
		Self {
			assembly: Arc::clone(&self.assembly),
			index: self.index,
			_marker: PhantomData,
		}
	}
}

impl<S, D> fmt::Debug for CompiledMapping<S, D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let unit = self.unit();
		f.debug_struct("CompiledMapping")
			.field("source", &unit.source().path())
			.field("destination", &unit.destination().path())
			.field("assignments", &unit.steps().len())
			.finish()
	}
}
