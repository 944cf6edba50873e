//! The binding builder.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::{BindingEntry, BindingTable, MappingSpec};
use crate::cache::UnitCache;
use crate::codegen::{self, GeneratedSource};
use crate::compiler;
use crate::config::{BuildOptions, UnresolvedPolicy};
use crate::deps::{self, ModuleReference};
use crate::error::{BuildError, ResolveError};
use crate::expr::IntoAccessor;
use crate::handle::CompiledMapping;
use crate::reflect::Reflect;
use crate::resolve::{MemberPath, resolve_as};

/// Collects bindings from `S` to `D` and compiles them into a [`CompiledMapping`].
///
/// ```ignore
/// let mapping = Mapper::<Person, PersonDto>::new()
///     .bind("|s| s.first_name", "|d| d.given_name")
///     .bind("|s| s.last_name", "|d| d.surname")
///     .build()?;
/// let dto = mapping.map(&person);
/// ```
///
/// Binding is not synchronized; callers sharing a mapper must serialize
/// `bind` calls themselves. Each `build` produces an independent handle that
/// later bindings do not affect.
pub struct Mapper<S, D> {
	bindings: BindingTable,
	options: BuildOptions,
	references: Vec<ModuleReference>,
	cache: Option<UnitCache>,
	_marker: PhantomData<fn(&S) -> D>,
}

impl<S: Reflect, D: Reflect + Default> Default for Mapper<S, D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Reflect, D: Reflect + Default> Mapper<S, D> {
	pub fn new() -> Self {
		Self {
			bindings: BindingTable::new(),
			options: BuildOptions::default(),
			references: Vec::new(),
			cache: None,
			_marker: PhantomData,
		}
	}

	pub fn with_options(mut self, options: BuildOptions) -> Self {
		self.options = options;
		self
	}

	/// Reuses compiled units from `cache` for identical specifications.
	pub fn with_cache(mut self, cache: UnitCache) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Makes an extra module visible to the generated unit.
	pub fn reference(mut self, reference: ModuleReference) -> Self {
		self.references.push(reference);
		self
	}

	/// Binds the member read by `source` to the member written by `destination`.
	///
	/// An accessor that does not resolve is still recorded and reported at
	/// build time; use [`Mapper::try_bind`] to fail immediately instead.
	pub fn bind(&mut self, source: impl IntoAccessor, destination: impl IntoAccessor) -> &mut Self {
		let (source, destination) = self.resolve_pair(source, destination);
		for err in [source.as_ref().err(), destination.as_ref().err()].into_iter().flatten() {
			tracing::warn!(error = %err, index = self.bindings.len(), "unresolved accessor in binding");
		}
		self.bindings.push(BindingEntry::new(source, destination));
		self
	}

	/// Like [`Mapper::bind`], but rejects unresolvable accessors without recording them.
	pub fn try_bind(
		&mut self,
		source: impl IntoAccessor,
		destination: impl IntoAccessor,
	) -> Result<&mut Self, ResolveError> {
		let (source, destination) = self.resolve_pair(source, destination);
		let entry = BindingEntry::new(Ok(source?), Ok(destination?));
		self.bindings.push(entry);
		Ok(self)
	}

	fn resolve_pair(
		&self,
		source: impl IntoAccessor,
		destination: impl IntoAccessor,
	) -> (Result<MemberPath, ResolveError>, Result<MemberPath, ResolveError>) {
		let source = source.into_accessor(S::type_info());
		let destination = destination.into_accessor(D::type_info());
		(
			resolve_as(&source, S::type_info()),
			resolve_as(&destination, D::type_info()),
		)
	}

	pub fn bindings(&self) -> &BindingTable {
		&self.bindings
	}

	/// Snapshot of the current bindings.
	pub fn specification(&self) -> MappingSpec {
		self.bindings.snapshot(S::type_info(), D::type_info())
	}

	/// The source the next `build` would compile.
	pub fn source_code(&self) -> GeneratedSource {
		codegen::generate(&self.specification())
	}

	/// Modules the calling program contributes: those defining `S` and `D`, plus registered extras.
	fn host_references(&self) -> Vec<ModuleReference> {
		let mut host = vec![
			ModuleReference::of_type(S::type_info()),
			ModuleReference::of_type(D::type_info()),
		];
		host.extend(self.references.iter().cloned());
		host
	}

	pub fn build(&self) -> Result<CompiledMapping<S, D>, BuildError> {
		let spec = self.specification();
		let generated = codegen::generate(&spec);
		tracing::debug!(
			source = spec.source().path(),
			destination = spec.destination().path(),
			bindings = spec.entries().len(),
			"building mapping"
		);

		if !generated.skipped.is_empty() {
			for skipped in &generated.skipped {
				tracing::warn!(index = skipped.index, reason = %skipped.reason, "malformed binding left out of mapping");
			}
			if self.options.unresolved == UnresolvedPolicy::Reject {
				return Err(BuildError::MalformedBindings(generated.skipped));
			}
		}

		if self.options.log_source {
			tracing::debug!(unit = %generated.text, "generated mapping unit");
		}

		let references = deps::resolve_references(&spec, &self.host_references());
		let assembly = match &self.cache {
			Some(cache) => cache.get_or_compile(&spec, &generated.text, &references)?,
			None => Arc::new(compiler::compile(&generated.text, &references)?),
		};
		CompiledMapping::load(assembly)
	}
}
