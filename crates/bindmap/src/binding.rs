//! Ordered binding table and the mapping specification derived from it.

use crate::error::ResolveError;
use crate::reflect::TypeInfo;
use crate::resolve::MemberPath;

/// One side of a binding; unresolved sides are kept so they can be reported at build time.
pub type BindingSide = Result<MemberPath, ResolveError>;

/// A source-to-destination pairing, in the order it was bound.
#[derive(Debug, Clone)]
pub struct BindingEntry {
	pub source: BindingSide,
	pub destination: BindingSide,
}

impl BindingEntry {
	pub fn new(source: BindingSide, destination: BindingSide) -> Self {
		Self { source, destination }
	}

	/// Both member paths, when both sides resolved.
	pub fn resolved(&self) -> Option<(&MemberPath, &MemberPath)> {
		Some((self.source.as_ref().ok()?, self.destination.as_ref().ok()?))
	}

	/// The first resolution failure, source side first.
	pub fn failure(&self) -> Option<&ResolveError> {
		self.source.as_ref().err().or_else(|| self.destination.as_ref().err())
	}
}

/// Insertion-ordered binding entries.
///
/// Not synchronized; concurrent binding on one table must be serialized by the caller.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
	entries: Vec<BindingEntry>,
}

impl BindingTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, entry: BindingEntry) {
		self.entries.push(entry);
	}

	pub fn entries(&self) -> &[BindingEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Freezes the current entries together with the two root types.
	pub fn snapshot(&self, source: &'static TypeInfo, destination: &'static TypeInfo) -> MappingSpec {
		MappingSpec {
			source,
			destination,
			entries: self.entries.clone(),
		}
	}
}

/// Everything the source generator and dependency resolver need for one build.
#[derive(Debug, Clone)]
pub struct MappingSpec {
	source: &'static TypeInfo,
	destination: &'static TypeInfo,
	entries: Vec<BindingEntry>,
}

impl MappingSpec {
	pub fn source(&self) -> &'static TypeInfo {
		self.source
	}

	pub fn destination(&self) -> &'static TypeInfo {
		self.destination
	}

	pub fn entries(&self) -> &[BindingEntry] {
		&self.entries
	}

	/// Every member path referenced by the entries, both sides, in binding order.
	pub fn member_paths(&self) -> impl Iterator<Item = &MemberPath> {
		self.entries
			.iter()
			.flat_map(|entry| [entry.source.as_ref().ok(), entry.destination.as_ref().ok()])
			.flatten()
	}
}
