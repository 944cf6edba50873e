//! Source generation for mapping units.
//!
//! Renders a [`MappingSpec`] into the text of one self-contained Rust unit:
//! a unit struct named [`GENERATED_TYPE_NAME`] implementing the mapping
//! contract, whose `map` builds a default destination and copies each bound
//! member in binding order. Output is a pure function of the specification.

use std::fmt;

use crate::binding::MappingSpec;
use crate::deps::MAPPING_TRAIT;
use crate::error::ResolveError;
use crate::reflect::MemberKind;

#[cfg(test)]
mod tests;

/// Name of the type every generated unit defines.
pub const GENERATED_TYPE_NAME: &str = "GeneratedMapping";
/// Name of the source parameter inside the generated `map`.
pub const SOURCE_BINDING: &str = "t1";
/// Name of the destination local inside the generated `map`.
pub const OUTPUT_BINDING: &str = "t2";

/// A binding left out of the generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBinding {
	/// Position of the entry in the binding table.
	pub index: usize,
	pub reason: ResolveError,
}

impl fmt::Display for SkippedBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "binding #{}: {}", self.index, self.reason)
	}
}

/// Generated source text plus the bindings that could not be rendered.
#[derive(Debug, Clone)]
pub struct GeneratedSource {
	pub text: String,
	pub skipped: Vec<SkippedBinding>,
}

pub fn generate(spec: &MappingSpec) -> GeneratedSource {
	let skipped = spec
		.entries()
		.iter()
		.enumerate()
		.filter_map(|(index, entry)| {
			entry.failure().map(|reason| SkippedBinding {
				index,
				reason: reason.clone(),
			})
		})
		.collect();

	GeneratedSource {
		text: Unit(spec).to_string(),
		skipped,
	}
}

struct Unit<'a>(&'a MappingSpec);

impl fmt::Display for Unit<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let spec = self.0;
		let source = spec.source().path();
		let destination = spec.destination().path();

		writeln!(f, "// @generated by bindmap: {source} -> {destination}")?;
		writeln!(f, "use {MAPPING_TRAIT};")?;
		writeln!(f)?;
		writeln!(f, "pub struct {GENERATED_TYPE_NAME};")?;
		writeln!(f)?;
		writeln!(f, "impl Mapping<{source}, {destination}> for {GENERATED_TYPE_NAME} {{")?;
		writeln!(f, "\tfn map(&self, {SOURCE_BINDING}: &{source}) -> {destination} {{")?;
		writeln!(f, "\t\tlet mut {OUTPUT_BINDING} = {destination}::default();")?;

		for (source_path, destination_path) in spec.entries().iter().filter_map(|entry| entry.resolved()) {
			let target = Ident(destination_path.terminal().name());
			let member = source_path.terminal();
			let read = Ident(member.name());
			match member.kind() {
				MemberKind::Field => writeln!(f, "\t\t{OUTPUT_BINDING}.{target} = {SOURCE_BINDING}.{read}.clone();")?,
				MemberKind::Method => writeln!(f, "\t\t{OUTPUT_BINDING}.{target} = {SOURCE_BINDING}.{read}();")?,
			}
		}

		writeln!(f, "\t\t{OUTPUT_BINDING}")?;
		writeln!(f, "\t}}")?;
		writeln!(f, "}}")
	}
}

/// A member name, written as a raw identifier when it collides with a keyword.
struct Ident<'a>(&'a str);

impl fmt::Display for Ident<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if syn::parse_str::<syn::Ident>(self.0).is_ok() {
			f.write_str(self.0)
		} else {
			write!(f, "r#{}", self.0)
		}
	}
}
