//! Error types for binding, building and configuration.

use thiserror::Error;

use crate::codegen::SkippedBinding;
use crate::compiler::CompileError;

/// An accessor that does not reduce to a member path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
	/// The expression contains a node other than member access, method call or conversion.
	#[error("accessor `{accessor}` is not a member access chain (unsupported `{node}`)")]
	UnsupportedNode {
		/// The accessor as written.
		accessor: String,
		/// Rendering of the offending node.
		node: String,
	},

	/// The accessor is rooted at a different type than the side it was bound to.
	#[error("accessor `{accessor}` takes `{found}`, expected `{expected}`")]
	ParameterMismatch {
		/// The accessor as written.
		accessor: String,
		/// Path of the type the binding side requires.
		expected: String,
		/// Path of the accessor's parameter type.
		found: String,
	},

	/// The expression reaches the parameter without reading any member.
	#[error("accessor `{accessor}` does not read a member")]
	NoMember {
		/// The accessor as written.
		accessor: String,
	},
}

/// Errors that can occur when building a mapping.
#[derive(Debug, Error)]
pub enum BuildError {
	/// One or more bindings have an unresolved side.
	#[error("{} malformed binding(s); first: {}", .0.len(), first_reason(.0))]
	MalformedBindings(Vec<SkippedBinding>),

	/// The generated unit failed to compile.
	#[error("generated mapping failed to compile:\n{0}")]
	Compilation(#[from] CompileError),

	/// The compiled unit does not expose the expected type.
	#[error("compiled unit does not define `{name}`")]
	MissingGeneratedType {
		/// The fixed name that was looked up.
		name: String,
	},

	/// The compiled type maps between different types than the builder.
	#[error("compiled unit maps `{found}`, expected `{expected}`")]
	ContractMismatch {
		/// Source and destination the builder was created for.
		expected: String,
		/// Source and destination the compiled type implements.
		found: String,
	},
}

fn first_reason(skipped: &[SkippedBinding]) -> String {
	skipped.first().map(|s| s.to_string()).unwrap_or_default()
}

/// Errors that can occur when loading build options.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or an unknown key.
	#[error("invalid build options: {0}")]
	Toml(#[from] toml::de::Error),
}
