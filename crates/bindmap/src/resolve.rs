//! Reduction of accessor expressions to member paths.

use std::fmt;

use crate::error::ResolveError;
use crate::expr::{Accessor, Expr};
use crate::reflect::{MemberInfo, TypeInfo};


/// A member reachable from a root type.
///
/// `path` holds the intermediate hops in root-to-member order and is empty
/// for single-hop accessors. Code generation only uses `terminal`; `path` is
/// kept for diagnostics.
#[derive(Debug, Clone)]
pub struct MemberPath {
	root_type: &'static TypeInfo,
	terminal: &'static MemberInfo,
	path: String,
}

impl MemberPath {
	pub fn root_type(&self) -> &'static TypeInfo {
		self.root_type
	}

	pub fn terminal(&self) -> &'static MemberInfo {
		self.terminal
	}

	pub fn path(&self) -> &str {
		&self.path
	}
}

impl fmt::Display for MemberPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.path.is_empty() {
			write!(f, "{}::{}", self.root_type.name(), self.terminal.name())
		} else {
			write!(f, "{}::{}.{}", self.root_type.name(), self.path, self.terminal.name())
		}
	}
}

/// Resolves `accessor` as one side of a binding whose parameter must be `parameter`.
pub fn resolve_as(accessor: &Accessor, parameter: &'static TypeInfo) -> Result<MemberPath, ResolveError> {
	if accessor.parameter() != parameter {
		return Err(ResolveError::ParameterMismatch {
			accessor: accessor.to_string(),
			expected: parameter.path().to_string(),
			found: accessor.parameter().path().to_string(),
		});
	}
	resolve(accessor)
}

/// Walks `accessor` from its outermost node down to the parameter.
///
/// The first member met is the terminal member; every later one is prepended
/// to the path. Each hop provisionally sets the root type to the hop's
/// declaring type, and reaching the parameter replaces it with the
/// parameter's own type, which is what makes members inherited from a base
/// resolve against the derived type.
pub fn resolve(accessor: &Accessor) -> Result<MemberPath, ResolveError> {
	let mut node = accessor.body();
	let mut terminal: Option<&'static MemberInfo> = None;
	let mut root_type: Option<&'static TypeInfo> = None;
	let mut path = String::new();

	loop {
		match node {
			Expr::Convert { operand, .. } => node = operand.as_ref(),
			Expr::Member {
				receiver,
				member,
				declaring,
			}
			| Expr::Call {
				receiver,
				method: member,
				declaring,
			} => {
				if terminal.is_none() {
					terminal = Some(*member);
				} else if path.is_empty() {
					path = member.name().to_string();
				} else {
					path = format!("{}.{path}", member.name());
				}
				root_type = Some(*declaring);
				node = receiver.as_ref();
			}
			Expr::Parameter { ty, .. } => {
				root_type = Some(*ty);
				break;
			}
			Expr::Other(shape) => {
				return Err(ResolveError::UnsupportedNode {
					accessor: accessor.to_string(),
					node: shape.clone(),
				});
			}
		}
	}

	match (terminal, root_type) {
		(Some(terminal), Some(root_type)) => Ok(MemberPath {
			root_type,
			terminal,
			path,
		}),
		_ => Err(ResolveError::NoMember {
			accessor: accessor.to_string(),
		}),
	}
}
