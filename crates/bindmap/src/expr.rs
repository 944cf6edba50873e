//! Accessor expressions.
//!
//! An [`Accessor`] is a one-parameter lambda whose body is a small tagged
//! expression tree. Nodes that name members are resolved against the
//! parameter's [`TypeInfo`] while the tree is built, so a finished tree only
//! holds `Member`/`Call` nodes for members that actually exist; anything else
//! becomes [`Expr::Other`].

use std::fmt;

use quote::ToTokens;
use syn::ext::IdentExt;

use crate::reflect::{MemberInfo, MemberKind, TypeInfo};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
pub enum Expr {
	/// Type conversion (`operand as target`).
	Convert { operand: Box<Expr>, target: String },
	/// Field read on `receiver`.
	Member {
		receiver: Box<Expr>,
		member: &'static MemberInfo,
		declaring: &'static TypeInfo,
	},
	/// Zero-argument method call on `receiver`.
	Call {
		receiver: Box<Expr>,
		method: &'static MemberInfo,
		declaring: &'static TypeInfo,
	},
	/// The lambda parameter.
	Parameter { name: String, ty: &'static TypeInfo },
	/// Any shape that is not a member chain, kept as rendered source.
	Other(String),
}

impl Expr {
	pub fn parameter(name: impl Into<String>, ty: &'static TypeInfo) -> Self {
		Self::Parameter { name: name.into(), ty }
	}

	/// Descriptor of the value this node evaluates to, when it is reflected.
	pub fn value_type(&self) -> Option<&'static TypeInfo> {
		match self {
			Self::Parameter { ty, .. } => Some(*ty),
			Self::Member { member, .. } | Self::Call { method: member, .. } => member.nested_type(),
			Self::Convert { .. } | Self::Other(_) => None,
		}
	}

	/// Reads field `name` from this node.
	pub fn member(self, name: &str) -> Self {
		match self.lookup(name, MemberKind::Field) {
			Some((member, declaring)) => Self::Member {
				receiver: Box::new(self),
				member,
				declaring,
			},
			None => Self::Other(format!("{self}.{name}")),
		}
	}

	/// Calls zero-argument method `name` on this node.
	pub fn call(self, name: &str) -> Self {
		match self.lookup(name, MemberKind::Method) {
			Some((method, declaring)) => Self::Call {
				receiver: Box::new(self),
				method,
				declaring,
			},
			None => Self::Other(format!("{self}.{name}()")),
		}
	}

	pub fn convert(self, target: impl Into<String>) -> Self {
		Self::Convert {
			operand: Box::new(self),
			target: target.into(),
		}
	}

	fn lookup(&self, name: &str, kind: MemberKind) -> Option<(&'static MemberInfo, &'static TypeInfo)> {
		let route = self.value_type()?.find_member(name)?;
		(route.member().kind() == kind).then(|| (route.member(), route.declaring()))
	}
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Convert { operand, target } => write!(f, "({operand} as {target})"),
			Self::Member { receiver, member, .. } => write!(f, "{receiver}.{}", member.name()),
			Self::Call { receiver, method, .. } => write!(f, "{receiver}.{}()", method.name()),
			Self::Parameter { name, .. } => f.write_str(name),
			Self::Other(text) => f.write_str(text),
		}
	}
}

/// A lambda `|param| body` rooted at a reflected parameter type.
#[derive(Debug, Clone)]
pub struct Accessor {
	parameter: &'static TypeInfo,
	param_name: String,
	body: Expr,
}

impl Accessor {
	/// Builds an accessor programmatically; `body` receives the parameter node.
	///
	/// ```ignore
	/// let accessor = Accessor::new(Person::type_info(), "p", |p| p.member("address").member("city"));
	/// ```
	pub fn new(parameter: &'static TypeInfo, param_name: impl Into<String>, body: impl FnOnce(Expr) -> Expr) -> Self {
		let param_name = param_name.into();
		let body = body(Expr::parameter(param_name.clone(), parameter));
		Self {
			parameter,
			param_name,
			body,
		}
	}

	/// Parses Rust closure text such as `|s| s.address.city` against `parameter`.
	///
	/// Parse failures and unknown members are not errors here; they surface as
	/// [`Expr::Other`] nodes and are reported when the accessor is resolved.
	pub fn parse(text: &str, parameter: &'static TypeInfo) -> Self {
		let closure = match syn::parse_str::<syn::Expr>(text) {
			Ok(syn::Expr::Closure(closure)) => closure,
			Ok(other) => return Self::opaque(parameter, other.to_token_stream().to_string()),
			Err(_) => return Self::opaque(parameter, text.trim().to_string()),
		};

		let [input] = closure.inputs.iter().collect::<Vec<_>>()[..] else {
			return Self::opaque(parameter, closure.to_token_stream().to_string());
		};
		let (ident, annotation) = match input {
			syn::Pat::Ident(pat) => (&pat.ident, None),
			syn::Pat::Type(typed) => match &*typed.pat {
				syn::Pat::Ident(pat) => (&pat.ident, Some(&*typed.ty)),
				_ => return Self::opaque(parameter, closure.to_token_stream().to_string()),
			},
			_ => return Self::opaque(parameter, closure.to_token_stream().to_string()),
		};
		if let Some(ty) = annotation
			&& !annotation_matches(ty, parameter)
		{
			return Self::opaque(parameter, closure.to_token_stream().to_string());
		}

		let param_name = ident.unraw().to_string();
		let body = lower(&closure.body, &param_name, parameter);
		Self {
			parameter,
			param_name,
			body,
		}
	}

	fn opaque(parameter: &'static TypeInfo, text: String) -> Self {
		Self {
			parameter,
			param_name: "_".to_string(),
			body: Expr::Other(text),
		}
	}

	pub fn parameter(&self) -> &'static TypeInfo {
		self.parameter
	}

	pub fn body(&self) -> &Expr {
		&self.body
	}
}

impl fmt::Display for Accessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "|{}| {}", self.param_name, self.body)
	}
}

/// Accepts `Param`, a path ending in `Param`, or a shared reference to either.
fn annotation_matches(ty: &syn::Type, parameter: &TypeInfo) -> bool {
	match ty {
		syn::Type::Reference(reference) if reference.mutability.is_none() => {
			!matches!(&*reference.elem, syn::Type::Reference(_)) && annotation_matches(&reference.elem, parameter)
		}
		syn::Type::Path(path) if path.qself.is_none() => path
			.path
			.segments
			.last()
			.is_some_and(|segment| segment.arguments.is_none() && segment.ident == parameter.name()),
		_ => false,
	}
}

fn lower(expr: &syn::Expr, param: &str, parameter: &'static TypeInfo) -> Expr {
	match expr {
		syn::Expr::Paren(inner) => lower(&inner.expr, param, parameter),
		syn::Expr::Group(inner) => lower(&inner.expr, param, parameter),
		syn::Expr::Cast(cast) => lower(&cast.expr, param, parameter).convert(cast.ty.to_token_stream().to_string()),
		syn::Expr::Field(field) => match &field.member {
			syn::Member::Named(ident) => lower(&field.base, param, parameter).member(&ident.unraw().to_string()),
			syn::Member::Unnamed(_) => Expr::Other(expr.to_token_stream().to_string()),
		},
		syn::Expr::MethodCall(call) if call.args.is_empty() && call.turbofish.is_none() => {
			lower(&call.receiver, param, parameter).call(&call.method.unraw().to_string())
		}
		syn::Expr::Path(path) if path.qself.is_none() && path.path.is_ident(param) => Expr::parameter(param, parameter),
		other => Expr::Other(other.to_token_stream().to_string()),
	}
}

/// Conversion into an [`Accessor`] rooted at a given parameter type.
pub trait IntoAccessor {
	fn into_accessor(self, parameter: &'static TypeInfo) -> Accessor;
}

/// Kept as built; binding checks its parameter type against the bound side.
impl IntoAccessor for Accessor {
	fn into_accessor(self, _parameter: &'static TypeInfo) -> Accessor {
		self
	}
}

impl IntoAccessor for &str {
	fn into_accessor(self, parameter: &'static TypeInfo) -> Accessor {
		Accessor::parse(self, parameter)
	}
}

impl IntoAccessor for String {
	fn into_accessor(self, parameter: &'static TypeInfo) -> Accessor {
		Accessor::parse(&self, parameter)
	}
}
