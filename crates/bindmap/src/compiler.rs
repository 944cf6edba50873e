//! In-process compilation of generated mapping units.
//!
//! The compiler accepts the dialect the source generator emits: `use`
//! imports, unit structs, and impls of the mapping contract whose `map`
//! constructs a default destination, assigns members and returns it. Every
//! path is resolved against a [`ReferenceSet`]; every assignment is checked
//! against the reflected types and lowered to a pre-bound [`AssignStep`].
//! The resulting [`Assembly`] lives in memory only.
//!
//! Unlike a pass/fail compile, every problem is reported as a
//! [`Diagnostic`] with a source position.

use std::any::Any;
use std::fmt;

use proc_macro2::Span;
use quote::ToTokens;
use rustc_hash::FxHashMap;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use thiserror::Error;

use crate::deps::{MAPPING_TRAIT, ReferenceSet};
use crate::reflect::{MemberKind, MemberRoute, TypeInfo};


/// A compiler message anchored at a 1-based line and column of the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub message: String,
	pub line: usize,
	pub column: usize,
}

impl Diagnostic {
	pub fn new(message: impl Into<String>, span: Span) -> Self {
		let start = span.start();
		Self {
			message: message.into(),
			line: start.line,
			column: start.column + 1,
		}
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}: {}", self.line, self.column, self.message)
	}
}

/// A failed compilation with all diagnostics collected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_lines(.diagnostics))]
pub struct CompileError {
	pub diagnostics: Vec<Diagnostic>,
}

fn join_lines(diagnostics: &[Diagnostic]) -> String {
	diagnostics.iter().map(Diagnostic::to_string).collect::<Vec<_>>().join("\n")
}

/// One `destination.member = source.member` copy.
#[derive(Debug, Clone)]
pub struct AssignStep {
	source: MemberRoute,
	destination: MemberRoute,
}

impl AssignStep {
	pub fn source(&self) -> &MemberRoute {
		&self.source
	}

	pub fn destination(&self) -> &MemberRoute {
		&self.destination
	}

	fn apply(&self, source: &dyn Any, destination: &mut dyn Any) -> bool {
		let Some(value) = self.source.read(source) else {
			return false;
		};
		self.destination.write(destination, value)
	}
}

/// A compiled mapping type.
#[derive(Debug)]
pub struct LoadedType {
	name: String,
	source: &'static TypeInfo,
	destination: &'static TypeInfo,
	steps: Vec<AssignStep>,
}

impl LoadedType {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn source(&self) -> &'static TypeInfo {
		self.source
	}

	pub fn destination(&self) -> &'static TypeInfo {
		self.destination
	}

	pub fn steps(&self) -> &[AssignStep] {
		&self.steps
	}

	/// Runs every assignment in order. Returns `false` if a value did not
	/// fit its declared type, which type checking rules out for units built
	/// by [`compile`].
	pub fn invoke(&self, source: &dyn Any, destination: &mut dyn Any) -> bool {
		self.steps.iter().all(|step| step.apply(source, destination))
	}
}

/// The loaded output of one compilation.
#[derive(Debug)]
pub struct Assembly {
	types: Vec<LoadedType>,
}

impl Assembly {
	pub fn get_type(&self, name: &str) -> Option<&LoadedType> {
		self.types.iter().find(|ty| ty.name == name)
	}

	pub fn types(&self) -> &[LoadedType] {
		&self.types
	}
}

/// Compiles `source` against `references`.
pub fn compile(source: &str, references: &ReferenceSet) -> Result<Assembly, CompileError> {
	let file = syn::parse_file(source).map_err(|error| CompileError {
		diagnostics: vec![Diagnostic::new(error.to_string(), error.span())],
	})?;

	let mut compilation = Compilation {
		references,
		imports: FxHashMap::default(),
		structs: Vec::new(),
		diagnostics: Vec::new(),
	};
	compilation.collect_items(&file);
	let types = compilation.lower_impls(&file);

	if compilation.diagnostics.is_empty() {
		tracing::debug!(types = types.len(), "compiled mapping unit");
		Ok(Assembly { types })
	} else {
		Err(CompileError {
			diagnostics: compilation.diagnostics,
		})
	}
}

struct Compilation<'r> {
	references: &'r ReferenceSet,
	/// Local alias to fully-qualified path.
	imports: FxHashMap<String, String>,
	structs: Vec<String>,
	diagnostics: Vec<Diagnostic>,
}

fn name_of(ident: &syn::Ident) -> String {
	ident.unraw().to_string()
}

fn is_binding(expr: &syn::Expr, name: &str) -> bool {
	matches!(expr, syn::Expr::Path(path) if path.qself.is_none() && path.path.is_ident(name))
}

impl Compilation<'_> {
	fn error(&mut self, span: Span, message: impl Into<String>) {
		self.diagnostics.push(Diagnostic::new(message, span));
	}

	fn collect_items(&mut self, file: &syn::File) {
		for item in &file.items {
			match item {
				syn::Item::Use(item) => self.import(&item.tree, Vec::new()),
				syn::Item::Struct(item) => {
					if !matches!(item.fields, syn::Fields::Unit) {
						self.error(item.fields.span(), "generated types must be unit structs");
					}
					self.structs.push(name_of(&item.ident));
				}
				syn::Item::Impl(_) => {}
				other => self.error(other.span(), "unsupported item in generated unit"),
			}
		}
	}

	fn import(&mut self, tree: &syn::UseTree, prefix: Vec<String>) {
		match tree {
			syn::UseTree::Path(path) => {
				let mut prefix = prefix;
				prefix.push(name_of(&path.ident));
				self.import(&path.tree, prefix);
			}
			syn::UseTree::Name(name) => {
				let mut full = prefix;
				full.push(name_of(&name.ident));
				self.bind_import(name_of(&name.ident), full.join("::"), name.span());
			}
			syn::UseTree::Rename(rename) => {
				let mut full = prefix;
				full.push(name_of(&rename.ident));
				self.bind_import(name_of(&rename.rename), full.join("::"), rename.span());
			}
			syn::UseTree::Group(group) => {
				for tree in &group.items {
					self.import(tree, prefix.clone());
				}
			}
			syn::UseTree::Glob(glob) => self.error(glob.span(), "glob imports are not supported in generated units"),
		}
	}

	fn bind_import(&mut self, alias: String, path: String, span: Span) {
		if self.references.has_trait(&path) || self.references.find_type(&path).is_some() {
			self.imports.insert(alias, path);
		} else {
			self.error(span, format!("unresolved import `{path}`: no referenced module exports it"));
		}
	}

	/// Expands a single-segment path through the imports.
	fn qualify(&self, segments: &[String]) -> String {
		if let [single] = segments
			&& let Some(path) = self.imports.get(single)
		{
			return path.clone();
		}
		segments.join("::")
	}

	fn lookup_type(&mut self, path: &str, span: Span) -> Option<&'static TypeInfo> {
		let found = self.references.find_type(path);
		if found.is_none() {
			self.error(span, format!("cannot find type `{path}` in any referenced module"));
		}
		found
	}

	fn resolve_type(&mut self, ty: &syn::Type) -> Option<&'static TypeInfo> {
		let syn::Type::Path(path) = ty else {
			self.error(ty.span(), format!("unsupported type `{}`", ty.to_token_stream()));
			return None;
		};
		if path.qself.is_some() || path.path.segments.iter().any(|segment| !segment.arguments.is_none()) {
			self.error(ty.span(), format!("unsupported type `{}`", ty.to_token_stream()));
			return None;
		}
		let segments = path.path.segments.iter().map(|segment| name_of(&segment.ident)).collect::<Vec<_>>();
		let name = self.qualify(&segments);
		self.lookup_type(&name, ty.span())
	}

	fn lower_impls(&mut self, file: &syn::File) -> Vec<LoadedType> {
		file.items
			.iter()
			.filter_map(|item| match item {
				syn::Item::Impl(item) => self.lower_impl(item),
				_ => None,
			})
			.collect()
	}

	fn lower_impl(&mut self, item: &syn::ItemImpl) -> Option<LoadedType> {
		let Some((_, trait_path, _)) = &item.trait_ else {
			self.error(item.self_ty.span(), "inherent impls are not supported in generated units");
			return None;
		};

		let self_name = match &*item.self_ty {
			syn::Type::Path(path) if path.qself.is_none() => path.path.get_ident().map(name_of),
			_ => None,
		};
		let Some(self_name) = self_name else {
			self.error(item.self_ty.span(), "mapping impls must target a type declared in the unit");
			return None;
		};
		if !self.structs.contains(&self_name) {
			self.error(item.self_ty.span(), format!("cannot find type `{self_name}` in this unit"));
			return None;
		}

		let segments = trait_path.segments.iter().map(|segment| name_of(&segment.ident)).collect::<Vec<_>>();
		let trait_name = self.qualify(&segments);
		if !self.references.has_trait(&trait_name) {
			self.error(trait_path.span(), format!("cannot find trait `{trait_name}` in any referenced module"));
			return None;
		}
		if trait_name != MAPPING_TRAIT {
			self.error(trait_path.span(), format!("`{trait_name}` is not the mapping contract `{MAPPING_TRAIT}`"));
			return None;
		}

		let last = trait_path.segments.last()?;
		let arguments = match &last.arguments {
			syn::PathArguments::AngleBracketed(arguments) => arguments.args.iter().collect::<Vec<_>>(),
			_ => Vec::new(),
		};
		let [syn::GenericArgument::Type(source_ty), syn::GenericArgument::Type(destination_ty)] = arguments[..] else {
			self.error(last.span(), "the mapping contract takes a source and a destination type");
			return None;
		};
		let source = self.resolve_type(source_ty);
		let destination = self.resolve_type(destination_ty);
		let (Some(source), Some(destination)) = (source, destination) else {
			return None;
		};

		let mut map_fn = None;
		for impl_item in &item.items {
			match impl_item {
				syn::ImplItem::Fn(function) if function.sig.ident == "map" => {
					if map_fn.replace(function).is_some() {
						self.error(function.sig.ident.span(), "duplicate definition of `map`");
					}
				}
				other => self.error(other.span(), "unexpected item in mapping impl"),
			}
		}
		let Some(map_fn) = map_fn else {
			self.error(item.span(), "mapping impl is missing `map`");
			return None;
		};

		let steps = self.lower_map(map_fn, source, destination)?;
		Some(LoadedType {
			name: self_name,
			source,
			destination,
			steps,
		})
	}

	fn lower_map(
		&mut self,
		function: &syn::ImplItemFn,
		source: &'static TypeInfo,
		destination: &'static TypeInfo,
	) -> Option<Vec<AssignStep>> {
		let sig = &function.sig;
		let inputs = sig.inputs.iter().collect::<Vec<_>>();
		let [syn::FnArg::Receiver(receiver), syn::FnArg::Typed(param)] = inputs[..] else {
			self.error(sig.span(), "`map` must take `&self` and the source");
			return None;
		};
		if receiver.reference.is_none() || receiver.mutability.is_some() {
			self.error(receiver.span(), "`map` must take `&self`");
		}

		let syn::Pat::Ident(param_pat) = &*param.pat else {
			self.error(param.pat.span(), "the source parameter must be a plain binding");
			return None;
		};
		let input = name_of(&param_pat.ident);

		match &*param.ty {
			syn::Type::Reference(reference) if reference.mutability.is_none() => {
				if let Some(found) = self.resolve_type(&reference.elem)
					&& found != source
				{
					self.error(
						reference.elem.span(),
						format!("expected `&{}`, found `&{}`", source.path(), found.path()),
					);
				}
			}
			other => self.error(other.span(), "the source must be taken by shared reference"),
		}

		match &sig.output {
			syn::ReturnType::Type(_, ty) => {
				if let Some(found) = self.resolve_type(ty)
					&& found != destination
				{
					self.error(ty.span(), format!("expected `{}`, found `{}`", destination.path(), found.path()));
				}
			}
			syn::ReturnType::Default => self.error(sig.span(), "`map` must return the destination type"),
		}

		let stmts = &function.block.stmts;
		let Some((first, rest)) = stmts.split_first() else {
			self.error(function.block.span(), "`map` body is empty");
			return None;
		};
		let output = self.lower_construct(first, destination)?;
		let Some((last, assignments)) = rest.split_last() else {
			self.error(function.block.span(), format!("`map` must end by returning `{output}`"));
			return None;
		};

		let steps = assignments
			.iter()
			.filter_map(|stmt| self.lower_assignment(stmt, &input, &output, source, destination))
			.collect();

		if !matches!(last, syn::Stmt::Expr(expr, None) if is_binding(expr, &output)) {
			self.error(last.span(), format!("`map` must end by returning `{output}`"));
		}
		Some(steps)
	}

	/// `let mut <name> = <Destination>::default();`, yielding `<name>`.
	fn lower_construct(&mut self, stmt: &syn::Stmt, destination: &'static TypeInfo) -> Option<String> {
		let expected = "expected `let mut <name> = <Destination>::default();`";
		let syn::Stmt::Local(local) = stmt else {
			self.error(stmt.span(), expected);
			return None;
		};
		let syn::Pat::Ident(pat) = &local.pat else {
			self.error(local.pat.span(), expected);
			return None;
		};
		if pat.mutability.is_none() {
			self.error(pat.span(), "the destination binding must be mutable");
		}

		let call = match local.init.as_ref().map(|init| (&*init.expr, init.diverge.is_some())) {
			Some((syn::Expr::Call(call), false)) if call.args.is_empty() => call,
			_ => {
				self.error(stmt.span(), expected);
				return None;
			}
		};
		let segments = match &*call.func {
			syn::Expr::Path(path) if path.qself.is_none() => path
				.path
				.segments
				.iter()
				.map(|segment| name_of(&segment.ident))
				.collect::<Vec<_>>(),
			_ => Vec::new(),
		};
		let Some((constructor, type_segments)) = segments.split_last() else {
			self.error(call.func.span(), expected);
			return None;
		};
		if constructor != "default" || type_segments.is_empty() {
			self.error(call.func.span(), expected);
			return None;
		}

		let type_path = self.qualify(type_segments);
		let found = self.lookup_type(&type_path, call.func.span())?;
		if found != destination {
			self.error(
				call.func.span(),
				format!("expected `{}` to be constructed, found `{}`", destination.path(), found.path()),
			);
		}
		Some(name_of(&pat.ident))
	}

	/// `<output>.<field> = <input>.<field>.clone();` or `<output>.<field> = <input>.<method>();`
	fn lower_assignment(
		&mut self,
		stmt: &syn::Stmt,
		input: &str,
		output: &str,
		source: &'static TypeInfo,
		destination: &'static TypeInfo,
	) -> Option<AssignStep> {
		let syn::Stmt::Expr(syn::Expr::Assign(assign), Some(_)) = stmt else {
			self.error(stmt.span(), "expected a member assignment");
			return None;
		};

		let target = match &*assign.left {
			syn::Expr::Field(field) if is_binding(&field.base, output) => match &field.member {
				syn::Member::Named(ident) => Some((name_of(ident), ident.span())),
				syn::Member::Unnamed(_) => None,
			},
			_ => None,
		};
		let Some((target, target_span)) = target else {
			self.error(assign.left.span(), format!("assignments must target a field of `{output}`"));
			return None;
		};
		let Some(destination_route) = destination.find_member(&target) else {
			self.error(target_span, format!("no field `{target}` on type `{}`", destination.path()));
			return None;
		};
		if !destination_route.member().is_assignable() {
			self.error(
				target_span,
				format!("cannot assign to method `{target}` of `{}`", destination.path()),
			);
			return None;
		}

		let Some((read, kind, read_span)) = source_read(&assign.right, input) else {
			self.error(
				assign.right.span(),
				format!("expected `{input}.<field>.clone()` or `{input}.<method>()`"),
			);
			return None;
		};
		let Some(source_route) = source.find_member(&read) else {
			let noun = match kind {
				MemberKind::Field => "field",
				MemberKind::Method => "method",
			};
			self.error(read_span, format!("no {noun} `{read}` on type `{}`", source.path()));
			return None;
		};
		if source_route.member().kind() != kind {
			let message = match kind {
				MemberKind::Field => format!("`{read}` on `{}` is a method, not a field", source.path()),
				MemberKind::Method => format!("`{read}` on `{}` is a field, not a method", source.path()),
			};
			self.error(read_span, message);
			return None;
		}

		if source_route.member().value_type() != destination_route.member().value_type() {
			self.error(
				assign.span(),
				format!(
					"mismatched types: `{output}.{target}` is `{}` but `{input}.{read}` is `{}`",
					destination_route.member().value_type_name(),
					source_route.member().value_type_name(),
				),
			);
			return None;
		}

		Some(AssignStep {
			source: source_route,
			destination: destination_route,
		})
	}
}

/// Recognizes the two read shapes, returning the member name and kind.
fn source_read(expr: &syn::Expr, input: &str) -> Option<(String, MemberKind, Span)> {
	let syn::Expr::MethodCall(call) = expr else {
		return None;
	};
	if !call.args.is_empty() || call.turbofish.is_some() {
		return None;
	}
	match &*call.receiver {
		syn::Expr::Field(field) if call.method == "clone" && is_binding(&field.base, input) => match &field.member {
			syn::Member::Named(ident) => Some((name_of(ident), MemberKind::Field, ident.span())),
			syn::Member::Unnamed(_) => None,
		},
		receiver if is_binding(receiver, input) => Some((name_of(&call.method), MemberKind::Method, call.method.span())),
		_ => None,
	}
}
