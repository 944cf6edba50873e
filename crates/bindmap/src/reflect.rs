//! Static type descriptors.
//!
//! Rust has no runtime reflection, so every type taking part in a mapping
//! carries a [`TypeInfo`] table, normally generated by `#[derive(Reflect)]`.
//! The table lists members together with pre-bound, type-erased accessors so
//! compiled mappings can read and write fields without knowing the concrete
//! types at the call site.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;


/// A type that exposes a static descriptor.
pub trait Reflect: Any {
	/// Returns the descriptor for `Self`. Built once, on first use.
	fn type_info() -> &'static TypeInfo;
}

/// The compiled module (crate) that defines a type or trait.
///
/// Identity is the crate name; the manifest location is carried when known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleInfo {
	name: String,
	location: Option<String>,
}

impl ModuleInfo {
	pub fn new(name: impl Into<String>, location: Option<String>) -> Self {
		Self {
			name: name.into(),
			location,
		}
	}

	/// Builds the module for an item declared at `module_path` inside the crate rooted at `location`.
	pub fn from_module_path(module_path: &str, location: &str) -> Self {
		Self::new(crate_of(module_path), Some(location.to_string()))
	}

	/// Derives the module from a fully-qualified type path such as `core::fmt::Debug`.
	pub fn of_path(path: &str) -> Self {
		Self::new(crate_of(path), None)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn location(&self) -> Option<&str> {
		self.location.as_deref()
	}

	/// Deduplication key.
	pub fn key(&self) -> &str {
		&self.name
	}
}

fn crate_of(path: &str) -> &str {
	let path = path.trim_start_matches("dyn ").trim_start_matches("::");
	path.split("::").next().unwrap_or(path)
}

/// A trait implemented by a reflected type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceInfo {
	path: String,
	module: ModuleInfo,
}

impl InterfaceInfo {
	/// Describes the trait behind the trait object type `I` (e.g. `dyn Named`).
	pub fn of<I: ?Sized + 'static>() -> Self {
		let path = type_name::<I>().trim_start_matches("dyn ").to_string();
		let module = ModuleInfo::of_path(&path);
		Self { path, module }
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn module(&self) -> &ModuleInfo {
		&self.module
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
	Field,
	Method,
}

/// Type-erased access to one member of a reflected value.
trait MemberAccess: Send + Sync {
	fn read(&self, target: &dyn Any) -> Option<Box<dyn Any>>;

	fn write(&self, _target: &mut dyn Any, _value: Box<dyn Any>) -> bool {
		false
	}
}

struct FieldAccess<T, V> {
	get: fn(&T) -> &V,
	get_mut: fn(&mut T) -> &mut V,
}

impl<T: Any, V: Any + Clone> MemberAccess for FieldAccess<T, V> {
	fn read(&self, target: &dyn Any) -> Option<Box<dyn Any>> {
		let this = target.downcast_ref::<T>()?;
		Some(Box::new((self.get)(this).clone()) as Box<dyn Any>)
	}

	fn write(&self, target: &mut dyn Any, value: Box<dyn Any>) -> bool {
		let (Some(this), Ok(value)) = (target.downcast_mut::<T>(), value.downcast::<V>()) else {
			return false;
		};
		*(self.get_mut)(this) = *value;
		true
	}
}

struct MethodAccess<T, V> {
	call: fn(&T) -> V,
}

impl<T: Any, V: Any> MemberAccess for MethodAccess<T, V> {
	fn read(&self, target: &dyn Any) -> Option<Box<dyn Any>> {
		let this = target.downcast_ref::<T>()?;
		Some(Box::new((self.call)(this)) as Box<dyn Any>)
	}
}

/// A field or zero-argument method declared on a reflected type.
pub struct MemberInfo {
	name: &'static str,
	kind: MemberKind,
	value_type: TypeId,
	value_type_name: &'static str,
	nested: Option<fn() -> &'static TypeInfo>,
	access: Box<dyn MemberAccess>,
}

impl MemberInfo {
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn kind(&self) -> MemberKind {
		self.kind
	}

	/// `TypeId` of the value the member yields.
	pub fn value_type(&self) -> TypeId {
		self.value_type
	}

	pub fn value_type_name(&self) -> &'static str {
		self.value_type_name
	}

	/// Descriptor of the member's value type, when that type is itself reflected.
	pub fn nested_type(&self) -> Option<&'static TypeInfo> {
		self.nested.map(|info| info())
	}

	/// Only fields accept writes.
	pub fn is_assignable(&self) -> bool {
		self.kind == MemberKind::Field
	}

	pub fn read(&self, target: &dyn Any) -> Option<Box<dyn Any>> {
		self.access.read(target)
	}

	pub fn write(&self, target: &mut dyn Any, value: Box<dyn Any>) -> bool {
		self.access.write(target, value)
	}
}

impl fmt::Debug for MemberInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemberInfo")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("value_type", &self.value_type_name)
			.finish()
	}
}

/// Borrows an embedded base value out of its derived value.
trait Projection: Send + Sync {
	fn project<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any>;
	fn project_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

struct FieldProjection<T, B> {
	get: fn(&T) -> &B,
	get_mut: fn(&mut T) -> &mut B,
}

impl<T: Any, B: Any> Projection for FieldProjection<T, B> {
	fn project<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any> {
		let this = target.downcast_ref::<T>()?;
		Some((self.get)(this) as &dyn Any)
	}

	fn project_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
		let this = target.downcast_mut::<T>()?;
		Some((self.get_mut)(this) as &mut dyn Any)
	}
}

/// Link from a derived type to its base type.
pub struct BaseLink {
	info: fn() -> &'static TypeInfo,
	projection: Box<dyn Projection>,
}

impl BaseLink {
	pub fn info(&self) -> &'static TypeInfo {
		(self.info)()
	}

	pub fn project<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any> {
		self.projection.project(target)
	}

	pub fn project_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
		self.projection.project_mut(target)
	}
}

impl fmt::Debug for BaseLink {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("BaseLink").field(&self.info().path()).finish()
	}
}

/// Descriptor of a reflected type.
#[derive(Debug)]
pub struct TypeInfo {
	name: &'static str,
	path: String,
	type_id: TypeId,
	module: ModuleInfo,
	base: Option<BaseLink>,
	interfaces: Vec<InterfaceInfo>,
	members: Vec<MemberInfo>,
}

impl TypeInfo {
	/// Starts a descriptor for `T`, declared as `name` in `module_path` of the crate at `location`.
	pub fn builder<T: Any>(name: &'static str, module_path: &str, location: &str) -> TypeInfoBuilder<T> {
		TypeInfoBuilder {
			info: TypeInfo {
				name,
				path: format!("{module_path}::{name}"),
				type_id: TypeId::of::<T>(),
				module: ModuleInfo::from_module_path(module_path, location),
				base: None,
				interfaces: Vec::new(),
				members: Vec::new(),
			},
			_marker: PhantomData,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Fully-qualified path, e.g. `app::people::Person`.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	pub fn is<T: Any>(&self) -> bool {
		self.type_id == TypeId::of::<T>()
	}

	pub fn module(&self) -> &ModuleInfo {
		&self.module
	}

	pub fn base(&self) -> Option<&'static TypeInfo> {
		self.base.as_ref().map(BaseLink::info)
	}

	pub fn interfaces(&self) -> &[InterfaceInfo] {
		&self.interfaces
	}

	/// Members declared directly on this type, excluding inherited ones.
	pub fn members(&self) -> &[MemberInfo] {
		&self.members
	}

	/// The base chain, nearest ancestor first.
	pub fn ancestors(&self) -> Ancestors {
		Ancestors { next: self.base() }
	}

	/// Looks a member up by name on this type, then along the base chain.
	pub fn find_member(&'static self, name: &str) -> Option<MemberRoute> {
		let mut hops = Vec::new();
		let mut current: &'static TypeInfo = self;
		loop {
			if let Some(member) = current.members.iter().find(|m| m.name == name) {
				return Some(MemberRoute {
					declaring: current,
					hops,
					member,
				});
			}
			let link = current.base.as_ref()?;
			hops.push(link);
			current = link.info();
		}
	}
}

impl PartialEq for TypeInfo {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}

impl Eq for TypeInfo {}

/// Iterator over a type's base chain.
pub struct Ancestors {
	next: Option<&'static TypeInfo>,
}

impl Iterator for Ancestors {
	type Item = &'static TypeInfo;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next?;
		self.next = current.base();
		Some(current)
	}
}

/// A member found through [`TypeInfo::find_member`], with the base hops needed to reach it.
#[derive(Debug, Clone)]
pub struct MemberRoute {
	declaring: &'static TypeInfo,
	hops: Vec<&'static BaseLink>,
	member: &'static MemberInfo,
}

impl MemberRoute {
	/// The type that declares the member; differs from the lookup type for inherited members.
	pub fn declaring(&self) -> &'static TypeInfo {
		self.declaring
	}

	pub fn member(&self) -> &'static MemberInfo {
		self.member
	}

	/// Number of base hops between the lookup type and the declaring type.
	pub fn depth(&self) -> usize {
		self.hops.len()
	}

	pub fn read(&self, target: &dyn Any) -> Option<Box<dyn Any>> {
		let mut target = target;
		for hop in &self.hops {
			target = hop.project(target)?;
		}
		self.member.read(target)
	}

	pub fn write(&self, target: &mut dyn Any, value: Box<dyn Any>) -> bool {
		let mut target = target;
		for hop in &self.hops {
			let Some(next) = hop.project_mut(target) else {
				return false;
			};
			target = next;
		}
		self.member.write(target, value)
	}
}

/// Incremental construction of a [`TypeInfo`] for `T`.
pub struct TypeInfoBuilder<T> {
	info: TypeInfo,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Any> TypeInfoBuilder<T> {
	fn push(mut self, member: MemberInfo) -> Self {
		self.info.members.push(member);
		self
	}

	pub fn field<V: Any + Clone>(self, name: &'static str, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
		self.push(MemberInfo {
			name,
			kind: MemberKind::Field,
			value_type: TypeId::of::<V>(),
			value_type_name: type_name::<V>(),
			nested: None,
			access: Box::new(FieldAccess { get, get_mut }),
		})
	}

	/// A field whose type is itself reflected, so accessors may chain through it.
	pub fn nested_field<V: Reflect + Clone>(
		self,
		name: &'static str,
		get: fn(&T) -> &V,
		get_mut: fn(&mut T) -> &mut V,
	) -> Self {
		self.push(MemberInfo {
			name,
			kind: MemberKind::Field,
			value_type: TypeId::of::<V>(),
			value_type_name: type_name::<V>(),
			nested: Some(V::type_info),
			access: Box::new(FieldAccess { get, get_mut }),
		})
	}

	pub fn method<V: Any>(self, name: &'static str, call: fn(&T) -> V) -> Self {
		self.push(MemberInfo {
			name,
			kind: MemberKind::Method,
			value_type: TypeId::of::<V>(),
			value_type_name: type_name::<V>(),
			nested: None,
			access: Box::new(MethodAccess { call }),
		})
	}

	pub fn base<B: Reflect>(mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self {
		self.info.base = Some(BaseLink {
			info: B::type_info,
			projection: Box::new(FieldProjection { get, get_mut }),
		});
		self
	}

	/// Records an implemented trait, given as its trait object type.
	pub fn implements<I: ?Sized + 'static>(mut self) -> Self {
		self.info.interfaces.push(InterfaceInfo::of::<I>());
		self
	}

	pub fn build(self) -> TypeInfo {
		self.info
	}
}
