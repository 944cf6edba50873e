//! Runtime-compiled field mappings between reflected record types.
//!
//! A [`Mapper`] collects field-to-field bindings written as accessor
//! closures, then builds them once into a [`CompiledMapping`]:
//!
//! 1. each accessor is resolved to a [`MemberPath`] ([`resolve`]),
//! 2. the bindings are snapshotted into a [`MappingSpec`],
//! 3. the snapshot is rendered to Rust source for one mapping type ([`codegen`]),
//! 4. the modules that source needs are collected ([`deps`]),
//! 5. the source is compiled in process into pre-bound member copies ([`compiler`]).
//!
//! ```ignore
//! use bindmap::{Mapper, Mapping, Reflect};
//!
//! #[derive(Default, Reflect)]
//! struct Person { first_name: String, last_name: String }
//!
//! #[derive(Default, Reflect)]
//! struct PersonDto { given_name: String, surname: String }
//!
//! let mapping = Mapper::<Person, PersonDto>::new()
//!     .bind("|s| s.first_name", "|d| d.given_name")
//!     .bind("|s| s.last_name", "|d| d.surname")
//!     .build()?;
//! ```

extern crate self as bindmap;

pub mod binding;
pub mod cache;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod deps;
pub mod error;
pub mod expr;
pub mod handle;
pub mod mapper;
pub mod reflect;
pub mod resolve;

pub use bindmap_macros::Reflect;
pub use binding::{BindingEntry, BindingTable, MappingSpec};
pub use cache::UnitCache;
pub use codegen::{GENERATED_TYPE_NAME, GeneratedSource, SkippedBinding};
pub use compiler::{CompileError, Diagnostic};
pub use config::{BuildOptions, UnresolvedPolicy};
pub use deps::{ModuleReference, ReferenceSet};
pub use error::{BuildError, ConfigError, ResolveError};
pub use expr::{Accessor, Expr, IntoAccessor};
pub use handle::{CompiledMapping, Mapping};
pub use mapper::Mapper;
pub use reflect::{InterfaceInfo, MemberInfo, MemberKind, ModuleInfo, Reflect, TypeInfo};
pub use resolve::MemberPath;
