//! Procedural macros for bindmap.
//!
//! Provides derive macros:
//! * `#[derive(Reflect)]` - generates the static type descriptor consumed by the mapper

use proc_macro::TokenStream;

/// Reflect derive macro implementation.
mod reflect;

/// Derives `bindmap::Reflect` for a struct with named fields.
///
/// Generates a lazily-built `TypeInfo` describing the struct's fields, its
/// optional embedded base, implemented traits and readable methods.
///
/// Attributes:
/// * `#[reflect(implements(Named, other::Trait))]` - record implemented (object-safe) traits
/// * `#[reflect(method(full_name -> String))]` - expose a zero-argument `&self` method
/// * `#[reflect(base)]` on a field - treat the field as the inherited base type
/// * `#[reflect(nested)]` on a field - the field type is itself `Reflect`, enabling chained access
/// * `#[reflect(skip)]` on a field - leave the field out of the descriptor
///
/// Every field that is not skipped must be `Clone + 'static`, since reads hand
/// out owned copies. `nested` and `base` fields must themselves derive
/// `Reflect`, and `method` return types must be `'static`.
///
/// ```ignore
/// #[derive(Default, Reflect)]
/// #[reflect(method(display_name -> String))]
/// pub struct Person {
///     #[reflect(base)]
///     entity: Entity,
///     first_name: String,
///     #[reflect(nested)]
///     address: Address,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
	reflect::derive_reflect(input)
}
