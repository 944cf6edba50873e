//! Reflect derive macro implementation.
//!
//! Provides `#[derive(Reflect)]` for building static type descriptors.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Path, Token, Type, parse_macro_input};

#[cfg(test)]
mod tests;

/// Entry point for the `#[derive(Reflect)]` macro.
pub fn derive_reflect(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	match expand(&input) {
		Ok(tokens) => tokens.into(),
		Err(e) => e.to_compile_error().into(),
	}
}

/// Container-level `#[reflect(...)]` arguments.
#[derive(Default)]
struct ContainerAttrs {
	implements: Vec<Path>,
	methods: Vec<(Ident, Type)>,
}

/// Field-level `#[reflect(...)]` flags.
#[derive(Default)]
struct FieldAttrs {
	skip: bool,
	base: bool,
	nested: bool,
}

fn reflect_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
	attrs.iter().filter(|a| a.path().is_ident("reflect"))
}

impl ContainerAttrs {
	fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
		let mut parsed = Self::default();
		for attr in reflect_attrs(attrs) {
			attr.parse_nested_meta(|meta| {
				if meta.path.is_ident("implements") {
					meta.parse_nested_meta(|inner| {
						parsed.implements.push(inner.path.clone());
						Ok(())
					})
				} else if meta.path.is_ident("method") {
					let content;
					syn::parenthesized!(content in meta.input);
					let name: Ident = content.parse()?;
					content.parse::<Token![->]>()?;
					let ty: Type = content.parse()?;
					parsed.methods.push((name, ty));
					Ok(())
				} else {
					Err(meta.error("unknown reflect attribute, expected `implements(..)` or `method(..)`"))
				}
			})?;
		}
		Ok(parsed)
	}
}

impl FieldAttrs {
	fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
		let mut parsed = Self::default();
		for attr in reflect_attrs(attrs) {
			attr.parse_nested_meta(|meta| {
				if meta.path.is_ident("skip") {
					parsed.skip = true;
				} else if meta.path.is_ident("base") {
					parsed.base = true;
				} else if meta.path.is_ident("nested") {
					parsed.nested = true;
				} else {
					return Err(meta.error("unknown reflect field attribute, expected `skip`, `base` or `nested`"));
				}
				Ok(())
			})?;
			if parsed.base && parsed.nested {
				return Err(syn::Error::new_spanned(attr, "a field cannot be both `base` and `nested`"));
			}
		}
		Ok(parsed)
	}
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
	if !input.generics.params.is_empty() {
		return Err(syn::Error::new_spanned(
			&input.generics,
			"Reflect cannot be derived for generic types",
		));
	}

	let Data::Struct(data) = &input.data else {
		return Err(syn::Error::new_spanned(
			&input.ident,
			"Reflect can only be derived for structs",
		));
	};

	let named = match &data.fields {
		Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
		Fields::Unit => Vec::new(),
		Fields::Unnamed(fields) => {
			return Err(syn::Error::new_spanned(fields, "Reflect requires named fields"));
		}
	};

	let container = ContainerAttrs::parse(&input.attrs)?;

	let mut base: Option<TokenStream2> = None;
	let mut registrations = Vec::new();

	for field in named {
		let attrs = FieldAttrs::parse(&field.attrs)?;
		if attrs.skip {
			continue;
		}
		let Some(ident) = &field.ident else {
			continue;
		};
		let ty = &field.ty;

		if attrs.base {
			if base.is_some() {
				return Err(syn::Error::new_spanned(
					field,
					"only one field may be marked #[reflect(base)]",
				));
			}
			base = Some(quote! {
				.base::<#ty>(|this| &this.#ident, |this| &mut this.#ident)
			});
			continue;
		}

		let name = ident.unraw().to_string();
		let register = if attrs.nested {
			quote!(nested_field)
		} else {
			quote!(field)
		};
		registrations.push(quote! {
			.#register::<#ty>(#name, |this| &this.#ident, |this| &mut this.#ident)
		});
	}

	for (method, ty) in &container.methods {
		let name = method.unraw().to_string();
		registrations.push(quote! {
			.method::<#ty>(#name, |this| this.#method())
		});
	}

	for path in &container.implements {
		registrations.push(quote! {
			.implements::<dyn #path>()
		});
	}

	let ident = &input.ident;
	let name = ident.unraw().to_string();

	Ok(quote! {
		impl ::bindmap::Reflect for #ident {
			fn type_info() -> &'static ::bindmap::TypeInfo {
				static INFO: ::std::sync::OnceLock<::bindmap::TypeInfo> = ::std::sync::OnceLock::new();
				INFO.get_or_init(|| {
					::bindmap::TypeInfo::builder::<Self>(
						#name,
						::core::module_path!(),
						::core::env!("CARGO_MANIFEST_DIR"),
					)
					#base
					#(#registrations)*
					.build()
				})
			}
		}
	})
}
