use syn::parse_quote;

use super::*;

fn field_attrs(field: syn::Field) -> syn::Result<FieldAttrs> {
	FieldAttrs::parse(&field.attrs)
}

#[test]
fn base_and_nested_conflict_is_rejected() {
	let field: syn::Field = parse_quote! {
		/// Embedded record.
		#[reflect(base)]
		#[reflect(nested)]
		entity: Entity
	};
	let err = field_attrs(field).map(|_| ()).expect_err("conflicting flags should fail");
	assert_eq!(err.to_string(), "a field cannot be both `base` and `nested`");
}

#[test]
fn field_flags_accumulate_across_attributes() {
	let field: syn::Field = parse_quote! {
		#[serde(default)]
		#[reflect(skip)]
		cache: Vec<u8>
	};
	let attrs = field_attrs(field).expect("flags should parse");
	assert!(attrs.skip);
	assert!(!attrs.base && !attrs.nested);
}

#[test]
fn unknown_field_flag_is_rejected() {
	let field: syn::Field = parse_quote! {
		#[reflect(flatten)]
		inner: Inner
	};
	let err = field_attrs(field).map(|_| ()).expect_err("unknown flag should fail");
	assert!(err.to_string().contains("expected `skip`, `base` or `nested`"), "got: {err}");
}

#[test]
fn container_attributes_collect_traits_and_methods() {
	let input: DeriveInput = parse_quote! {
		#[reflect(implements(Named, std::fmt::Debug), method(full_name -> String))]
		struct Person {
			first_name: String,
		}
	};
	let attrs = ContainerAttrs::parse(&input.attrs).expect("container attributes should parse");
	assert_eq!(attrs.implements.len(), 2);
	assert_eq!(attrs.methods.len(), 1);
	assert_eq!(attrs.methods[0].0, "full_name");
}

#[test]
fn expansion_registers_base_fields_and_methods() {
	let input: DeriveInput = parse_quote! {
		#[reflect(method(full_name -> String))]
		struct Employee {
			#[reflect(base)]
			person: Person,
			salary: u32,
			#[reflect(skip)]
			secret: String,
		}
	};
	let tokens = expand(&input).expect("struct should expand").to_string();
	assert!(tokens.contains(". base :: < Person >"), "got: {tokens}");
	assert!(tokens.contains(". field :: < u32 > (\"salary\""), "got: {tokens}");
	assert!(tokens.contains(". method :: < String > (\"full_name\""), "got: {tokens}");
	assert!(!tokens.contains("secret"), "got: {tokens}");
}

#[test]
fn unsupported_shapes_are_rejected() {
	let generic: DeriveInput = parse_quote! {
		struct Wrapper<T> { value: T }
	};
	let err = expand(&generic).map(|_| ()).expect_err("generics should fail");
	assert_eq!(err.to_string(), "Reflect cannot be derived for generic types");

	let enumeration: DeriveInput = parse_quote! {
		enum Kind { A, B }
	};
	let err = expand(&enumeration).map(|_| ()).expect_err("enums should fail");
	assert_eq!(err.to_string(), "Reflect can only be derived for structs");

	let tuple: DeriveInput = parse_quote! {
		struct Pair(u32, u32);
	};
	let err = expand(&tuple).map(|_| ()).expect_err("tuple structs should fail");
	assert_eq!(err.to_string(), "Reflect requires named fields");
}
