use super::*;
use crate::reflect::Reflect;

#[derive(Debug, Clone, Default, bindmap::Reflect)]
struct Address {
	city: String,
}

#[derive(Debug, Clone, Default, bindmap::Reflect)]
#[reflect(method(full_name -> String))]
struct Person {
	first_name: String,
	age: u32,
	#[reflect(nested)]
	address: Address,
}

impl Person {
	fn full_name(&self) -> String {
		self.first_name.clone()
	}
}

fn parse(text: &str) -> Accessor {
	Accessor::parse(text, Person::type_info())
}

#[test]
fn field_access_lowers_to_member() {
	let accessor = parse("|s| s.first_name");
	let Expr::Member {
		receiver,
		member,
		declaring,
	} = accessor.body()
	else {
		panic!("expected member node, got {:?}", accessor.body());
	};
	assert_eq!(member.name(), "first_name");
	assert_eq!(declaring.name(), "Person");
	assert!(matches!(receiver.as_ref(), Expr::Parameter { name, .. } if name == "s"));
}

#[test]
fn chained_access_follows_nested_types() {
	let accessor = parse("|s| s.address.city");
	let Expr::Member { receiver, member, declaring } = accessor.body() else {
		panic!("expected member node, got {:?}", accessor.body());
	};
	assert_eq!(member.name(), "city");
	assert_eq!(declaring.name(), "Address");
	assert!(matches!(receiver.as_ref(), Expr::Member { member, .. } if member.name() == "address"));
	assert_eq!(accessor.to_string(), "|s| s.address.city");
}

#[test]
fn method_call_lowers_to_call() {
	let accessor = parse("|p| p.full_name()");
	assert!(matches!(accessor.body(), Expr::Call { method, .. } if method.name() == "full_name"));
}

#[test]
fn cast_lowers_to_convert() {
	let accessor = parse("|s| s.age as u64");
	let Expr::Convert { operand, target } = accessor.body() else {
		panic!("expected conversion, got {:?}", accessor.body());
	};
	assert_eq!(target, "u64");
	assert!(matches!(operand.as_ref(), Expr::Member { member, .. } if member.name() == "age"));
}

#[test]
fn parentheses_are_transparent() {
	let accessor = parse("|s| (s.first_name)");
	assert!(matches!(accessor.body(), Expr::Member { .. }));
}

#[test]
fn matching_annotation_is_accepted() {
	let accessor = parse("|s: Person| s.first_name");
	assert!(matches!(accessor.body(), Expr::Member { .. }));
	let accessor = parse("|s: crate::people::Person| s.first_name");
	assert!(matches!(accessor.body(), Expr::Member { .. }));
}

#[test]
fn shared_reference_annotation_is_accepted() {
	let accessor = parse("|s: &Person| s.first_name");
	assert!(matches!(accessor.body(), Expr::Member { member, .. } if member.name() == "first_name"));
	assert_eq!(accessor.to_string(), "|s| s.first_name");
	let accessor = parse("|s: &crate::people::Person| s.address.city");
	assert!(matches!(accessor.body(), Expr::Member { member, .. } if member.name() == "city"));
}

#[test]
fn mutable_or_mismatched_reference_annotation_is_opaque() {
	assert!(matches!(parse("|s: &mut Person| s.first_name").body(), Expr::Other(_)));
	assert!(matches!(parse("|s: &Address| s.city").body(), Expr::Other(_)));
	assert!(matches!(parse("|s: &&Person| s.first_name").body(), Expr::Other(_)));
}

#[test]
fn mismatched_annotation_is_opaque() {
	let accessor = parse("|s: Address| s.city");
	assert!(matches!(accessor.body(), Expr::Other(_)));
}

#[test]
fn unknown_member_becomes_other() {
	let accessor = parse("|s| s.missing");
	let Expr::Other(text) = accessor.body() else {
		panic!("expected opaque node, got {:?}", accessor.body());
	};
	assert_eq!(text, "s.missing");
}

#[test]
fn field_and_method_kinds_are_not_interchangeable() {
	assert!(matches!(parse("|s| s.full_name").body(), Expr::Other(_)));
	assert!(matches!(parse("|s| s.first_name()").body(), Expr::Other(_)));
}

#[test]
fn non_member_shapes_become_other() {
	for text in [
		"|s| s.age + 1",
		"|s| s.first_name.len()",
		"|a, b| a.age",
		"s.first_name",
		"not rust at all |",
	] {
		let accessor = parse(text);
		assert!(matches!(accessor.body(), Expr::Other(_)), "{text} lowered to {:?}", accessor.body());
	}
}

#[test]
fn programmatic_accessors_match_parsed_ones() {
	let built = Accessor::new(Person::type_info(), "p", |p| p.member("address").member("city"));
	assert_eq!(built.to_string(), "|p| p.address.city");
	assert!(matches!(built.body(), Expr::Member { member, .. } if member.name() == "city"));
}

#[test]
fn value_type_tracks_reflected_members() {
	let param = Expr::parameter("p", Person::type_info());
	assert_eq!(param.value_type().map(TypeInfo::name), Some("Person"));
	let address = param.clone().member("address");
	assert_eq!(address.value_type().map(TypeInfo::name), Some("Address"));
	assert!(param.member("age").value_type().is_none());
}
