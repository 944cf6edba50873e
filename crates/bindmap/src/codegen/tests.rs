use pretty_assertions::assert_eq;

use super::*;
use crate::binding::{BindingEntry, BindingTable};
use crate::expr::Accessor;
use crate::reflect::Reflect;
use crate::resolve::resolve;

#[derive(Debug, Clone, Default, bindmap::Reflect)]
#[reflect(method(display_name -> String))]
struct Person {
	first_name: String,
	last_name: String,
	r#type: u8,
}

impl Person {
	fn display_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

#[derive(Debug, Clone, Default, bindmap::Reflect)]
struct PersonDto {
	given_name: String,
	surname: String,
	label: String,
	kind: u8,
}

fn entry(source: &str, destination: &str) -> BindingEntry {
	BindingEntry::new(
		resolve(&Accessor::parse(source, Person::type_info())),
		resolve(&Accessor::parse(destination, PersonDto::type_info())),
	)
}

fn generate_for(entries: impl IntoIterator<Item = BindingEntry>) -> GeneratedSource {
	let mut table = BindingTable::new();
	for entry in entries {
		table.push(entry);
	}
	generate(&table.snapshot(Person::type_info(), PersonDto::type_info()))
}

fn unit(assignments: &[&str]) -> String {
	let mut text = String::from(
		"// @generated by bindmap: bindmap::codegen::tests::Person -> bindmap::codegen::tests::PersonDto\n\
		 use bindmap::Mapping;\n\
		 \n\
		 pub struct GeneratedMapping;\n\
		 \n\
		 impl Mapping<bindmap::codegen::tests::Person, bindmap::codegen::tests::PersonDto> for GeneratedMapping {\n\
		 \tfn map(&self, t1: &bindmap::codegen::tests::Person) -> bindmap::codegen::tests::PersonDto {\n\
		 \t\tlet mut t2 = bindmap::codegen::tests::PersonDto::default();\n",
	);
	for line in assignments {
		text.push_str("\t\t");
		text.push_str(line);
		text.push('\n');
	}
	text.push_str("\t\tt2\n\t}\n}\n");
	text
}

#[test]
fn renders_field_copies_in_binding_order() {
	let generated = generate_for([
		entry("|s| s.last_name", "|d| d.surname"),
		entry("|s| s.first_name", "|d| d.given_name"),
	]);
	assert_eq!(
		generated.text,
		unit(&["t2.surname = t1.last_name.clone();", "t2.given_name = t1.first_name.clone();"])
	);
	assert!(generated.skipped.is_empty());
}

#[test]
fn renders_method_reads_as_calls() {
	let generated = generate_for([entry("|s| s.display_name()", "|d| d.label")]);
	assert_eq!(generated.text, unit(&["t2.label = t1.display_name();"]));
}

#[test]
fn keyword_members_are_written_as_raw_identifiers() {
	let generated = generate_for([entry("|s| s.r#type", "|d| d.kind")]);
	assert_eq!(generated.text, unit(&["t2.kind = t1.r#type.clone();"]));
}

#[test]
fn empty_table_renders_a_bare_constructor() {
	let generated = generate_for([]);
	assert_eq!(generated.text, unit(&[]));
}

#[test]
fn unresolved_entries_are_skipped_and_reported() {
	let generated = generate_for([
		entry("|s| s.first_name", "|d| d.given_name"),
		entry("|s| s.middle_name", "|d| d.surname"),
		entry("|s| s.last_name", "|d| d"),
	]);
	assert_eq!(generated.text, unit(&["t2.given_name = t1.first_name.clone();"]));

	let indices = generated.skipped.iter().map(|s| s.index).collect::<Vec<_>>();
	assert_eq!(indices, [1, 2]);
	assert!(matches!(generated.skipped[0].reason, ResolveError::UnsupportedNode { .. }));
	assert!(matches!(generated.skipped[1].reason, ResolveError::NoMember { .. }));
	assert_eq!(
		generated.skipped[1].to_string(),
		"binding #2: accessor `|d| d` does not read a member"
	);
}

#[test]
fn inherited_and_nested_terminals_use_the_member_name_only() {
	#[derive(Debug, Clone, Default, bindmap::Reflect)]
	struct Wrapper {
		#[reflect(nested)]
		person: Person,
	}

	let mut table = BindingTable::new();
	table.push(BindingEntry::new(
		resolve(&Accessor::parse("|w| w.person.first_name", Wrapper::type_info())),
		resolve(&Accessor::parse("|d| d.given_name", PersonDto::type_info())),
	));
	let generated = generate(&table.snapshot(Wrapper::type_info(), PersonDto::type_info()));
	assert!(
		generated.text.contains("\t\tt2.given_name = t1.first_name.clone();\n"),
		"got:\n{}",
		generated.text
	);
}

#[test]
fn output_is_a_pure_function_of_the_specification() {
	let first = generate_for([entry("|s| s.first_name", "|d| d.given_name")]);
	let second = generate_for([entry("|s| s.first_name", "|d| d.given_name")]);
	assert_eq!(first.text, second.text);
}
