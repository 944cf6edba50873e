//! Build options.
//!
//! Options can be set in code or loaded from TOML:
//!
//! ```toml
//! unresolved = "skip"
//! log-source = true
//! ```

use serde::Deserialize;

use crate::error::ConfigError;

/// What a build does with bindings whose accessor did not resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedPolicy {
	/// Fail the build with [`BuildError::MalformedBindings`](crate::BuildError::MalformedBindings).
	#[default]
	Reject,
	/// Leave the binding out of the generated unit and log a warning.
	Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildOptions {
	pub unresolved: UnresolvedPolicy,
	/// Log each generated unit at debug level.
	pub log_source: bool,
}

impl BuildOptions {
	pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	pub fn with_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
		self.unresolved = policy;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_document_uses_defaults() {
		let options = BuildOptions::from_toml("").expect("empty options should parse");
		assert_eq!(options, BuildOptions::default());
		assert_eq!(options.unresolved, UnresolvedPolicy::Reject);
	}

	#[test]
	fn kebab_case_keys() {
		let options = BuildOptions::from_toml("unresolved = \"skip\"\nlog-source = true\n").expect("options should parse");
		assert_eq!(options.unresolved, UnresolvedPolicy::Skip);
		assert!(options.log_source);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let err = BuildOptions::from_toml("cache = true").expect_err("unknown key should fail");
		assert!(err.to_string().contains("cache"), "got: {err}");
	}

	#[test]
	fn unknown_policy_is_rejected() {
		assert!(BuildOptions::from_toml("unresolved = \"ignore\"").is_err());
	}
}
