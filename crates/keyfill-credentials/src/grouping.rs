// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Classification of account identifiers into named groups.
//!
//! Each rule's pattern is searched (not fully matched) against the
//! identifier, case-sensitively. An account lands in every group whose rule
//! matches, and in [`UNGROUPED`] when none does.

use std::fmt;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CredentialError, CredentialResult};

/// Group that collects accounts no rule matched. Always present.
pub const UNGROUPED: &str = "Ungrouped";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingRule {
	pub name: String,
	/// Regular expression source.
	pub pattern: String,
}

impl GroupingRule {
	pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			pattern: pattern.into(),
		}
	}
}

/// Grouping rules with their patterns compiled.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
	rules: Vec<(String, Regex)>,
}

impl CompiledRules {
	/// Compiles every rule, failing on the first invalid pattern.
	pub fn compile(rules: &[GroupingRule]) -> CredentialResult<Self> {
		let rules = rules
			.iter()
			.map(|rule| {
				Regex::new(&rule.pattern)
					.map(|re| (rule.name.clone(), re))
					.map_err(|source| CredentialError::InvalidPattern {
						rule: rule.name.clone(),
						source,
					})
			})
			.collect::<CredentialResult<Vec<_>>>()?;
		Ok(Self { rules })
	}

	/// Names of the rules matching `account`, in rule order.
	pub fn matching<'a>(&'a self, account: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.rules
			.iter()
			.filter(move |(_, re)| re.is_match(account))
			.map(|(name, _)| name.as_str())
	}

	/// Classifies `accounts` in order.
	pub fn group<I, S>(&self, accounts: I) -> GroupedAccounts
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut grouped = GroupedAccounts::new();
		for account in accounts {
			let account = account.as_ref();
			let mut matched = false;
			for name in self.matching(account) {
				grouped.insert(name, account);
				matched = true;
			}
			if !matched {
				grouped.insert(UNGROUPED, account);
			}
		}
		grouped
	}
}

/// Ordered mapping from group name to account identifiers.
///
/// [`UNGROUPED`] comes first, then groups in the order they were first
/// inserted. Serializes as a JSON object in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedAccounts {
	groups: Vec<(String, Vec<String>)>,
}

impl GroupedAccounts {
	/// An empty mapping holding only the empty [`UNGROUPED`] group.
	pub fn new() -> Self {
		Self {
			groups: vec![(UNGROUPED.to_string(), Vec::new())],
		}
	}

	/// Appends `account` to `group`, creating the group if needed.
	/// An account already in the group is not added twice.
	pub fn insert(&mut self, group: &str, account: &str) {
		let accounts = match self.groups.iter().position(|(name, _)| name == group) {
			Some(idx) => &mut self.groups[idx].1,
			None => {
				self.groups.push((group.to_string(), Vec::new()));
				let last = self.groups.len() - 1;
				&mut self.groups[last].1
			}
		};
		if !accounts.iter().any(|a| a == account) {
			accounts.push(account.to_string());
		}
	}

	pub fn get(&self, group: &str) -> Option<&[String]> {
		self.groups
			.iter()
			.find(|(name, _)| name == group)
			.map(|(_, accounts)| accounts.as_slice())
	}

	pub fn ungrouped(&self) -> &[String] {
		self.get(UNGROUPED).unwrap_or(&[])
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.groups
			.iter()
			.map(|(name, accounts)| (name.as_str(), accounts.as_slice()))
	}

	pub fn group_names(&self) -> impl Iterator<Item = &str> {
		self.groups.iter().map(|(name, _)| name.as_str())
	}

	/// Distinct accounts across all groups, in first-seen order.
	pub fn accounts(&self) -> Vec<&str> {
		let mut seen: Vec<&str> = Vec::new();
		for (_, accounts) in &self.groups {
			for account in accounts {
				if !seen.contains(&account.as_str()) {
					seen.push(account);
				}
			}
		}
		seen
	}

	/// True when no group holds any account.
	pub fn is_empty(&self) -> bool {
		self.groups.iter().all(|(_, accounts)| accounts.is_empty())
	}
}

impl Default for GroupedAccounts {
	fn default() -> Self {
		Self::new()
	}
}

impl Serialize for GroupedAccounts {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.groups.len()))?;
		for (name, accounts) in &self.groups {
			map.serialize_entry(name, accounts)?;
		}
		map.end()
	}
}

impl<'de> Deserialize<'de> for GroupedAccounts {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct GroupsVisitor;

		impl<'de> Visitor<'de> for GroupsVisitor {
			type Value = GroupedAccounts;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a map of group names to account lists")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
				let mut grouped = GroupedAccounts::new();
				while let Some((name, accounts)) = access.next_entry::<String, Vec<String>>()? {
					if accounts.is_empty() && grouped.get(&name).is_none() {
						grouped.groups.push((name, Vec::new()));
						continue;
					}
					for account in &accounts {
						grouped.insert(&name, account);
					}
				}
				Ok(grouped)
			}
		}

		deserializer.deserialize_map(GroupsVisitor)
	}
}
