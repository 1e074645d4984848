//! Per-environment checksum matrix and difference detection

use crate::compare::checksum::definition_checksum;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Shown in place of a checksum when an object is absent from an environment
pub const ABSENT: &str = "N/A";

/// Checksums of every object, per environment, in environment order
#[derive(Debug, Clone, Default)]
pub struct ChecksumMatrix {
    environments: Vec<String>,
    checksums: Vec<BTreeMap<String, String>>,
}

/// One object whose checksum is not the same everywhere
///
/// `checksums` follows environment order; `None` means absent there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub name: String,
    pub checksums: Vec<Option<String>>,
}

impl DiffRow {
    /// Cell text per environment, with [`ABSENT`] for missing objects
    pub fn cells(&self) -> Vec<&str> {
        self.checksums
            .iter()
            .map(|c| c.as_deref().unwrap_or(ABSENT))
            .collect()
    }
}

impl ChecksumMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one environment's fetched definitions, checksumming each
    pub fn add_environment<I>(&mut self, name: impl Into<String>, definitions: I)
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        let checksums = definitions
            .into_iter()
            .map(|(object, definition)| {
                let checksum = definition_checksum(definition.as_deref());
                (object, checksum)
            })
            .collect();
        self.environments.push(name.into());
        self.checksums.push(checksums);
    }

    pub fn environments(&self) -> &[String] {
        &self.environments
    }

    /// Checksum of `object` in environment `env_index`, `None` if absent
    pub fn checksum(&self, env_index: usize, object: &str) -> Option<&str> {
        self.checksums
            .get(env_index)
            .and_then(|m| m.get(object))
            .map(String::as_str)
    }

    /// Union of object names across all environments, sorted
    pub fn object_names(&self) -> BTreeSet<&str> {
        self.checksums
            .iter()
            .flat_map(|m| m.keys().map(String::as_str))
            .collect()
    }

    /// Objects whose checksums (absence included) are not all equal, by name
    pub fn differences(&self) -> Vec<DiffRow> {
        self.object_names()
            .into_iter()
            .filter_map(|name| {
                let checksums: Vec<Option<&str>> = (0..self.environments.len())
                    .map(|idx| self.checksum(idx, name))
                    .collect();
                let distinct: BTreeSet<Option<&str>> = checksums.iter().copied().collect();
                (distinct.len() > 1).then(|| DiffRow {
                    name: name.to_string(),
                    checksums: checksums.into_iter().map(|c| c.map(str::to_string)).collect(),
                })
            })
            .collect()
    }
}
