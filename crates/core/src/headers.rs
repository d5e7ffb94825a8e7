// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered request header multi-map
//!
//! Headers are stored exactly as received: order and repeats are kept.
//! Folding repeated values into one string happens only when the headers
//! are handed to a function.

use serde::{Deserialize, Serialize};

/// Separator used when folding repeated header values
pub const HEADER_SEPARATOR: &str = ", ";

/// Prefix of the environment variable that carries a folded header
pub const HEADER_ENV_PREFIX: &str = "HEADER_";

/// Request headers in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; existing values for the same name are kept
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All values for `name` (case-insensitive), in arrival order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Values for `name` joined with [`HEADER_SEPARATOR`]
    pub fn fold(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self.get_all(name).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(HEADER_SEPARATOR))
        }
    }

    /// One entry per distinct name, ordered by first occurrence.
    ///
    /// The name keeps the spelling of its first occurrence.
    pub fn folded(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, Vec<&str>)> = Vec::new();
        for (name, value) in &self.entries {
            match out.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some((_, values)) => values.push(value),
                None => out.push((name.clone(), vec![value])),
            }
        }
        out.into_iter()
            .map(|(name, values)| (name, values.join(HEADER_SEPARATOR)))
            .collect()
    }

    /// Folded headers as `HEADER_<NAME>` environment pairs
    pub fn to_env(&self) -> Vec<(String, String)> {
        self.folded()
            .into_iter()
            .map(|(name, value)| (env_name(&name), value))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Environment variable name for a header: `Accept-Language` -> `HEADER_ACCEPT_LANGUAGE`
pub fn env_name(header: &str) -> String {
    let mut name = String::with_capacity(HEADER_ENV_PREFIX.len() + header.len());
    name.push_str(HEADER_ENV_PREFIX);
    for c in header.chars() {
        match c {
            '-' => name.push('_'),
            c => name.push(c.to_ascii_uppercase()),
        }
    }
    name
}

#[cfg(test)]
#[path = "headers_tests.rs"]
mod tests;
