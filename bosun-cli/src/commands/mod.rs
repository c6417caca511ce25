//! Subcommand implementations, one module per command group.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::Serialize;

pub mod app;
pub mod project;
pub mod repo;
pub mod store;

/// First seven characters of a pushed revision, enough for a confirmation.
pub(crate) fn short_rev(revision: &str) -> &str {
    revision.get(..7).unwrap_or(revision)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}

/// Parses repeated `key=value` arguments into a map.
pub(crate) fn parse_key_values(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid pair '{pair}', expected key=value");
        };
        if key.is_empty() {
            bail!("invalid pair '{pair}', expected key=value");
        }
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}
