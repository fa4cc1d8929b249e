pub mod analyze;
pub mod config;
pub mod recommend;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use wattwise_core::{Plan, UserPreferences};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self { exit_code: 1, output: format!("error: {}", message.into()) }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { exit_code: 2, output: format!("internal error: {}", message.into()) }
    }
}

/// On-disk catalog snapshot: the plans plus the version marker that retires
/// cache fingerprints when the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub version: String,
    pub plans: Vec<Plan>,
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {what} file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse {what} file `{}`", path.display()))
}

/// Parses `cost,flexibility,renewable,rating` weights, e.g. `50,20,20,10`.
pub(crate) fn parse_preferences(raw: &str) -> anyhow::Result<UserPreferences> {
    let weights: Vec<u8> = raw
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("could not parse preference weights `{raw}`"))?;

    let [cost, flexibility, renewable, rating] = weights[..] else {
        anyhow::bail!(
            "expected exactly four preference weights (cost,flexibility,renewable,rating), got {}",
            weights.len()
        );
    };

    Ok(UserPreferences::new(cost, flexibility, renewable, rating))
}
