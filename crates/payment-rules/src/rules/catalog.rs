//! Seed catalogs: JSON arrays of rule inputs, validated entry by entry.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::domain::RuleId;
use super::validation::{validate, PaymentRuleInput, RuleDraft, ValidationErrors};

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    input: PaymentRuleInput,
}

/// Validated catalog entry. Entries without an id get a generated one when stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRule {
    pub id: Option<RuleId>,
    pub draft: RuleDraft,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read rule catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rule catalog is not a JSON array of rules: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule catalog entry {index} ('{name}') rejected: {errors}")]
    Invalid {
        index: usize,
        name: String,
        errors: ValidationErrors,
    },
}

pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<SeedRule>, CatalogError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&raw)
}

pub fn parse_catalog(raw: &str) -> Result<Vec<SeedRule>, CatalogError> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = entry.input.name.clone();
            let draft = validate(entry.input).map_err(|errors| CatalogError::Invalid {
                index,
                name,
                errors,
            })?;
            Ok(SeedRule {
                id: entry
                    .id
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .map(RuleId),
                draft,
            })
        })
        .collect()
}
