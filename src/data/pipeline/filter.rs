use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::data::record::{value_to_text, Record, RowId, RowStore};
use crate::error::{GridError, Result};

pub type RecordPredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// One filter of the display pipeline
#[derive(Clone)]
pub enum FilterSpec {
    /// Field value equals the given value
    Equals { field: String, value: Value },
    /// Field text contains the needle (case-insensitive)
    Contains { field: String, text: String },
    /// Field text matches a regular expression
    Regex { field: String, pattern: String },
    /// Fuzzy text search across all fields
    Fuzzy(String),
    /// Arbitrary predicate over the record
    Custom(RecordPredicate),
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Equals { field, value } => write!(f, "Equals({field} = {value})"),
            FilterSpec::Contains { field, text } => write!(f, "Contains({field} ~ {text})"),
            FilterSpec::Regex { field, pattern } => write!(f, "Regex({field} =~ /{pattern}/)"),
            FilterSpec::Fuzzy(pattern) => write!(f, "Fuzzy({pattern})"),
            FilterSpec::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl FilterSpec {
    /// The field this filter reads, if it reads a single one
    pub fn field(&self) -> Option<&str> {
        match self {
            FilterSpec::Equals { field, .. }
            | FilterSpec::Contains { field, .. }
            | FilterSpec::Regex { field, .. } => Some(field),
            FilterSpec::Fuzzy(_) | FilterSpec::Custom(_) => None,
        }
    }
}

/// A filter ready to run
pub enum CompiledFilter {
    Equals { field: String, value: Value },
    Contains { field: String, needle: String },
    Regex { field: String, regex: Regex },
    Fuzzy { pattern: String, matcher: SkimMatcherV2 },
    Custom(RecordPredicate),
}

impl CompiledFilter {
    pub fn compile(spec: &FilterSpec) -> Result<Self> {
        Ok(match spec {
            FilterSpec::Equals { field, value } => CompiledFilter::Equals {
                field: field.clone(),
                value: value.clone(),
            },
            FilterSpec::Contains { field, text } => CompiledFilter::Contains {
                field: field.clone(),
                needle: text.to_lowercase(),
            },
            FilterSpec::Regex { field, pattern } => {
                let regex = Regex::new(pattern)
                    .map_err(|e| GridError::InvalidFilter(format!("{field}: {e}")))?;
                CompiledFilter::Regex {
                    field: field.clone(),
                    regex,
                }
            }
            FilterSpec::Fuzzy(pattern) => CompiledFilter::Fuzzy {
                pattern: pattern.clone(),
                matcher: SkimMatcherV2::default(),
            },
            FilterSpec::Custom(predicate) => CompiledFilter::Custom(predicate.clone()),
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            CompiledFilter::Equals { field, value } => {
                record.get(field).unwrap_or(&Value::Null) == value
            }
            CompiledFilter::Contains { field, needle } => record
                .get(field)
                .map(|v| value_to_text(v).to_lowercase().contains(needle.as_str()))
                .unwrap_or(false),
            CompiledFilter::Regex { field, regex } => record
                .get(field)
                .map(|v| regex.is_match(&value_to_text(v)))
                .unwrap_or(false),
            CompiledFilter::Fuzzy { pattern, matcher } => {
                pattern.is_empty()
                    || record
                        .values()
                        .any(|v| matcher.fuzzy_match(&value_to_text(v), pattern).is_some())
            }
            CompiledFilter::Custom(predicate) => predicate(record),
        }
    }
}

/// Compile filter specs, dropping (and logging) any that fail
pub fn compile_filters(specs: &[FilterSpec]) -> Vec<CompiledFilter> {
    specs
        .iter()
        .filter_map(|spec| match CompiledFilter::compile(spec) {
            Ok(filter) => Some(filter),
            Err(e) => {
                warn!(target: "pipeline", "Ignoring filter {:?}: {}", spec, e);
                None
            }
        })
        .collect()
}

/// Keep the rows every filter accepts
pub fn apply_filters(filters: &[CompiledFilter], store: &RowStore, ids: &[RowId]) -> Vec<RowId> {
    if filters.is_empty() {
        return ids.to_vec();
    }

    ids.iter()
        .copied()
        .filter(|id| {
            store
                .get(*id)
                .map(|record| filters.iter().all(|f| f.matches(record)))
                .unwrap_or(false)
        })
        .collect()
}
