//! Derives the filtered view of a collection from the active filter terms.

use std::collections::BTreeMap;

use shared::record::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionKind {
    /// Case-insensitive substring search over `fields`. Values of
    /// `identifier_fields` are also compared with every non-digit stripped.
    Text {
        fields: Vec<String>,
        identifier_fields: Vec<String>,
    },
    /// Exact match against a single field.
    Categorical { field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDimension {
    pub name: String,
    pub kind: DimensionKind,
}

impl FilterDimension {
    pub fn text(name: &str, fields: &[&str], identifier_fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: DimensionKind::Text {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                identifier_fields: identifier_fields.iter().map(|f| f.to_string()).collect(),
            },
        }
    }

    pub fn categorical(name: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: DimensionKind::Categorical {
                field: field.to_string(),
            },
        }
    }

    fn matches<E: Record>(&self, record: &E, value: &str) -> bool {
        match &self.kind {
            DimensionKind::Text {
                fields,
                identifier_fields,
            } => matches_text(record, value, fields, identifier_fields),
            DimensionKind::Categorical { field } => record
                .field(field)
                .is_some_and(|actual| actual.as_ref() == value),
        }
    }
}

/// Current value per dimension. An empty value means the dimension is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    values: BTreeMap<String, String>,
}

impl FilterState {
    /// Returns whether the stored value changed.
    pub fn set(&mut self, dimension: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let previous = self.values.get(dimension).map(String::as_str).unwrap_or("");
        if previous == value {
            return false;
        }
        if value.is_empty() {
            self.values.remove(dimension);
        } else {
            self.values.insert(dimension.to_string(), value);
        }
        true
    }

    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.values.get(dimension).map(String::as_str)
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.values.is_empty();
        self.values.clear();
        changed
    }

    /// Active dimensions with their trimmed terms.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.trim()))
            .filter(|(_, value)| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

pub fn apply<E: Record>(
    items: &[E],
    state: &FilterState,
    dimensions: &[FilterDimension],
) -> Vec<E> {
    let active: Vec<(&FilterDimension, &str)> = state
        .active()
        .filter_map(|(name, value)| {
            dimensions
                .iter()
                .find(|dimension| dimension.name == name)
                .map(|dimension| (dimension, value))
        })
        .collect();

    if active.is_empty() {
        return items.to_vec();
    }

    items
        .iter()
        .filter(|record| {
            active
                .iter()
                .all(|(dimension, value)| dimension.matches(*record, value))
        })
        .cloned()
        .collect()
}

fn matches_text<E: Record>(
    record: &E,
    term: &str,
    fields: &[String],
    identifier_fields: &[String],
) -> bool {
    let needle = term.to_lowercase();
    let hit = fields.iter().chain(identifier_fields).any(|field| {
        record
            .field(field)
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    });
    if hit {
        return true;
    }

    if !looks_like_identifier(term) {
        return false;
    }
    let digits = digits_only(term);
    identifier_fields.iter().any(|field| {
        record
            .field(field)
            .is_some_and(|value| digits_only(&value).contains(&digits))
    })
}

/// Digits plus the punctuation national identifiers are written with, and at
/// least one digit. Terms mixing in letters are names, not identifiers.
pub fn looks_like_identifier(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit())
        && term
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' '))
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
