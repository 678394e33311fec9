//! Dataset parsing.
//!
//! A dataset file is one YAML mapping of section name to a sequence of flat
//! records. The whole file is parsed and shape-checked before the loader
//! touches the store, so a malformed file never causes a partial load.

use crate::error::{Result, SyncError};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// One field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// A flat record from one section. `null` fields are dropped while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Position within its section, for warnings.
    pub index: usize,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: BTreeMap::new(),
        }
    }

    /// A single-valued field. A one-element list counts as its element.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field)? {
            FieldValue::Text(text) => Some(text),
            FieldValue::List(items) if items.len() == 1 => Some(&items[0]),
            FieldValue::List(_) => None,
        }
    }

    /// A single-valued field with surrounding whitespace removed; blank is
    /// treated as absent.
    pub fn key_text(&self, field: &str) -> Option<&str> {
        self.text(field).map(str::trim).filter(|t| !t.is_empty())
    }

    /// A list field. A lone scalar is a one-element list; absent is empty.
    pub fn list(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(FieldValue::Text(text)) => vec![text.clone()],
            Some(FieldValue::List(items)) => items.clone(),
            None => Vec::new(),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// A parsed dataset: section name → records, in file order within a section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub sections: BTreeMap<String, Vec<Record>>,
}

impl Dataset {
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)
            .map_err(|e| SyncError::MalformedInput(format!("not valid YAML: {e}")))?;

        let mapping = match root {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(SyncError::MalformedInput(format!(
                    "top level must be a mapping of sections, found {}",
                    describe(&other)
                )))
            }
        };

        let mut sections = BTreeMap::new();
        for (name, body) in mapping {
            let Value::String(name) = name else {
                return Err(SyncError::MalformedInput(format!(
                    "section names must be strings, found {}",
                    describe(&name)
                )));
            };
            let records = parse_section(&name, body)?;
            sections.insert(name, records);
        }
        Ok(Self { sections })
    }

    pub fn section(&self, name: &str) -> &[Record] {
        self.sections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Vec::is_empty)
    }
}

fn parse_section(section: &str, body: Value) -> Result<Vec<Record>> {
    let items = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items,
        other => {
            return Err(SyncError::MalformedInput(format!(
                "section `{section}` must be a list of records, found {}",
                describe(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_record(section, index, item))
        .collect()
}

fn parse_record(section: &str, index: usize, item: Value) -> Result<Record> {
    let Value::Mapping(mapping) = item else {
        return Err(SyncError::MalformedInput(format!(
            "{section}[{index}] must be a mapping, found {}",
            describe(&item)
        )));
    };

    let mut record = Record::new(index);
    for (field, value) in mapping {
        let Value::String(field) = field else {
            return Err(SyncError::MalformedInput(format!(
                "{section}[{index}] has a non-string field name"
            )));
        };
        let value = match value {
            Value::Null => continue,
            Value::Sequence(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match scalar_text(&item) {
                        Some(text) => list.push(text),
                        None if item.is_null() => {}
                        None => {
                            return Err(SyncError::MalformedInput(format!(
                                "{section}[{index}].{field} must hold scalars, found {}",
                                describe(&item)
                            )))
                        }
                    }
                }
                FieldValue::List(list)
            }
            other => match scalar_text(&other) {
                Some(text) => FieldValue::Text(text),
                None => {
                    return Err(SyncError::MalformedInput(format!(
                        "{section}[{index}].{field} must be text or a list, found {}",
                        describe(&other)
                    )))
                }
            },
        };
        record.fields.insert(field, value);
    }
    Ok(record)
}

/// Text of a scalar field. Numbers go through YAML's number parsing, so
/// `1.50` arrives as `1.5`; values whose exact digits matter must be quoted
/// in the dataset.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_become_text() {
        let data = Dataset::parse(
            "columns:\n- name: id\n  length: 12\n  nullable: true\n  terms: Account\n",
        )
        .unwrap();
        let record = &data.section("columns")[0];
        assert_eq!(record.text("length"), Some("12"));
        assert_eq!(record.text("nullable"), Some("true"));
        assert_eq!(record.list("terms"), vec!["Account".to_string()]);
    }

    #[test]
    fn numbers_are_canonical_unless_quoted() {
        let data = Dataset::parse(
            "columns:\n- name: a\n  length: 1.50\n- name: b\n  length: \"1.50\"\n",
        )
        .unwrap();
        let records = data.section("columns");
        assert_eq!(records[0].text("length"), Some("1.5"));
        assert_eq!(records[1].text("length"), Some("1.50"));
    }

    #[test]
    fn nulls_are_absent() {
        let data = Dataset::parse("terms:\n- name: A\n  steward: ~\n  categories: [X, ~]\n").unwrap();
        let record = &data.section("terms")[0];
        assert!(!record.fields.contains_key("steward"));
        assert_eq!(record.list("categories"), vec!["X".to_string()]);
    }

    #[test]
    fn empty_file_is_empty_dataset() {
        assert!(Dataset::parse("").unwrap().is_empty());
        assert!(Dataset::parse("terms:\n").unwrap().is_empty());
    }

    #[test]
    fn non_mapping_top_level_is_malformed() {
        for text in ["- a\n- b\n", "just text", "terms: 3\n", "terms:\n- [a, b]\n"] {
            assert!(
                matches!(Dataset::parse(text), Err(SyncError::MalformedInput(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn nested_mapping_in_record_is_malformed() {
        let err = Dataset::parse("terms:\n- name: A\n  status: {status: Draft}\n").unwrap_err();
        assert!(err.to_string().contains("terms[0].status"));
    }

    #[test]
    fn key_text_trims_and_rejects_blank() {
        let mut record = Record::new(0);
        for (field, value) in [("name", "  Account "), ("blank", "   ")] {
            record
                .fields
                .insert(field.to_string(), FieldValue::Text(value.to_string()));
        }
        assert_eq!(record.key_text("name"), Some("Account"));
        assert_eq!(record.key_text("blank"), None);
        assert_eq!(record.key_text("missing"), None);
    }
}
