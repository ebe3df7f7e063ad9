//! Draft store
//!
//! Uncommitted field edits, keyed by the chart they belong to. The store
//! does not know which tab an input lives on, so every input event of the
//! editor writes here and switching tabs never drops anything.

use super::fields::FieldId;
use crate::config::NEW_RECORD_DRAFT_KEY;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Which chart a draft belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DraftKey {
    /// A chart without an id yet
    New,
    Record(String),
}

impl DraftKey {
    pub fn for_record(id: Option<&str>) -> Self {
        match id {
            Some(id) => DraftKey::Record(id.to_string()),
            None => DraftKey::New,
        }
    }

    pub fn record_id(&self) -> Option<&str> {
        match self {
            DraftKey::New => None,
            DraftKey::Record(id) => Some(id),
        }
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftKey::New => f.write_str(NEW_RECORD_DRAFT_KEY),
            DraftKey::Record(id) => f.write_str(id),
        }
    }
}

/// Last-typed value per field for one chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    fields: BTreeMap<FieldId, String>,
}

static EMPTY_DRAFT: Draft = Draft::new();

impl Draft {
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Raw entry, including values the user cleared to ""
    pub fn get(&self, field: FieldId) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Entry that takes precedence in a merge: present and non-empty
    pub fn value(&self, field: FieldId) -> Option<&str> {
        self.get(field).filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, field: FieldId, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

impl FromIterator<(FieldId, String)> for Draft {
    fn from_iter<I: IntoIterator<Item = (FieldId, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Drafts for every chart touched in this session
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    drafts: HashMap<DraftKey, Draft>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite or insert one field
    pub fn set_field(&mut self, key: &DraftKey, field: FieldId, value: impl Into<String>) {
        self.drafts
            .entry(key.clone())
            .or_default()
            .set(field, value);
    }

    /// Record an input event by its markup identifier. Unknown identifiers
    /// are ignored and reported as `None`.
    pub fn record_input(&mut self, key: &DraftKey, identifier: &str, value: &str) -> Option<FieldId> {
        let Some(field) = FieldId::decode(identifier) else {
            tracing::debug!("Ignoring input for unknown field: {}", identifier);
            return None;
        };

        self.set_field(key, field, value);
        Some(field)
    }

    /// Write several pending values at once
    pub fn flush<I>(&mut self, key: &DraftKey, entries: I)
    where
        I: IntoIterator<Item = (FieldId, String)>,
    {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return;
        }

        let draft = self.drafts.entry(key.clone()).or_default();
        for (field, value) in entries {
            draft.set(field, value);
        }
    }

    /// The draft for `key`, or an empty one
    pub fn get_draft(&self, key: &DraftKey) -> &Draft {
        self.drafts.get(key).unwrap_or(&EMPTY_DRAFT)
    }

    pub fn has_draft(&self, key: &DraftKey) -> bool {
        self.drafts.get(key).is_some_and(|draft| !draft.is_empty())
    }

    /// Drop the entries of `committed` that still hold the committed value.
    /// Fields typed after the snapshot was taken stay. Returns whether
    /// anything is left for `key`.
    pub fn release_committed(&mut self, key: &DraftKey, committed: &Draft) -> bool {
        let Some(draft) = self.drafts.get_mut(key) else {
            return false;
        };

        for (field, value) in committed.iter() {
            if draft.get(field) == Some(value) {
                draft.fields.remove(&field);
            }
        }

        if draft.is_empty() {
            self.drafts.remove(key);
            tracing::debug!("Cleared draft for {}", key);
            return false;
        }

        tracing::debug!("Kept {} newer edits for {}", draft.len(), key);
        true
    }

    /// Move the draft under `from` to `to`
    pub fn rekey(&mut self, from: &DraftKey, to: DraftKey) {
        if let Some(draft) = self.drafts.remove(from) {
            self.drafts.insert(to, draft);
        }
    }

    pub fn clear_draft(&mut self, key: &DraftKey) -> Option<Draft> {
        let removed = self.drafts.remove(key);
        if removed.is_some() {
            tracing::debug!("Cleared draft for {}", key);
        }
        removed
    }

    /// Number of charts with a buffered draft
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
